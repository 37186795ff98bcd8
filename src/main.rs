use std::io::{self, IsTerminal};
use std::process::ExitCode;

use tracing::error;

use hbnb::console::Console;
use hbnb::logging::init_logging;
use hbnb::settings::Settings;
use hbnb::store::Database;

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings.log_filter);

    let database = match Database::new(settings.persistence_mode()) {
        Ok(database) => database,
        Err(e) => {
            error!(error = %e, database = %settings.database, "could not open the database");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut console = Console::new(&database, io::stdout().lock());
    match console.cmdloop(stdin.lock(), interactive) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "console terminated");
            ExitCode::FAILURE
        }
    }
}

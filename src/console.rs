//! The command interpreter.
//!
//! A [`Console`] reads one line at a time, dispatches it to a handler and
//! writes the outcome to its output. Each handler validates its arguments
//! completely before touching the store, so a rejected command never leaves
//! anything modified or persisted.
//!
//! Lines that do not start with a known command word are tried as dot-calls
//! (see [`crate::dotcall`]) and otherwise reported as unknown syntax.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{BufRead, Write};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::datatype::{repr_str, Caster};
use crate::dotcall::{self, Translation};
use crate::error::{HbnbError, Rejection, Result};
use crate::model::{is_reserved, ClassName};
use crate::store::{Database, OtherHasher};

lazy_static! {
    static ref UPDATE_ARGUMENTS: Regex =
        Regex::new(r#"^(\S+)(?:\s(\S+)(?:\s(\S+)(?:\s((?:"[^"]*")|(?:(\S)+)))?)?)?"#).unwrap();
    static ref QUOTED: Regex = Regex::new(r#"^".*"$"#).unwrap();
}

pub const PROMPT: &str = "(hbnb) ";

const HELP_HEADER: &str = "Documented commands (type help <topic>):";

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Eof,
    All,
    Count,
    Create,
    Destroy,
    Help,
    Quit,
    Show,
    Update,
}

impl Command {
    /// Sorted the way `help` lists them.
    pub const ALL: [Command; 9] = [
        Command::Eof,
        Command::All,
        Command::Count,
        Command::Create,
        Command::Destroy,
        Command::Help,
        Command::Quit,
        Command::Show,
        Command::Update,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Eof => "EOF",
            Command::All => "all",
            Command::Count => "count",
            Command::Create => "create",
            Command::Destroy => "destroy",
            Command::Help => "help",
            Command::Quit => "quit",
            Command::Show => "show",
            Command::Update => "update",
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }

    pub fn help(self) -> &'static str {
        match self {
            Command::Eof => "Exits the interpreter at end of input.",
            Command::All => "Prints the string form of every instance, or of every instance of a class.\nUsage: all [<class>]",
            Command::Count => "Prints the number of instances of a class.\nUsage: count <class>",
            Command::Create => "Creates an instance of a class, saves it and prints its id.\nUsage: create <class>",
            Command::Destroy => "Deletes an instance based on the class name and id.\nUsage: destroy <class> <id>",
            Command::Help => "List available commands with \"help\" or detailed help with \"help cmd\".",
            Command::Quit => "Quit command to exit the program.",
            Command::Show => "Prints the string form of an instance.\nUsage: show <class> <id>",
            Command::Update => "Updates an instance by adding or updating an attribute.\nUsage: update <class> <id> <attribute> \"<value>\"",
        }
    }
}

/// Splits a trimmed line into its command word (the leading run of
/// identifier characters) and the trimmed remainder.
fn split_command(line: &str) -> (&str, &str) {
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    (&line[..end], line[end..].trim())
}

pub struct Console<'db, W: Write> {
    database: &'db Database,
    out: W,
}

impl<'db, W: Write> Console<'db, W> {
    pub fn new(database: &'db Database, out: W) -> Self {
        Self { database, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Reads and executes lines until `quit` or end of input. The prompt is
    /// only written when `interactive` is set. Failures other than
    /// rejections are logged and reported, and the loop carries on.
    /// Bytes that are not valid UTF-8 are replaced rather than ending the
    /// session.
    pub fn cmdloop<R: BufRead>(&mut self, mut input: R, interactive: bool) -> Result<()> {
        let mut buffer = Vec::new();
        loop {
            if interactive {
                write!(self.out, "{PROMPT}")?;
                self.out.flush()?;
            }
            buffer.clear();
            let line = if input.read_until(b'\n', &mut buffer)? == 0 {
                Cow::Borrowed(Command::Eof.name())
            } else {
                String::from_utf8_lossy(&buffer)
            };
            let command = line.trim_end_matches(['\n', '\r']);
            match self.onecmd(command) {
                Ok(Control::Exit) => break,
                Ok(Control::Continue) => (),
                Err(e) => {
                    error!(error = %e, line = command, "command failed");
                    writeln!(self.out, "*** {e}")?;
                }
            }
            self.out.flush()?;
        }
        Ok(())
    }

    /// Executes a single line.
    pub fn onecmd(&mut self, line: &str) -> Result<Control> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Control::Continue);
        }
        let expanded;
        let line = match line.strip_prefix('?') {
            Some(topic) => {
                expanded = format!("help {topic}");
                expanded.as_str()
            }
            None => line,
        };
        let (word, arg) = split_command(line);
        match Command::lookup(word) {
            Some(command) => {
                debug!(command = command.name(), arg, "dispatching");
                self.dispatch(command, arg)
            }
            None => self.default(line),
        }
    }

    fn dispatch(&mut self, command: Command, arg: &str) -> Result<Control> {
        let outcome = match command {
            Command::Eof => {
                writeln!(self.out)?;
                return Ok(Control::Exit);
            }
            Command::Quit => return Ok(Control::Exit),
            Command::Help => self.do_help(arg),
            Command::Create => self.do_create(arg),
            Command::Show => self.do_show(arg),
            Command::Destroy => self.do_destroy(arg),
            Command::All => self.do_all(arg),
            Command::Count => self.do_count(arg),
            Command::Update => self.do_update(arg),
        };
        self.report(outcome)?;
        Ok(Control::Continue)
    }

    /// Prints rejections and parse errors; anything else is passed on.
    fn report(&mut self, outcome: Result<()>) -> Result<()> {
        match outcome {
            Err(HbnbError::Rejected(rejection)) => writeln!(self.out, "{rejection}")?,
            Err(e @ HbnbError::Parse { .. }) => writeln!(self.out, "*** {e}")?,
            other => other?,
        }
        Ok(())
    }

    /// Handles lines without a known command word: dot-calls are rewritten
    /// and dispatched, everything else is unknown syntax.
    fn default(&mut self, line: &str) -> Result<Control> {
        let call = match dotcall::parse(line) {
            Some(call) if Command::lookup(&call.method).is_some() => call,
            _ => {
                writeln!(self.out, "*** Unknown syntax: {line}")?;
                return Ok(Control::Continue);
            }
        };
        match call.translate() {
            Translation::DictUpdate {
                class_name,
                uid,
                dictionary,
            } => {
                debug!(line, class_name, uid, "dictionary update");
                let outcome = self.update_dict(&class_name, Some(uid.as_str()), &dictionary);
                self.report(outcome)?;
                Ok(Control::Continue)
            }
            Translation::Command(command) => {
                debug!(line, command, "rewrote dot-call");
                self.onecmd(&command)
            }
            Translation::Passthrough => {
                writeln!(self.out, "*** Unknown syntax: {line}")?;
                Ok(Control::Continue)
            }
        }
    }

    /// Applies every entry of a `{...}` literal to one instance and saves
    /// once, unless every key was reserved. Single quotes are read as double
    /// quotes.
    pub fn update_dict(&mut self, class_name: &str, uid: Option<&str>, dictionary: &str) -> Result<()> {
        let normalized = dictionary.replace('\'', "\"");
        let entries: Map<String, Value> = serde_json::from_str(&normalized)
            .map_err(|e| HbnbError::Parse { message: e.to_string() })?;
        if class_name.is_empty() {
            return Err(Rejection::ClassNameMissing.into());
        }
        let class = self.class_named(class_name).ok_or(Rejection::ClassDoesntExist)?;
        let uid = uid.ok_or(Rejection::InstanceIdMissing)?;
        let key = format!("{class_name}.{uid}");
        let casters = self.database.attributes(class);
        let mut changed = false;
        {
            let mut keeper = self.database.object_keeper()?;
            let entity = keeper.get_mut(&key).ok_or(Rejection::NoInstanceFound)?;
            for (attribute, value) in entries {
                let value = cast_declared(&casters, &attribute, value);
                if entity.set(&attribute, value) {
                    changed = true;
                } else {
                    warn!(%key, attribute, "ignored update of a reserved attribute");
                }
            }
        }
        if changed {
            self.database.touch(&key)?;
        }
        Ok(())
    }

    /// Resolves a class among those the store knows.
    fn class_named(&self, name: &str) -> Option<ClassName> {
        self.database.classes().iter().copied().find(|class| class.name() == name)
    }

    fn do_help(&mut self, arg: &str) -> Result<()> {
        if !arg.is_empty() {
            match Command::lookup(arg) {
                Some(command) => writeln!(self.out, "{}", command.help())?,
                None => writeln!(self.out, "*** No help on {arg}")?,
            }
            return Ok(());
        }
        let names: Vec<&str> = Command::ALL.iter().map(|c| c.name()).collect();
        writeln!(self.out)?;
        writeln!(self.out, "{HELP_HEADER}")?;
        writeln!(self.out, "{}", "=".repeat(HELP_HEADER.len()))?;
        writeln!(self.out, "{}", names.join("  "))?;
        writeln!(self.out)?;
        Ok(())
    }

    fn do_create(&mut self, arg: &str) -> Result<()> {
        if arg.is_empty() {
            return Err(Rejection::ClassNameMissing.into());
        }
        let class = self.class_named(arg).ok_or(Rejection::ClassDoesntExist)?;
        let id = self.database.create_object(class)?;
        writeln!(self.out, "{id}")?;
        Ok(())
    }

    /// Validates `<class> <id>` and returns the key of an existing instance.
    fn locate(&self, arg: &str) -> Result<String> {
        if arg.is_empty() {
            return Err(Rejection::ClassNameMissing.into());
        }
        let words: Vec<&str> = arg.split(' ').collect();
        if self.class_named(words[0]).is_none() {
            return Err(Rejection::ClassDoesntExist.into());
        }
        let id = words.get(1).ok_or(Rejection::InstanceIdMissing)?;
        let key = format!("{}.{}", words[0], id);
        if !self.database.object_keeper()?.contains(&key) {
            return Err(Rejection::NoInstanceFound.into());
        }
        Ok(key)
    }

    fn do_show(&mut self, arg: &str) -> Result<()> {
        let key = self.locate(arg)?;
        let rendered = match self.database.object_keeper()?.get(&key) {
            Some(entity) => entity.to_string(),
            None => return Err(Rejection::NoInstanceFound.into()),
        };
        writeln!(self.out, "{rendered}")?;
        Ok(())
    }

    fn do_destroy(&mut self, arg: &str) -> Result<()> {
        let key = self.locate(arg)?;
        self.database.object_keeper()?.remove(&key);
        self.database.save()?;
        info!(%key, "destroyed object");
        Ok(())
    }

    fn do_all(&mut self, arg: &str) -> Result<()> {
        let class = if arg.is_empty() {
            None
        } else {
            let name = arg.split(' ').next().unwrap_or_default();
            Some(self.class_named(name).ok_or(Rejection::ClassDoesntExist)?)
        };
        let rendered: Vec<String> = self
            .database
            .object_keeper()?
            .iter()
            .filter(|(_, entity)| class.is_none_or(|c| entity.class() == c))
            .map(|(_, entity)| repr_str(&entity.to_string()))
            .collect();
        writeln!(self.out, "[{}]", rendered.join(", "))?;
        Ok(())
    }

    fn do_count(&mut self, arg: &str) -> Result<()> {
        let name = arg.split(' ').next().unwrap_or_default();
        if name.is_empty() {
            return Err(Rejection::ClassNameMissing.into());
        }
        if self.class_named(name).is_none() {
            return Err(Rejection::ClassDoesntExist.into());
        }
        let count = self.database.object_keeper()?.count_prefix(&format!("{name}."));
        writeln!(self.out, "{count}")?;
        Ok(())
    }

    fn do_update(&mut self, arg: &str) -> Result<()> {
        if arg.is_empty() {
            return Err(Rejection::ClassNameMissing.into());
        }
        let captures = UPDATE_ARGUMENTS.captures(arg).ok_or(Rejection::ClassNameMissing)?;
        let class_name = captures.get(1).map_or("", |m| m.as_str());
        let class = self.class_named(class_name).ok_or(Rejection::ClassDoesntExist)?;
        let uid = captures.get(2).ok_or(Rejection::InstanceIdMissing)?.as_str();
        let key = format!("{class_name}.{uid}");
        if !self.database.object_keeper()?.contains(&key) {
            return Err(Rejection::NoInstanceFound.into());
        }
        let attribute = captures.get(3).ok_or(Rejection::AttributeNameMissing)?.as_str();
        let raw = captures.get(4).ok_or(Rejection::ValueMissing)?.as_str();

        if is_reserved(attribute) {
            warn!(%key, attribute, "ignored update of a reserved attribute");
            return Ok(());
        }
        let casters = self.database.attributes(class);
        let value = if QUOTED.is_match(raw) {
            let text = Value::String(raw.replace('"', ""));
            cast_declared(&casters, attribute, text)
        } else if casters.contains_key(attribute) {
            cast_declared(&casters, attribute, Value::String(raw.to_string()))
        } else {
            Caster::infer(raw)
        };
        {
            let mut keeper = self.database.object_keeper()?;
            let entity = keeper.get_mut(&key).ok_or(Rejection::NoInstanceFound)?;
            entity.set(attribute, value);
        }
        self.database.touch(&key)?;
        Ok(())
    }
}

/// Applies the class caster declared for `attribute`, keeping `value` as is
/// when there is none or the cast fails.
fn cast_declared(casters: &HashMap<&'static str, Caster, OtherHasher>, attribute: &str, value: Value) -> Value {
    match casters.get(attribute) {
        Some(caster) => caster.cast(&value).unwrap_or_else(|| {
            debug!(attribute, "cast failed, keeping raw value");
            value
        }),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_word_is_the_identifier_prefix() {
        assert_eq!(split_command("show User 1"), ("show", "User 1"));
        assert_eq!(split_command("User.all()"), ("User", ".all()"));
        assert_eq!(split_command("quit"), ("quit", ""));
        assert_eq!(split_command("create   City  "), ("create", "City"));
    }

    #[test]
    fn help_names_are_sorted() {
        let names: Vec<&str> = Command::ALL.iter().map(|c| c.name()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}

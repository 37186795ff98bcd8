use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, writing to stderr so stdout stays the
/// console's own channel. An unparsable `filter` falls back to `warn`.
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(filter: &str) -> bool {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::init_logging;

    #[test]
    fn second_initialization_is_refused_without_panicking() {
        init_logging("not a [valid filter");
        assert!(!init_logging("debug"));
    }
}

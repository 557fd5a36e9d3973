use std::io;

use tracing::Level;

use crate::constants::LOG_ENV;

/// Parse a level name (`error`, `warn`, `info`, `debug`, `trace`), falling
/// back to `warn` when unset or unrecognised.
pub fn level_from(value: Option<&str>) -> Level {
    value
        .and_then(|v| v.trim().parse::<Level>().ok())
        .unwrap_or(Level::WARN)
}

/// Initialize a compact tracing subscriber on stderr; stdout is reserved for
/// the window id announcement. The level comes from `TABFRAME_LOG`. Safe to
/// call multiple times; subsequent calls are no-ops for the global
/// subscriber.
pub fn init_default() {
    let level = level_from(std::env::var(LOG_ENV).ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_defaults_to_warn() {
        assert_eq!(level_from(None), Level::WARN);
        assert_eq!(level_from(Some("chatty")), Level::WARN);
    }

    #[test]
    fn level_names_parse() {
        assert_eq!(level_from(Some("debug")), Level::DEBUG);
        assert_eq!(level_from(Some(" INFO ")), Level::INFO);
        assert_eq!(level_from(Some("error")), Level::ERROR);
    }

    #[test]
    fn init_twice_is_harmless() {
        init_default();
        init_default();
    }
}

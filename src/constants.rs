//! Shared crate-wide constants.

/// Version string reported by `-v`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest title, in bytes, kept for a tab.
///
/// Longer titles are cut on the nearest character boundary at or below this
/// limit when the title property is read.
pub const MAX_TITLE_LEN: usize = 255;

/// Initial frame geometry before the window manager gets a say.
pub const INITIAL_WIDTH: u16 = 800;
pub const INITIAL_HEIGHT: u16 = 600;

/// Label shown on the frame when it hosts no tabs.
pub const DEFAULT_TITLE: &str = "tabframe";

/// Bytes requested per `read(2)` on a listener.
pub const LISTENER_READ_CHUNK: usize = 4096;

/// Longest partial line a listener keeps between reads.
///
/// A decimal `u32` plus terminator fits easily; anything longer is garbage
/// and is discarded up to the next line terminator.
pub const LISTENER_MAX_LINE: usize = 64;

/// Environment variable holding the log level.
pub const LOG_ENV: &str = "TABFRAME_LOG";

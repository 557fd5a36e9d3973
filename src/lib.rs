pub mod constants;
pub mod drivers;
pub mod embed;
pub mod error;
pub mod event_loop;
pub mod frame;
pub mod keybindings;
pub mod layout;
pub mod listener;
pub mod registry;
pub mod runner;
pub mod spawn;
pub mod state;
pub mod theme;
pub mod tracing_sub;

/// Window identifier as carried by the X protocol and the listener line protocol.
pub type Xid = u32;

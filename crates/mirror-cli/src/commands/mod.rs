//! Command implementations

mod sync;
mod watch;

pub use sync::run_once;
pub use watch::run_watch;

//! Utility modules: logging setup and cancellation helpers

pub mod cancel;
pub mod logging;

pub use cancel::{Cancelled, OrCancelExt};
pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};

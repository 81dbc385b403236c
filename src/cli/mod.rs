pub mod commands;
pub mod handlers;

pub use commands::{CliArgs, Commands, DetectArgs, ShowArgs};
pub use handlers::{handle_detect, handle_show, Report};

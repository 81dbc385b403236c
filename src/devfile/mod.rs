//! Devfile parsing, validation and location.

pub mod link;
pub mod location;
pub mod model;
pub mod parser;

pub use link::{
    has_raw_form, is_absolute_url, join_context, resolve_relative_uri, rewrite_relative_git_link,
};
pub use location::{find_devfile, FoundDevfile, DEVFILE_LOCATIONS};
pub use model::Devfile;
pub use parser::{
    confine_to_clone, DevfileError, DevfileOutcome, DevfileParser, DevfileSource, ParsedDevfile,
    DEVFILE_FETCH_TIMEOUT,
};

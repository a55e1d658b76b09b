//! Shared helpers: external commands, paths, MIME types, plurals.

pub mod exec;
pub mod mime;
pub mod path;
pub mod plural;

pub use plural::{plural_count, plural_s};

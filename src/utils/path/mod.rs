//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `relative_stem`)

pub mod fs;

pub use fs::{display_relative, extension_of, normalize_path, relative_stem};

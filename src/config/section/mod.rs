//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module  | TOML Section | Purpose                                    |
//! |---------|--------------|--------------------------------------------|
//! | `build` | `[build]`    | Source subtrees, compilers, layouts        |
//! | `serve` | `[serve]`    | Development server and watch timing        |

pub mod build;
mod serve;

pub use build::{BuildConfig, LayoutRule, MarkdownConfig, MarkupConfig, MergeConfig, StyleConfig};
pub use serve::ServeConfig;

//! Incremental build core.
//!
//! ```text
//! compiler/
//! ├── registry     # role → transform kind(s) and destinations
//! ├── dependency   # fragment/layout/partial → dependents
//! ├── plan         # changed paths → ordered task list
//! ├── scheduler    # two-phase execution on the rayon pool
//! ├── pipeline     # owns the index, runs batches
//! ├── transform/   # style, markup, markdown and merge transforms
//! └── write        # atomic artifact writes
//! ```

pub mod dependency;
pub mod pipeline;
pub mod plan;
pub mod registry;
pub mod scheduler;
pub mod transform;
mod write;

#[cfg(test)]
pub(crate) mod testing;

pub use pipeline::{ChangeSet, Pipeline};
pub use scheduler::{BatchReport, BuildResult, Outcome};

//! Watch mode: full build, then rebuild on change.

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;

use super::serve;
use crate::compiler::Pipeline;
use crate::compiler::transform::Toolchain;
use crate::config::SiteConfig;
use crate::core::register_shutdown;

/// Run the watch loop, with the dev server unless `no_serve`.
pub fn watch(config: Arc<SiteConfig>, no_serve: bool) -> Result<()> {
    let toolchain = Toolchain::from_config(&config)?;
    let output = &config.build.output;
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let pipeline = Pipeline::new(Arc::clone(&config), toolchain);

    if no_serve {
        let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
        register_shutdown(shutdown_tx);
        return serve::run_actor_system(config, pipeline, None, shutdown_rx);
    }

    serve::serve(config, pipeline)
}

//! Stage 4: run the configured plugins over the tree
//!
//! Plugins run in configuration order; each sees the tree left by the one
//! before it. A plugin error fails the file but not the batch.

use super::StageCtx;
use crate::error::Result;

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    if sctx.file.has_fatal() {
        return Ok(());
    }
    // Arc clones, so the tree stays borrowable alongside the plugin list.
    let plugins = sctx.ctx.plugins.clone();
    let Some(tree) = sctx.ctx.tree.as_mut() else {
        return Ok(());
    };
    for (plugin, options) in &plugins {
        plugin.transform(tree, sctx.file, options)?;
    }
    Ok(())
}

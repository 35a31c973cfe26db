//! Stage 1: resolve configuration and attach plugins
//!
//! Looks up the file's layered configuration, loads every enabled plugin
//! through the loader seam, and runs each plugin's attach hook with the file
//! set so plugins can register file-set-level behavior. The resolved
//! settings and output target live on the per-file context afterwards.

use super::StageCtx;
use crate::configuration::PluginOptions;
use crate::error::Result;

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    if sctx.file.has_fatal() {
        return Ok(());
    }

    let config = sctx.resolver.load(&sctx.file.path)?;

    for entry in &config.plugins {
        let options = match &entry.options {
            PluginOptions::Off => continue,
            PluginOptions::On(value) => value.clone(),
        };
        let plugin = sctx.loader.load(&entry.id)?;
        plugin.configure(&options, sctx.set)?;
        sctx.ctx.plugins.push((plugin, options));
    }

    // Injected plugins run after configured ones.
    for (plugin, options) in sctx.run.injected {
        plugin.configure(options, sctx.set)?;
        sctx.ctx.plugins.push((plugin.clone(), options.clone()));
    }

    sctx.ctx.settings = config.settings.clone();
    sctx.ctx.output = config.output.clone();
    Ok(())
}

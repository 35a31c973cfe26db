//! Stage 9: write to the filesystem
//!
//! Writes the serialized contents to the path computed by the copy stage
//! (or the file's own path under write-back), creating parent directories
//! as needed and marking the file stored.

use std::fs;

use super::StageCtx;
use crate::error::{Error, Result};

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    if sctx.file.has_fatal() || !sctx.file.data.given {
        return Ok(());
    }
    if sctx.ctx.output.is_none() {
        return Ok(());
    }
    let Some(contents) = sctx.file.contents.as_deref() else {
        return Ok(());
    };

    let destination = sctx.file.absolute_path();
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::stage(format!(
                "Failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    fs::write(&destination, contents).map_err(|e| {
        Error::stage(format!(
            "Failed to write file '{}': {}",
            destination.display(),
            e
        ))
    })?;
    sctx.file.stored = true;
    Ok(())
}

//! Stage 7: compute the output location
//!
//! Only meaningful when the output target is a path. A target that exists as
//! a directory, or is spelled with a trailing separator, routes every file
//! into it under its own name. Anything else names a single destination
//! file, which is an error when the run holds more than one file.

use std::path::Path;

use super::{absolute_target, StageCtx};
use crate::configuration::OutputTarget;
use crate::error::{Error, Result};

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    if sctx.file.has_fatal() || !sctx.file.data.given {
        return Ok(());
    }
    let Some(OutputTarget::Path(target)) = sctx.ctx.output.clone() else {
        return Ok(());
    };

    let absolute = absolute_target(sctx.run.cwd, &target);
    let spelled_as_directory = target
        .to_string_lossy()
        .ends_with(std::path::MAIN_SEPARATOR);

    if spelled_as_directory || absolute.is_dir() {
        sctx.file.set_dirname(relative(sctx.run.cwd, &absolute));
    } else {
        if sctx.run.file_count > 1 {
            return Err(Error::stage(
                "Cannot write multiple files to single output",
            ));
        }
        sctx.file.rename(relative(sctx.run.cwd, &absolute));
    }
    Ok(())
}

/// Keep file paths relative to `cwd` where possible.
fn relative<'p>(cwd: &Path, path: &'p Path) -> &'p Path {
    path.strip_prefix(cwd).unwrap_or(path)
}

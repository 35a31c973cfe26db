//! Stage 2: fill contents from disk
//!
//! Pre-filled and stream-supplied files are left alone. A read failure
//! becomes the file's fatal message (via the runner), and the pipeline
//! continues so the reporter still sees the file.

use std::fs;

use super::StageCtx;
use crate::error::Result;

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    if sctx.file.has_fatal() {
        return Ok(());
    }
    if sctx.file.contents.is_some() || sctx.file.data.stream_in {
        return Ok(());
    }

    let contents = fs::read_to_string(sctx.file.absolute_path())?;
    sctx.file.contents = Some(contents);
    Ok(())
}

//! Stage 8: write to the output stream
//!
//! Only in single-file runs, only for user-supplied files that did not
//! fail, and only when no filesystem output was requested but a write-out
//! was.

use std::io::Write as _;

use super::StageCtx;
use crate::error::Result;

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    if !sctx.file.data.given || sctx.file.has_fatal() {
        return Ok(());
    }
    if sctx.ctx.output.is_some() || !sctx.run.out || sctx.run.file_count != 1 {
        return Ok(());
    }
    let Some(contents) = sctx.file.contents.as_deref() else {
        return Ok(());
    };

    sctx.stream_out.write_all(contents.as_bytes())?;
    sctx.stream_out.flush()?;
    Ok(())
}

//! Stage 5: register at the file-set barrier
//!
//! Marks this file's origin as queued. The engine checks the barrier after
//! the file returns to the set and runs the file-set-level plugins exactly
//! once when every known file has reached this point. Fatal files queue
//! too, so a failed file can never stall the barrier.

use super::StageCtx;
use crate::error::Result;

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    sctx.set.mark_queued(sctx.file.origin().to_path_buf());
    Ok(())
}

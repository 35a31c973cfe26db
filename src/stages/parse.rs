//! Stage 3: build the syntax tree
//!
//! In tree-in mode the file already holds a serialized tree as JSON text;
//! it is deserialized directly and the file's extension reverts to the
//! processor's canonical one. Otherwise the processor parses the source
//! text with the resolved settings.

use super::StageCtx;
use crate::error::Result;

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    if sctx.file.has_fatal() {
        return Ok(());
    }
    let Some(contents) = sctx.file.contents.as_deref() else {
        return Ok(());
    };

    if sctx.run.tree_in {
        sctx.ctx.tree = Some(serde_json::from_str(contents)?);
        let extension = sctx.run.processor.extension().to_string();
        sctx.file.set_extension(&extension);
    } else {
        sctx.ctx.tree = Some(sctx.run.processor.parse(contents, &sctx.ctx.settings)?);
    }
    Ok(())
}

//! Stage 6: compile the tree back to text
//!
//! Skipped entirely unless some form of output was requested. In tree-out
//! mode the tree is serialized as indented JSON with a `.json` extension
//! instead of going through the processor. A trailing newline is appended
//! when missing.

use super::StageCtx;
use crate::error::Result;

pub fn run(sctx: &mut StageCtx<'_, '_>) -> Result<()> {
    if sctx.file.has_fatal() {
        return Ok(());
    }
    let requested = sctx.ctx.output.is_some() || sctx.run.out || sctx.run.always_stringify;
    if !requested {
        return Ok(());
    }
    let Some(tree) = sctx.ctx.tree.as_ref() else {
        return Ok(());
    };

    let mut contents = if sctx.run.tree_out {
        let serialized = serde_json::to_string_pretty(tree)?;
        sctx.file.set_extension("json");
        serialized
    } else {
        sctx.run.processor.stringify(tree, &sctx.ctx.settings)?
    };

    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    sctx.file.contents = Some(contents);
    Ok(())
}

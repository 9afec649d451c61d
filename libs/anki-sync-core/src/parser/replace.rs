//! Verbatim-replace blocks: the fenced body becomes the card's Text field
//! exactly as written.
//!
//! ```markdown
//! ::: replace
//! <b>Any</b> HTML or {{c1::Anki}} markup.
//! :::
//! ```

use super::{DocumentContext, Extractor, LineContext, ScannedDocument};
use crate::block::Block;
use crate::types::BlockKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceExtractor;

impl Extractor for ReplaceExtractor {
    fn kind(&self) -> BlockKind {
        BlockKind::Replace
    }

    fn extract_scanned(&self, doc: &ScannedDocument<'_>, ctx: &DocumentContext<'_>) -> Vec<Block> {
        let mut blocks = Vec::new();

        for (idx, line) in doc.lines.iter().enumerate() {
            if line.context != LineContext::ReplaceOpen {
                continue;
            }

            let body = doc.lines[idx + 1..]
                .iter()
                .take_while(|l| l.context == LineContext::ReplaceBody)
                .map(|l| l.text)
                .collect::<Vec<_>>()
                .join("\n");
            if body.trim().is_empty() {
                continue;
            }

            blocks.push(doc.block_at(idx, BlockKind::Replace, body, String::new(), ctx));
        }

        blocks
    }
}

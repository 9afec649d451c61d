//! Cloze-deletion blocks: any paragraph holding `{{c1::answer}}` or
//! `{{c1::answer::hint}}`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{to_html, DocumentContext, Extractor, ScannedDocument};
use crate::block::Block;
use crate::types::BlockKind;

static CLOZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{c\d+::(.+?)(?:::(.+?))?\}\}").expect("valid cloze pattern")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct ClozeExtractor;

/// Front side: deletions hidden behind `[...]` or `[hint]`.
pub fn mask(text: &str) -> String {
    CLOZE
        .replace_all(text, |caps: &Captures| match caps.get(2) {
            Some(hint) => format!("[{}]", hint.as_str()),
            None => "[...]".to_string(),
        })
        .into_owned()
}

/// Back side: deletions revealed and highlighted.
pub fn reveal(text: &str) -> String {
    CLOZE
        .replace_all(text, |caps: &Captures| {
            format!("<span class=\"cloze\">{}</span>", &caps[1])
        })
        .into_owned()
}

fn is_question(line: &str) -> bool {
    line.trim_start().starts_with("Q:")
}

impl Extractor for ClozeExtractor {
    fn kind(&self) -> BlockKind {
        BlockKind::Cloze
    }

    fn extract_scanned(&self, doc: &ScannedDocument<'_>, ctx: &DocumentContext<'_>) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut idx = 0;

        while idx < doc.lines.len() {
            if !doc.lines[idx].is_plain() {
                idx += 1;
                continue;
            }

            // From a question line to the end of the run belongs to the basic
            // extractor.
            if is_question(doc.lines[idx].text) {
                while doc.lines.get(idx).map(|l| l.is_plain()).unwrap_or(false) {
                    idx += 1;
                }
                continue;
            }

            // A question line ends the paragraph, so a marker written above it
            // leaves this paragraph unchanged.
            let start = idx;
            while doc
                .lines
                .get(idx)
                .map(|l| l.is_plain() && !is_question(l.text))
                .unwrap_or(false)
            {
                idx += 1;
            }
            let paragraph = &doc.lines[start..idx];

            let text = paragraph
                .iter()
                .map(|l| l.text)
                .collect::<Vec<_>>()
                .join("\n");
            if !CLOZE.is_match(&text) {
                continue;
            }

            blocks.push(doc.block_at(
                start,
                BlockKind::Cloze,
                to_html(&mask(&text)),
                to_html(&reveal(&text)),
                ctx,
            ));
        }

        blocks
    }
}

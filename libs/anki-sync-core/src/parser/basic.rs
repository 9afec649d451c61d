//! Question/answer blocks.
//!
//! ```markdown
//! Q: Explain borrowing
//! A: Borrowing allows references without ownership.
//! Multiple lines are supported until a blank line.
//! ```

use super::{to_html, DocumentContext, Extractor, ScannedDocument};
use crate::block::Block;
use crate::types::BlockKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicExtractor;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Question,
    Answer,
}

struct CardBuilder {
    start: usize,
    question: Vec<String>,
    answer: Option<Vec<String>>,
}

impl CardBuilder {
    fn new(start: usize, first: &str) -> Self {
        Self {
            start,
            question: vec![first.to_string()],
            answer: None,
        }
    }

    fn push(&mut self, field: Field, text: &str) {
        match field {
            Field::Question => self.question.push(text.to_string()),
            Field::Answer => self.answer.get_or_insert_with(Vec::new).push(text.to_string()),
        }
    }

    /// Question and answer, or `None` when either is missing.
    fn build(self) -> Option<(usize, String, String)> {
        let question = self.question.join("\n").trim().to_string();
        let answer = self.answer?.join("\n").trim().to_string();
        if question.is_empty() || answer.is_empty() {
            return None;
        }
        Some((self.start, question, answer))
    }
}

fn question_text(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix("Q:").map(str::trim)
}

fn answer_text(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix("A:").map(str::trim)
}

impl Extractor for BasicExtractor {
    fn kind(&self) -> BlockKind {
        BlockKind::Basic
    }

    fn extract_scanned(&self, doc: &ScannedDocument<'_>, ctx: &DocumentContext<'_>) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut idx = 0;

        while idx < doc.lines.len() {
            let line = &doc.lines[idx];
            let Some(first) = line.is_plain().then(|| question_text(line.text)).flatten() else {
                idx += 1;
                continue;
            };

            let mut card = CardBuilder::new(idx, first);
            let mut field = Field::Question;
            idx += 1;

            while let Some(next) = doc.lines.get(idx) {
                if !next.is_plain() || question_text(next.text).is_some() {
                    break;
                }
                match answer_text(next.text) {
                    Some(text) if field == Field::Question => {
                        field = Field::Answer;
                        card.push(field, text);
                    }
                    _ => card.push(field, next.text),
                }
                idx += 1;
            }

            if let Some((start, question, answer)) = card.build() {
                blocks.push(doc.block_at(
                    start,
                    BlockKind::Basic,
                    to_html(&question),
                    to_html(&answer),
                    ctx,
                ));
            }
        }

        blocks
    }
}

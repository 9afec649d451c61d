//! Block extractors for Markdown documents.
//!
//! # Format
//! ```markdown
//! <!-- oid: 5f0c7c1e-0d0a-4f61-9a57-2c0d0f3b8a11 -->
//! Q: What is Rust?
//! A: A systems programming language.
//!
//! The capital of France is {{c1::Paris}}.
//!
//! ::: replace
//! Sent to the card <b>verbatim</b>.
//! :::
//! ```
//!
//! The `oid` marker line directly above a block's first line carries the
//! block's origin-id. Blocks without one have never been synced.

pub mod basic;
pub mod cloze;
pub mod frontmatter;
pub mod replace;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::block::Block;
use crate::types::{BlockKind, CardFields, DocumentMeta, ExtractOptions, SourceLocation};

pub use basic::BasicExtractor;
pub use cloze::ClozeExtractor;
pub use frontmatter::parse_frontmatter;
pub use replace::ReplaceExtractor;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*<!--\s*oid:\s*([A-Za-z0-9_-]+)\s*-->\s*$").expect("valid marker pattern")
});

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").expect("valid heading pattern"));

/// What a document belongs to while it is being extracted.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    /// Vault-relative document path.
    pub path: &'a str,
    pub meta: &'a DocumentMeta,
    pub options: &'a ExtractOptions,
}

/// One card syntax.
pub trait Extractor {
    fn kind(&self) -> BlockKind;

    /// Extract blocks from an already scanned document.
    fn extract_scanned(&self, doc: &ScannedDocument<'_>, ctx: &DocumentContext<'_>) -> Vec<Block>;

    /// Extract blocks from raw document text.
    fn extract(&self, content: &str, ctx: &DocumentContext<'_>) -> Vec<Block> {
        self.extract_scanned(&ScannedDocument::scan(content), ctx)
    }
}

/// Run every extractor over one document, returning blocks in document order.
pub fn extract_blocks(content: &str, ctx: &DocumentContext<'_>) -> Vec<Block> {
    let doc = ScannedDocument::scan(content);
    let extractors: [&dyn Extractor; 3] = [&ReplaceExtractor, &BasicExtractor, &ClozeExtractor];

    let mut blocks: Vec<Block> = extractors
        .iter()
        .flat_map(|extractor| extractor.extract_scanned(&doc, ctx))
        .collect();
    blocks.sort_by_key(|b| b.location().line);
    blocks
}

/// Lexical role of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineContext {
    Frontmatter,
    Code,
    ReplaceOpen,
    ReplaceBody,
    ReplaceClose,
    Text,
}

#[derive(Debug, Clone)]
pub struct ScannedLine<'a> {
    /// 1-indexed line number.
    pub number: usize,
    pub text: &'a str,
    pub context: LineContext,
    chain: usize,
}

impl ScannedLine<'_> {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Plain prose line that may belong to a block.
    pub fn is_plain(&self) -> bool {
        self.context == LineContext::Text
            && !self.is_blank()
            && !is_heading(self.text)
            && parse_marker(self.text).is_none()
    }
}

/// A document split into classified lines, with the heading chain each line
/// sits under.
#[derive(Debug)]
pub struct ScannedDocument<'a> {
    pub lines: Vec<ScannedLine<'a>>,
    chains: Vec<Vec<String>>,
}

impl<'a> ScannedDocument<'a> {
    pub fn scan(content: &'a str) -> Self {
        let raw: Vec<&str> = content.lines().collect();
        let mut contexts = vec![LineContext::Text; raw.len()];

        let mut idx = 0;
        if raw.first().map(|l| l.trim_end() == "---").unwrap_or(false) {
            if let Some(end) = (1..raw.len()).find(|&i| matches!(raw[i].trim_end(), "---" | "...")) {
                contexts[..=end].fill(LineContext::Frontmatter);
                idx = end + 1;
            }
        }

        while idx < raw.len() {
            let trimmed = raw[idx].trim();
            if let Some(fence) = code_fence(trimmed) {
                contexts[idx] = LineContext::Code;
                idx += 1;
                while idx < raw.len() {
                    contexts[idx] = LineContext::Code;
                    let closes = closes_fence(raw[idx].trim(), fence);
                    idx += 1;
                    if closes {
                        break;
                    }
                }
                continue;
            }
            if is_replace_open(trimmed) {
                if let Some(close) = (idx + 1..raw.len()).find(|&i| raw[i].trim() == ":::") {
                    contexts[idx] = LineContext::ReplaceOpen;
                    contexts[idx + 1..close].fill(LineContext::ReplaceBody);
                    contexts[close] = LineContext::ReplaceClose;
                    idx = close + 1;
                    continue;
                }
            }
            idx += 1;
        }

        let mut chains: Vec<Vec<String>> = vec![Vec::new()];
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut lines = Vec::with_capacity(raw.len());
        for (i, text) in raw.iter().copied().enumerate() {
            if contexts[i] == LineContext::Text {
                if let Some((level, title)) = heading(text) {
                    stack.retain(|(l, _)| *l < level);
                    stack.push((level, title));
                    chains.push(stack.iter().map(|(_, t)| t.clone()).collect());
                }
            }
            lines.push(ScannedLine {
                number: i + 1,
                text,
                context: contexts[i],
                chain: chains.len() - 1,
            });
        }

        Self { lines, chains }
    }

    /// Headings enclosing a line, outermost first.
    pub fn headings(&self, line: &ScannedLine<'_>) -> &[String] {
        &self.chains[line.chain]
    }

    /// Origin-id carried by the marker line directly above `idx`.
    pub fn origin_id_above(&self, idx: usize) -> Option<String> {
        let above = self.lines.get(idx.checked_sub(1)?)?;
        if above.context != LineContext::Text {
            return None;
        }
        parse_marker(above.text).map(str::to_string)
    }

    /// Build a block starting at line `idx`.
    pub(crate) fn block_at(
        &self,
        idx: usize,
        kind: BlockKind,
        text: String,
        extra: String,
        ctx: &DocumentContext<'_>,
    ) -> Block {
        let line = &self.lines[idx];
        let breadcrumb = if ctx.options.breadcrumb {
            breadcrumb(ctx.path, self.headings(line))
        } else {
            String::new()
        };
        let fields = CardFields {
            text,
            extra,
            breadcrumb,
            config: json!({ "kind": kind.as_str() }).to_string(),
        };
        let location = SourceLocation {
            path: ctx.path.to_string(),
            line: line.number,
            anchor: line.text.to_string(),
        };
        let deck = ctx
            .meta
            .deck
            .clone()
            .unwrap_or_else(|| ctx.options.default_deck.clone());

        Block::new(
            kind,
            self.origin_id_above(idx),
            fields,
            location,
            deck,
            ctx.meta.tags.clone(),
        )
    }
}

/// Origin-id of a marker line, if `line` is one.
pub fn parse_marker(line: &str) -> Option<&str> {
    MARKER
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Marker line written above a block.
pub fn format_marker(origin_id: &str) -> String {
    format!("<!-- oid: {} -->", origin_id)
}

pub fn is_heading(line: &str) -> bool {
    heading(line).is_some()
}

fn heading(line: &str) -> Option<(usize, String)> {
    let caps = HEADING.captures(line)?;
    Some((caps[1].len(), caps[2].to_string()))
}

/// Opening fence of a code block: the fence character and its run length.
fn code_fence(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = trimmed.chars().take_while(|&c| c == marker).count();
    (len >= 3).then_some((marker, len))
}

/// A closing fence repeats the opening character at least as many times and
/// carries nothing else.
fn closes_fence(trimmed: &str, (marker, len): (char, usize)) -> bool {
    let run = trimmed.chars().take_while(|&c| c == marker).count();
    run >= len && trimmed[run * marker.len_utf8()..].trim().is_empty()
}

fn is_replace_open(trimmed: &str) -> bool {
    trimmed
        .strip_prefix(":::")
        .map(|rest| rest.trim().eq_ignore_ascii_case("replace"))
        .unwrap_or(false)
}

/// "folder > note > heading > subheading".
fn breadcrumb(path: &str, headings: &[String]) -> String {
    let stem = path.strip_suffix(".md").unwrap_or(path);
    stem.split('/')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .chain(headings.iter().cloned())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Line breaks as HTML for fields rendered by the card templates.
pub(crate) fn to_html(text: &str) -> String {
    text.trim().replace('\n', "<br>")
}

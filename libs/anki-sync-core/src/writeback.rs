//! Writing newly assigned origin-ids back into documents.

use crate::documents::DocumentStore;
use crate::error::DocumentError;
use crate::parser::{format_marker, parse_marker};
use crate::types::{DocumentRef, SourceLocation};

/// Insert an origin-id marker line directly above the block at `location`.
///
/// The anchor is searched from the recorded line downwards first, since
/// earlier insertions in the same run only push lines down, then from the top
/// of the document. Anchors that already carry a marker are skipped.
pub fn insert_origin_id(
    content: &str,
    location: &SourceLocation,
    origin_id: &str,
) -> Result<String, DocumentError> {
    let lines: Vec<&str> = content.lines().collect();
    let start = location.line.saturating_sub(1).min(lines.len());

    let is_free_anchor = |idx: usize| {
        lines[idx] == location.anchor && (idx == 0 || parse_marker(lines[idx - 1]).is_none())
    };
    let target = (start..lines.len())
        .chain(0..start)
        .find(|&idx| is_free_anchor(idx))
        .ok_or_else(|| DocumentError::AnchorNotFound {
            path: location.path.clone(),
            line: location.line,
        })?;

    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let indent: String = lines[target]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();

    let mut result = String::with_capacity(content.len() + origin_id.len() + 16);
    for (idx, line) in lines.iter().enumerate() {
        if idx == target {
            result.push_str(&indent);
            result.push_str(&format_marker(origin_id));
            result.push_str(newline);
        }
        result.push_str(line);
        result.push_str(newline);
    }

    // Trim trailing newline if original didn't have one
    if !content.ends_with('\n') {
        result.truncate(result.len() - newline.len());
    }

    Ok(result)
}

/// Read, patch and write back one document.
pub async fn write_origin_id<D: DocumentStore>(
    documents: &D,
    location: &SourceLocation,
    origin_id: &str,
) -> Result<(), DocumentError> {
    let doc = DocumentRef::new(location.path.clone());
    let content = documents.read(&doc).await?;
    let patched = insert_origin_id(&content, location, origin_id)?;
    documents.write(&doc, &patched).await
}

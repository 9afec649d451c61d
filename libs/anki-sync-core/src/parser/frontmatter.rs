//! Per-document metadata index read from YAML frontmatter.

use std::collections::HashMap;

use crate::remote::tag_safe;
use crate::types::DocumentMeta;

/// Parse deck and tags from a document's frontmatter.
///
/// Missing or malformed frontmatter yields empty metadata.
pub fn parse_frontmatter(content: &str) -> DocumentMeta {
    let Some(yaml) = frontmatter_block(content) else {
        return DocumentMeta::default();
    };
    let Ok(map) = serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(yaml) else {
        return DocumentMeta::default();
    };

    let deck = ["anki-deck", "deck"]
        .iter()
        .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    DocumentMeta {
        deck,
        tags: extract_tags(&map),
    }
}

fn frontmatter_block(content: &str) -> Option<&str> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;
    let end = rest.find("\n---").or_else(|| rest.find("\n..."))?;
    Some(&rest[..end])
}

fn extract_tags(map: &HashMap<String, serde_yaml::Value>) -> Vec<String> {
    let raw: Vec<String> = match map.get("tags") {
        Some(serde_yaml::Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        // Tags might be comma-separated
        Some(serde_yaml::Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    raw.iter()
        .map(|tag| tag.trim().trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .map(tag_safe)
        .collect()
}

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Notion caps a single rich text object at this many characters.
pub const MAX_TEXT_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Notion page id {0:?}: expected 32 hex characters, a dashed UUID or a page URL")]
pub struct InvalidPageId(pub String);

/// Page (or block) identifier, normalized to the dashed lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(String);

impl PageId {
    /// Accepts `8ba7f67d8e564cca8c315606f5482b92`, the dashed UUID form, or a
    /// page URL such as `https://www.notion.so/team/Notes-8ba7f67d8e564cca8c315606f5482b92?pvs=4`.
    pub fn parse(raw: &str) -> Result<Self, InvalidPageId> {
        let invalid = || InvalidPageId(raw.to_string());

        let trimmed = raw.trim();
        let without_query = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let segment = without_query.rsplit('/').next().unwrap_or_default();

        let compact: String = segment.chars().filter(|c| *c != '-').collect();
        if compact.len() < 32 || !compact.is_ascii() {
            return Err(invalid());
        }
        let hex = &compact[compact.len() - 32..];
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        // A bare id must be exactly the 32 digits; only URLs may carry a title.
        if compact.len() != 32 && !trimmed.contains('/') {
            return Err(invalid());
        }

        let hex = hex.to_ascii_lowercase();
        Ok(Self(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PageId {
    type Err = InvalidPageId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub properties: Value,
}

impl Page {
    /// Plain text of the page's title property, if it has one.
    pub fn title(&self) -> Option<String> {
        let properties = self.properties.as_object()?;
        let title = properties
            .values()
            .find(|property| property.get("type").and_then(Value::as_str) == Some("title"))?;
        let text: String = title
            .get("title")?
            .as_array()?
            .iter()
            .filter_map(|part| part.get("plain_text").and_then(Value::as_str))
            .collect();
        Some(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockList {
    #[serde(default)]
    pub results: Vec<Block>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Paragraph block payload. Text longer than [`MAX_TEXT_CHARS`] is split into
/// several rich text runs inside the same paragraph.
pub fn paragraph_block(text: &str) -> Value {
    let chars: Vec<char> = text.chars().collect();
    let rich_text: Vec<Value> = chars
        .chunks(MAX_TEXT_CHARS)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({
                "type": "text",
                "text": { "content": content },
            })
        })
        .collect();

    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": rich_text },
    })
}

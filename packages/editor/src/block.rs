//! # Block Model
//!
//! Owned, serializable forms of the document tree. These are the wire format
//! (`{ id, type, data, parentId, children? }`) used by snapshots, history
//! records and `document:swap`; the live tree is held in a
//! [`BlockMap`](crate::BlockMap) and materialized into these types on read.

use serde::{Deserialize, Serialize};

/// Default id of the document root.
pub const ROOT_ID: &str = "root";

/// Closed set of block variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Text,
    Heading,
    ToggleList,
    Quote,
    Callout,
    BulletList,
}

impl BlockType {
    pub const ALL: [BlockType; 6] = [
        BlockType::Text,
        BlockType::Heading,
        BlockType::ToggleList,
        BlockType::Quote,
        BlockType::Callout,
        BlockType::BulletList,
    ];

    const CHILDREN_CAPABLE: [BlockType; 2] = [BlockType::ToggleList, BlockType::BulletList];

    /// Whether blocks of this type carry a `children` array.
    pub fn can_have_children(self) -> bool {
        Self::CHILDREN_CAPABLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::ToggleList => "toggleList",
            BlockType::Quote => "quote",
            BlockType::Callout => "callout",
            BlockType::BulletList => "bulletList",
        }
    }

    /// Look up a type by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextData {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingData {
    pub text: String,
    /// 1, 2 or 3
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleListData {
    pub text: String,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteData {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutData {
    pub text: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletListData {
    pub text: String,
}

/// Variant-specific payload, serialized as the `type` / `data` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum BlockData {
    Text(TextData),
    Heading(HeadingData),
    ToggleList(ToggleListData),
    Quote(QuoteData),
    Callout(CalloutData),
    BulletList(BulletListData),
}

impl BlockData {
    pub fn text(text: impl Into<String>) -> Self {
        BlockData::Text(TextData { text: text.into() })
    }

    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        BlockData::Heading(HeadingData {
            text: text.into(),
            level,
        })
    }

    pub fn toggle_list(text: impl Into<String>, open: bool) -> Self {
        BlockData::ToggleList(ToggleListData {
            text: text.into(),
            open,
        })
    }

    pub fn quote(text: impl Into<String>) -> Self {
        BlockData::Quote(QuoteData { text: text.into() })
    }

    pub fn callout(text: impl Into<String>, icon: impl Into<String>) -> Self {
        BlockData::Callout(CalloutData {
            text: text.into(),
            icon: icon.into(),
        })
    }

    pub fn bullet_list(text: impl Into<String>) -> Self {
        BlockData::BulletList(BulletListData { text: text.into() })
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            BlockData::Text(_) => BlockType::Text,
            BlockData::Heading(_) => BlockType::Heading,
            BlockData::ToggleList(_) => BlockType::ToggleList,
            BlockData::Quote(_) => BlockType::Quote,
            BlockData::Callout(_) => BlockType::Callout,
            BlockData::BulletList(_) => BlockType::BulletList,
        }
    }

    /// The plain text every variant carries.
    pub fn plain_text(&self) -> &str {
        match self {
            BlockData::Text(d) => &d.text,
            BlockData::Heading(d) => &d.text,
            BlockData::ToggleList(d) => &d.text,
            BlockData::Quote(d) => &d.text,
            BlockData::Callout(d) => &d.text,
            BlockData::BulletList(d) => &d.text,
        }
    }
}

/// A node of the document tree in its owned, serialized form.
///
/// `children` is `Some` exactly when the block's type is children-capable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(flatten)]
    pub data: BlockData,
    pub parent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        self.data.block_type()
    }

    pub fn can_have_children(&self) -> bool {
        self.block_type().can_have_children()
    }

    pub fn child_blocks(&self) -> &[Block] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Anchor of the tree. Not a block: it has no type, data or parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRoot {
    pub id: String,
    pub children: Vec<Block>,
}

impl DocumentRoot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }
}

impl Default for DocumentRoot {
    fn default() -> Self {
        Self::new(ROOT_ID)
    }
}

/// Caller-supplied block for insert/update actions.
///
/// Carries no `parentId`; the document stamps it on every level when the
/// payload is converted into a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPayload {
    pub id: String,
    #[serde(flatten)]
    pub data: BlockData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BlockPayload>>,
}

impl BlockPayload {
    pub fn new(id: impl Into<String>, data: BlockData) -> Self {
        Self {
            id: id.into(),
            data,
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<BlockPayload>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.data.block_type()
    }

    pub fn child_payloads(&self) -> &[BlockPayload] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Anything with an id and an ordered list of children of the same shape.
pub trait TreeNode {
    fn node_id(&self) -> &str;
    fn child_nodes(&self) -> &[Self]
    where
        Self: Sized;
}

impl TreeNode for Block {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn child_nodes(&self) -> &[Self] {
        self.child_blocks()
    }
}

impl TreeNode for BlockPayload {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn child_nodes(&self) -> &[Self] {
        self.child_payloads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_children_capability() {
        assert!(BlockType::ToggleList.can_have_children());
        assert!(BlockType::BulletList.can_have_children());
        assert!(!BlockType::Text.can_have_children());
        assert!(!BlockType::Heading.can_have_children());
        assert!(!BlockType::Quote.can_have_children());
        assert!(!BlockType::Callout.can_have_children());
    }

    #[test]
    fn test_type_names_round_trip() {
        for block_type in BlockType::ALL {
            assert_eq!(BlockType::from_name(block_type.as_str()), Some(block_type));
        }
        assert_eq!(BlockType::from_name("paragraph"), None);
    }

    #[test]
    fn test_block_wire_format() {
        let block = Block {
            id: "h1".to_string(),
            data: BlockData::heading("Title", 2),
            parent_id: "root".to_string(),
            children: None,
        };

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "h1",
                "type": "heading",
                "data": { "text": "Title", "level": 2 },
                "parentId": "root"
            })
        );
    }

    #[test]
    fn test_container_serializes_empty_children() {
        let block = Block {
            id: "t1".to_string(),
            data: BlockData::toggle_list("Details", false),
            parent_id: "root".to_string(),
            children: Some(vec![]),
        };

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["children"], json!([]));
        assert_eq!(value["type"], "toggleList");
    }

    #[test]
    fn test_payload_deserializes_without_parent_id() {
        let payload: BlockPayload = serde_json::from_value(json!({
            "id": "b1",
            "type": "text",
            "data": { "text": "hi" }
        }))
        .unwrap();

        assert_eq!(payload.id, "b1");
        assert_eq!(payload.data, BlockData::text("hi"));
        assert!(payload.children.is_none());
    }
}

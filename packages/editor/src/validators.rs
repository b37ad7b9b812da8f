//! # Structural Validators
//!
//! Boundary checks for data entering the tree: parsed JSON documents and
//! caller-supplied payloads. Checks run in a fixed order and stop at the
//! first failure with a distinct error.
//!
//! Raw JSON goes through, per node:
//! object → string `id` → string `parentId` → known `type` → variant shape
//! (exact envelope and `data` field counts, children presence, field values)
//! → parent link (the declared `parentId` is the node that lists it).

use std::collections::{HashSet, VecDeque};

use serde_json::{Map, Value};

use crate::block::{BlockData, BlockPayload, BlockType};
use crate::block_map::traverse;
use crate::errors::DocumentError;

/// Shape check for one variant's `data` object.
pub type VariantValidator = fn(&Map<String, Value>) -> Result<(), String>;

/// Type → validator table. A new variant adds one predicate and one arm.
pub fn variant_validator(block_type: BlockType) -> VariantValidator {
    match block_type {
        BlockType::Text => validate_text_data,
        BlockType::Heading => validate_heading_data,
        BlockType::ToggleList => validate_toggle_list_data,
        BlockType::Quote => validate_quote_data,
        BlockType::Callout => validate_callout_data,
        BlockType::BulletList => validate_bullet_list_data,
    }
}

fn validate_text_data(data: &Map<String, Value>) -> Result<(), String> {
    expect_field_count(data, 1)?;
    expect_string(data, "text")
}

fn validate_heading_data(data: &Map<String, Value>) -> Result<(), String> {
    expect_field_count(data, 2)?;
    expect_string(data, "text")?;
    match data.get("level").and_then(Value::as_u64) {
        Some(level) if is_valid_heading_level(level) => Ok(()),
        _ => Err("data.level must be 1, 2 or 3".to_string()),
    }
}

fn validate_toggle_list_data(data: &Map<String, Value>) -> Result<(), String> {
    expect_field_count(data, 2)?;
    expect_string(data, "text")?;
    match data.get("open") {
        Some(Value::Bool(_)) => Ok(()),
        _ => Err("data.open must be a boolean".to_string()),
    }
}

fn validate_quote_data(data: &Map<String, Value>) -> Result<(), String> {
    expect_field_count(data, 1)?;
    expect_string(data, "text")
}

fn validate_callout_data(data: &Map<String, Value>) -> Result<(), String> {
    expect_field_count(data, 2)?;
    expect_string(data, "text")?;
    expect_string(data, "icon")
}

fn validate_bullet_list_data(data: &Map<String, Value>) -> Result<(), String> {
    expect_field_count(data, 1)?;
    expect_string(data, "text")
}

fn expect_field_count(data: &Map<String, Value>, count: usize) -> Result<(), String> {
    if data.len() == count {
        Ok(())
    } else {
        Err(format!("data must have exactly {count} field(s), found {}", data.len()))
    }
}

fn expect_string(data: &Map<String, Value>, field: &str) -> Result<(), String> {
    match data.get(field) {
        Some(Value::String(_)) => Ok(()),
        _ => Err(format!("data.{field} must be a string")),
    }
}

fn is_valid_heading_level(level: u64) -> bool {
    (1..=3).contains(&level)
}

/// Root must be an object with string `id` equal to `root_id` and an array `children`.
pub fn validate_root_shape<'a>(
    value: &'a Value,
    root_id: &str,
) -> Result<&'a Vec<Value>, DocumentError> {
    let structure = |reason: String| DocumentError::InvalidDocumentStructure { reason };

    let object = value
        .as_object()
        .ok_or_else(|| structure("root must be an object".to_string()))?;

    match object.get("id") {
        Some(Value::String(id)) if id == root_id => {}
        Some(Value::String(id)) => {
            return Err(structure(format!("root id must be {root_id:?}, found {id:?}")))
        }
        _ => return Err(structure("root must have a string id".to_string())),
    }

    object
        .get("children")
        .and_then(Value::as_array)
        .ok_or_else(|| structure("root must have a children array".to_string()))
}

/// A block value that passed the per-node checks.
#[derive(Debug)]
pub struct CheckedBlock<'a> {
    pub id: &'a str,
    pub parent_id: &'a str,
    pub block_type: BlockType,
    pub children: Option<&'a Vec<Value>>,
}

/// Per-node checks for child `index` of `parent_id`.
pub fn validate_block_value<'a>(
    value: &'a Value,
    parent_id: &str,
    index: usize,
) -> Result<CheckedBlock<'a>, DocumentError> {
    let object = value.as_object().ok_or_else(|| DocumentError::BlockNotObject {
        parent_id: parent_id.to_string(),
        index,
    })?;

    let id = match object.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.as_str(),
        _ => {
            return Err(DocumentError::InvalidBlockId {
                parent_id: parent_id.to_string(),
                index,
            })
        }
    };

    let declared_parent = match object.get("parentId") {
        Some(Value::String(p)) => p.as_str(),
        _ => {
            return Err(DocumentError::InvalidBlockParentId {
                block_id: id.to_string(),
            })
        }
    };

    let block_type = match object.get("type") {
        Some(Value::String(name)) => {
            BlockType::from_name(name).ok_or_else(|| DocumentError::InvalidBlockType {
                block_id: id.to_string(),
                found: name.clone(),
            })?
        }
        other => {
            return Err(DocumentError::InvalidBlockType {
                block_id: id.to_string(),
                found: other.map(Value::to_string).unwrap_or_default(),
            })
        }
    };

    let invalid = |reason: String| DocumentError::InvalidBlockStructure {
        block_id: id.to_string(),
        block_type,
        reason,
    };

    let expected_fields = if block_type.can_have_children() { 5 } else { 4 };
    if object.len() != expected_fields {
        return Err(invalid(format!(
            "block must have exactly {expected_fields} fields, found {}",
            object.len()
        )));
    }

    let children = match (block_type.can_have_children(), object.get("children")) {
        (true, Some(Value::Array(children))) => Some(children),
        (true, _) => return Err(invalid("children must be an array".to_string())),
        (false, Some(_)) => return Err(invalid("block type cannot have children".to_string())),
        (false, None) => None,
    };

    let data = object
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("data must be an object".to_string()))?;
    variant_validator(block_type)(data).map_err(invalid)?;

    Ok(CheckedBlock {
        id,
        parent_id: declared_parent,
        block_type,
        children,
    })
}

/// Full pipeline over a parsed document: root shape, every block breadth-first,
/// parent links and id uniqueness (the root id included).
pub fn validate_document_value(value: &Value, root_id: &str) -> Result<(), DocumentError> {
    let children = validate_root_shape(value, root_id)?;

    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&Value, &str, usize)> = children
        .iter()
        .enumerate()
        .map(|(index, child)| (child, root_id, index))
        .collect();

    while let Some((value, parent_id, index)) = queue.pop_front() {
        let block = validate_block_value(value, parent_id, index)?;

        if block.parent_id != parent_id {
            return Err(DocumentError::ParentLinkMismatch {
                block_id: block.id.to_string(),
                declared_parent_id: block.parent_id.to_string(),
                actual_parent_id: parent_id.to_string(),
            });
        }

        if block.id == root_id {
            return Err(DocumentError::ReservedBlockId {
                block_id: block.id.to_string(),
            });
        }
        if !seen.insert(block.id) {
            return Err(DocumentError::BlockAlreadyExists {
                block_id: block.id.to_string(),
            });
        }

        if let Some(children) = block.children {
            queue.extend(
                children
                    .iter()
                    .enumerate()
                    .map(|(index, child)| (child, block.id, index)),
            );
        }
    }

    Ok(())
}

/// Field-level checks for typed block data.
pub fn validate_block_data(block_id: &str, data: &BlockData) -> Result<(), DocumentError> {
    match data {
        BlockData::Heading(heading) if !is_valid_heading_level(u64::from(heading.level)) => {
            Err(DocumentError::InvalidBlockStructure {
                block_id: block_id.to_string(),
                block_type: BlockType::Heading,
                reason: format!("data.level must be 1, 2 or 3, found {}", heading.level),
            })
        }
        _ => Ok(()),
    }
}

/// Checks a payload subtree before it is converted into blocks: non-empty ids,
/// no use of the root id, valid data, no children on childless variants at any
/// depth, and no duplicate ids inside the payload.
pub fn validate_payload(payload: &BlockPayload, root_id: &str) -> Result<(), DocumentError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut result = Ok(());

    traverse(std::slice::from_ref(payload), |node| {
        if result.is_err() {
            return;
        }
        result = validate_payload_node(node, root_id, &mut seen);
    });

    result
}

fn validate_payload_node<'a>(
    node: &'a BlockPayload,
    root_id: &str,
    seen: &mut HashSet<&'a str>,
) -> Result<(), DocumentError> {
    if node.id.is_empty() {
        return Err(DocumentError::InvalidBlockStructure {
            block_id: node.id.clone(),
            block_type: node.block_type(),
            reason: "id must not be empty".to_string(),
        });
    }
    if node.id == root_id {
        return Err(DocumentError::ReservedBlockId {
            block_id: node.id.clone(),
        });
    }
    if !seen.insert(node.id.as_str()) {
        return Err(DocumentError::BlockAlreadyExists {
            block_id: node.id.clone(),
        });
    }

    validate_block_data(&node.id, &node.data)?;

    if !node.block_type().can_have_children() && !node.child_payloads().is_empty() {
        return Err(DocumentError::BlockCannotHaveChildren {
            block_id: node.id.clone(),
            block_type: node.block_type(),
        });
    }

    Ok(())
}

//! Output dialects: serde views for readTask, uploadTask and config documents.
//!
//! These structs only describe JSON shape. Building them (and every
//! validation that goes with it) lives in `crate::spec`.

use serde::{Deserialize, Serialize};

/// Marker emitted verbatim as `computedStreams` in every readTask.
pub const EMPTY_COMPUTED_STREAMS: &str = r#"[{"type":"computed","ops":[]}]"#;

/// Literal payload of an op node: either a stream/entity name or a constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpData {
    Text(String),
    Number(i64),
}

impl From<&str> for OpData {
    fn from(value: &str) -> Self {
        OpData::Text(value.to_string())
    }
}

impl From<String> for OpData {
    fn from(value: String) -> Self {
        OpData::Text(value)
    }
}

impl From<i64> for OpData {
    fn from(value: i64) -> Self {
        OpData::Number(value)
    }
}

/// One node of a column definition tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Op {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<OpData>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ops: Vec<Op>,
}

impl Op {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
            ops: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: impl Into<OpData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_ops(mut self, ops: Vec<Op>) -> Self {
        self.ops = ops;
        self
    }
}

/// A rendered extract column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub preferred: String,
    pub definition: Op,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadMap {
    pub file: String,
    pub populates: String,
    pub columns: Vec<Column>,
}

/// `readMap` is either a structured list or the same list pre-encoded as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReadMapValue {
    Structured(Vec<ReadMap>),
    Inline(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFrameView {
    pub end_date: String,
    pub start_date: String,
    pub interval_unit: String,
    pub day_within_period: String,
    pub interval: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadTask {
    pub entity: String,
    pub timezone: String,
    pub read_map: ReadMapValue,
    pub computed_streams: String,
    pub time_frames: Vec<TimeFrameView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadTaskDoc {
    #[serde(rename = "readTask")]
    pub read_task: ReadTask,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub load_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadTask {
    pub entity: String,
    pub file: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadTaskDoc {
    #[serde(rename = "uploadTask")]
    pub upload_task: UploadTask,
}

/// Config snapshot of one field; `"none"` types are written as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// Config snapshot of one load entity, re-parseable by `Load::parse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub entity: String,
    pub file: String,
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySelectionConfig {
    pub entity: String,
    pub file: String,
    pub fields: Vec<String>,
}

/// Extract-spec skeleton for a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub timezone: String,
    pub entities: Vec<EntitySelectionConfig>,
}

//! Field model: plain source columns plus the computed column variants.
//!
//! Every field carries a name and a [`FieldType`]; its [`FieldKind`] decides
//! how it renders into the extract dialect. Load rendering goes through the
//! type table for every kind.

use crate::error::{Result, SpecError};
use crate::model::{Attribute, Column, FieldConfig, Op};
use serde_json::Value;
use std::fmt;

/// Closed vocabulary of field types, plus the `"none"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Attribute,
    RecordId,
    Date,
    Time,
    Fact,
    Timestamp,
    Autoincrement,
    Snapshot,
    Hid,
    HistoricId,
    Duration,
    Velocity,
    IsDeleted,
    None,
}

impl FieldType {
    /// The 13 declarable types (the `"none"` sentinel excluded).
    pub const VOCABULARY: [FieldType; 13] = [
        Self::Attribute,
        Self::RecordId,
        Self::Date,
        Self::Time,
        Self::Fact,
        Self::Timestamp,
        Self::Autoincrement,
        Self::Snapshot,
        Self::Hid,
        Self::HistoricId,
        Self::Duration,
        Self::Velocity,
        Self::IsDeleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::RecordId => "recordid",
            Self::Date => "date",
            Self::Time => "time",
            Self::Fact => "fact",
            Self::Timestamp => "timestamp",
            Self::Autoincrement => "autoincrement",
            Self::Snapshot => "snapshot",
            Self::Hid => "hid",
            Self::HistoricId => "historicid",
            Self::Duration => "duration",
            Self::Velocity => "velocity",
            Self::IsDeleted => "isDeleted",
            Self::None => "none",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name == "none" {
            return Some(Self::None);
        }
        Self::VOCABULARY.into_iter().find(|t| t.as_str() == name)
    }

    /// uploadTask attribute type.
    fn load_type(self) -> Option<&'static str> {
        match self {
            Self::RecordId => Some("recordid"),
            Self::Timestamp => Some("timestamp"),
            Self::Attribute => Some("attribute"),
            Self::Fact => Some("fact"),
            Self::Time | Self::Date => Some("timeAttribute"),
            Self::IsDeleted => Some("isDeleted"),
            _ => None,
        }
    }

    /// Type of the inner op reading the column.
    fn stream_op(self) -> Option<&'static str> {
        match self {
            Self::RecordId => Some("recordid"),
            Self::Attribute | Self::Fact | Self::Time | Self::Date => Some("stream"),
            Self::Snapshot => Some("snapshot"),
            _ => None,
        }
    }

    /// Type of the column definition wrapping the op.
    fn definition_type(self) -> Option<&'static str> {
        match self {
            Self::RecordId | Self::Attribute => Some("value"),
            Self::Fact => Some("number"),
            Self::Snapshot => Some("snapshot"),
            Self::Time => Some("key"),
            Self::Date => Some("date"),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of a historic-id column: follow `through` (or the record id) to
/// `entity` and read `fields` there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidSource {
    pub entity: String,
    pub fields: Vec<String>,
    pub through: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    Snapshot,
    Hid(HidSource),
    Duration,
    Velocity,
    Autoincrement,
}

/// A named, typed column descriptor.
///
/// Equality is by name only.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    field_type: FieldType,
    kind: FieldKind,
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Field {}

impl Field {
    /// Plain field from a declared type name.
    pub fn new(name: impl Into<String>, type_name: &str) -> Result<Self> {
        let name = name.into();
        let field_type = FieldType::from_name(type_name).ok_or_else(|| {
            SpecError::incorrect(format!(
                "The field name \"{name}\" does have wrong type specified. Specified \"{type_name}\" should be one of [{}]",
                vocabulary()
            ))
        })?;
        Self::typed(name, field_type, FieldKind::Plain)
    }

    fn typed(name: String, field_type: FieldType, kind: FieldKind) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(SpecError::incorrect("Field name should not be empty."));
        }
        Ok(Self {
            name,
            field_type,
            kind,
        })
    }

    /// Parse a `{ "name": .., "type": .. }` field spec.
    pub fn parse(spec: &Value) -> Result<Self> {
        let map = match spec {
            Value::Null => return Err(SpecError::insufficient("Field specification is empty")),
            Value::Object(map) => map,
            _ => {
                return Err(SpecError::insufficient(format!(
                    "Field specification should be an object, got {spec}"
                )));
            }
        };

        let name = match map.get("name") {
            None | Some(Value::Null) => {
                return Err(SpecError::insufficient(format!(
                    "Field specification {spec} does not have a name"
                )));
            }
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(SpecError::incorrect(format!(
                    "Field name should be a string, got {other}"
                )));
            }
        };

        match map.get("type") {
            None | Some(Value::Null) => Err(SpecError::incorrect(format!(
                "The field name \"{name}\" does not have type specified. Type should be one of [{}]",
                vocabulary()
            ))),
            // The load config writes "none" as "", accept it back.
            Some(Value::String(t)) if t.is_empty() => Self::new(name, FieldType::None.as_str()),
            Some(Value::String(t)) => Self::new(name, t),
            Some(other) => Err(SpecError::incorrect(format!(
                "The type of field name \"{name}\" should be a string, got {other}"
            ))),
        }
    }

    /// Plain field with a known type; used for the `DeletedAt`/`IsDeleted` keywords.
    pub fn plain(name: impl Into<String>, field_type: FieldType) -> Result<Self> {
        Self::typed(name.into(), field_type, FieldKind::Plain)
    }

    pub fn snapshot() -> Self {
        Self {
            name: "snapshot".to_string(),
            field_type: FieldType::Snapshot,
            kind: FieldKind::Snapshot,
        }
    }

    pub fn autoincrement() -> Self {
        Self {
            name: "generate".to_string(),
            field_type: FieldType::Autoincrement,
            kind: FieldKind::Autoincrement,
        }
    }

    /// Stage duration column. The rendered name is fixed, `name` and
    /// `field_type` only identify the field inside its entity.
    pub fn duration(name: impl Into<String>, field_type: FieldType) -> Result<Self> {
        Self::typed(name.into(), field_type, FieldKind::Duration)
    }

    pub fn velocity() -> Self {
        Self {
            name: "velocity".to_string(),
            field_type: FieldType::Velocity,
            kind: FieldKind::Velocity,
        }
    }

    /// Historic-id column named `hid-<entity>`.
    pub fn hid(source: HidSource) -> Result<Self> {
        if source.entity.trim().is_empty() {
            return Err(SpecError::insufficient("Entity has to be specified for a HID field"));
        }
        if source.fields.is_empty() {
            return Err(SpecError::insufficient(format!(
                "Fields have to be specified for the HID field of entity {}",
                source.entity
            )));
        }
        let name = format!("hid-{}", source.entity);
        Self::typed(name, FieldType::HistoricId, FieldKind::Hid(source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_recordid(&self) -> bool {
        self.field_type == FieldType::RecordId
    }

    pub fn is_hid(&self) -> bool {
        matches!(self.kind, FieldKind::Hid(_))
    }

    pub fn is_autoincrement(&self) -> bool {
        matches!(self.kind, FieldKind::Autoincrement)
    }

    pub fn is_duration(&self) -> bool {
        matches!(self.kind, FieldKind::Duration)
    }

    pub fn is_velocity(&self) -> bool {
        matches!(self.kind, FieldKind::Velocity)
    }

    pub fn render_load(&self) -> Result<Attribute> {
        let load_type = self
            .field_type
            .load_type()
            .ok_or_else(|| self.unmapped("load"))?;
        Ok(Attribute {
            name: self.name.clone(),
            load_type: load_type.to_string(),
        })
    }

    pub fn render_load_config(&self) -> FieldConfig {
        let field_type = match self.field_type {
            FieldType::None => String::new(),
            t => t.as_str().to_string(),
        };
        FieldConfig {
            name: self.name.clone(),
            field_type,
        }
    }

    pub fn render_extract(&self) -> Result<Column> {
        match &self.kind {
            FieldKind::Plain => {
                let op = self
                    .field_type
                    .stream_op()
                    .ok_or_else(|| self.unmapped("extract op"))?;
                let definition = self
                    .field_type
                    .definition_type()
                    .ok_or_else(|| self.unmapped("extract definition"))?;
                Ok(self.column(
                    Op::new(definition).with_ops(vec![Op::new(op).with_data(self.name.as_str())]),
                ))
            }
            FieldKind::Snapshot => Ok(self.column(Op::new("snapshot").with_data("date"))),
            FieldKind::Autoincrement => {
                Ok(self.column(Op::new("generate").with_data("autoincrement")))
            }
            FieldKind::Hid(source) => {
                let via = match &source.through {
                    Some(stream) => Op::new("stream").with_data(stream.as_str()),
                    None => Op::new(FieldType::RecordId.as_str()),
                };
                let reads = source
                    .fields
                    .iter()
                    .map(|f| Op::new("stream").with_data(f.as_str()))
                    .collect();
                let target = Op::new("entity")
                    .with_data(source.entity.as_str())
                    .with_ops(reads);
                Ok(self.column(Op::new("historicid").with_ops(vec![via, target])))
            }
            FieldKind::Duration => Ok(stage_duration()),
            FieldKind::Velocity => Ok(Column {
                name: "StageVelocity".to_string(),
                preferred: "stagevelocity".to_string(),
                definition: Op::new("velocity")
                    .with_ops(vec![Op::new("stream").with_data("StageName")]),
            }),
        }
    }

    fn column(&self, definition: Op) -> Column {
        Column {
            name: self.name.clone(),
            preferred: self.name.clone(),
            definition,
        }
    }

    fn unmapped(&self, table: &'static str) -> SpecError {
        SpecError::UnmappedType {
            field: self.name.clone(),
            field_type: self.field_type.to_string(),
            table,
        }
    }
}

/// `case IsClosed = "false" -> duration(StageName); else 1 / 0`.
fn stage_duration() -> Column {
    let open = Op::new("option").with_ops(vec![
        Op::new("=").with_ops(vec![
            Op::new("stream").with_data("IsClosed"),
            Op::new("match").with_data("false"),
        ]),
        Op::new("duration").with_ops(vec![Op::new("stream").with_data("StageName")]),
    ]);
    let otherwise = Op::new("option").with_ops(vec![
        Op::new("const").with_data(1_i64),
        Op::new("const").with_data(0_i64),
    ]);
    Column {
        name: "StageDuration".to_string(),
        preferred: "stageduration".to_string(),
        definition: Op::new("case").with_ops(vec![open, otherwise]),
    }
}

fn vocabulary() -> String {
    FieldType::VOCABULARY
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

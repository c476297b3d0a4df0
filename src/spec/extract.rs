//! Extract specification: which entities, fields and time windows to read.
//!
//! JSON shape:
//! {
//!   "timezone": "UTC",                         // optional
//!   "timeframes": "latest",                    // optional default, spec or list
//!   "entities": [
//!     {
//!       "entity": "Deal",
//!       "fields": ["Id", "Amount", "snapshot", {"hid": {...}}],
//!       "timeframes": {...},                   // optional per-entity override
//!       "file": "deal.csv"                     // optional, else the load's file
//!     }
//!   ]
//! }
//!
//! Each requested field resolves to the merged load field of the same name
//! (shared, not copied), else to one of the computed-field keywords.

use crate::config::{DEFAULT_TIMEZONE, RenderOptions};
use crate::error::{Result, SpecError};
use crate::model::ReadTaskDoc;
use crate::spec::entity::{Entity, SharedField};
use crate::spec::field::{Field, FieldType, HidSource};
use crate::spec::load::Load;
use crate::spec::timeframe::{Timeframe, parse_timeframes};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractSpec {
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub timeframes: Option<Value>,

    #[serde(default)]
    pub entities: Option<Vec<EntitySelection>>,
}

/// One entry of `entities` as it appears in the extract spec.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitySelection {
    #[serde(default)]
    pub entity: Option<String>,

    #[serde(default)]
    pub fields: Option<Vec<Value>>,

    #[serde(default)]
    pub timeframes: Option<Value>,

    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct HidSpec {
    from_entity: Option<String>,
    #[serde(default)]
    from_fields: Option<Vec<String>>,
    #[serde(default)]
    connected_through: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Extract {
    entities: Vec<Entity>,
    timeframes: Vec<Timeframe>,
    timezone: String,
}

impl Extract {
    /// Parse against the local calendar date.
    pub fn parse(spec: &Value, load: &Load) -> Result<Self> {
        Self::parse_relative(spec, load, Local::now().date_naive())
    }

    pub fn parse_relative(spec: &Value, load: &Load, today: NaiveDate) -> Result<Self> {
        let spec: ExtractSpec = serde_json::from_value(spec.clone())
            .map_err(|e| SpecError::incorrect(format!("Extract specification is malformed: {e}")))?;
        Self::from_spec(&spec, load, today)
    }

    pub fn from_spec(spec: &ExtractSpec, load: &Load, today: NaiveDate) -> Result<Self> {
        let timeframes = match parse_timeframes(spec.timeframes.as_ref(), today)? {
            Some(timeframes) => timeframes,
            None => vec![Timeframe::latest(today)?],
        };
        let timezone = spec
            .timezone
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let selections = spec
            .entities
            .as_ref()
            .ok_or_else(|| SpecError::insufficient("Extract specification has no entities"))?;

        let entities = selections
            .iter()
            .map(|selection| resolve_entity(selection, load, &timeframes, &timezone, today))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entities,
            timeframes,
            timezone,
        })
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Default timeframes applied to entities without their own.
    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn render_fragment(
        &self,
        pid: &str,
        options: &RenderOptions,
    ) -> Result<Vec<ReadTaskDoc>> {
        self.entities
            .iter()
            .map(|e| e.render_extract_fragment(pid, options))
            .collect()
    }
}

fn resolve_entity(
    selection: &EntitySelection,
    load: &Load,
    default_timeframes: &[Timeframe],
    timezone: &str,
    today: NaiveDate,
) -> Result<Entity> {
    let name = selection
        .entity
        .as_deref()
        .ok_or_else(|| SpecError::insufficient("Extract entity selection has no entity name"))?;
    let merged = load.get_merged_entity_for(name)?;

    let requested = selection.fields.as_ref().ok_or_else(|| {
        SpecError::insufficient(format!("Extract entity {name} does not list any fields"))
    })?;
    let fields = requested
        .iter()
        .map(|field| resolve_field(field, &merged))
        .collect::<Result<Vec<_>>>()?;

    let own = parse_timeframes(selection.timeframes.as_ref(), today)?.filter(|t| !t.is_empty());
    let timeframes = match own {
        Some(timeframes) => timeframes,
        None if !default_timeframes.is_empty() => default_timeframes.to_vec(),
        None => return Err(SpecError::TimeframeUndefined(name.to_string())),
    };

    // `merged` is file-less; prefer the selection's file, then the first declaration's.
    let file = match &selection.file {
        Some(file) => file.clone(),
        None => load
            .get_entity(name)
            .map(|e| e.file().to_string())
            .unwrap_or_else(|| merged.file().to_string()),
    };

    Ok(Entity::new(name, file, fields)?
        .with_timeframes(timeframes)
        .with_timezone(timezone))
}

/// Resolution order: merged load field, computed keyword, HID spec
/// (`{"hid": {...}}` with no other keys).
fn resolve_field(field: &Value, merged: &Entity) -> Result<SharedField> {
    if let Value::String(name) = field {
        if let Some(existing) = merged.get_field(name) {
            return Ok(Arc::clone(existing));
        }
        let computed = match name.as_str() {
            "DeletedAt" => Field::plain("DeletedAt", FieldType::Time)?,
            "IsDeleted" => Field::plain("IsDeleted", FieldType::Attribute)?,
            "snapshot" => Field::snapshot(),
            "autoincrement" => Field::autoincrement(),
            "duration" => Field::duration("duration", FieldType::Duration)?,
            // Resolves to a duration column, not `Field::velocity()`.
            "velocity" => Field::duration("velocity", FieldType::Velocity)?,
            _ => return Err(unresolved(field, merged)),
        };
        debug!(entity = merged.name(), field = %name, "materialized computed field");
        return Ok(Arc::new(computed));
    }

    if let Some(hid) = field.get("hid") {
        if field.as_object().is_some_and(|spec| spec.len() != 1) {
            return Err(SpecError::incorrect(format!(
                "HID field of entity {} should only contain the hid key, got {field}",
                merged.name()
            )));
        }
        let spec: HidSpec = serde_json::from_value(hid.clone()).map_err(|e| {
            SpecError::incorrect(format!(
                "HID field of entity {} is malformed: {e}",
                merged.name()
            ))
        })?;
        let entity = spec.from_entity.ok_or_else(|| {
            SpecError::insufficient(format!(
                "HID field of entity {} has no from_entity",
                merged.name()
            ))
        })?;
        let fields = spec.from_fields.ok_or_else(|| {
            SpecError::insufficient(format!(
                "HID field of entity {} has no from_fields",
                merged.name()
            ))
        })?;
        let hid = Field::hid(HidSource {
            entity,
            fields,
            through: spec.connected_through,
        })?;
        debug!(entity = merged.name(), field = hid.name(), "materialized hid field");
        return Ok(Arc::new(hid));
    }

    Err(unresolved(field, merged))
}

fn unresolved(field: &Value, merged: &Entity) -> SpecError {
    let shown = match field {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    };
    SpecError::insufficient(format!(
        "The field {shown} of entity {} was not found in either the loading specification nor was recognized as a special column",
        merged.name()
    ))
}

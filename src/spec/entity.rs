//! Entities: a named, ordered set of fields backed by one source file.
//!
//! JSON shape in a load spec:
//! {
//!   "entity": "Deal",
//!   "file": "data/deal.csv",
//!   "fields": [{ "name": "Id", "type": "recordid" }, ...]
//! }

use crate::config::RenderOptions;
use crate::error::{Result, SpecError};
use crate::model::{
    EMPTY_COMPUTED_STREAMS, EntityConfig, EntitySelectionConfig, ExtractConfig, ReadMap,
    ReadMapValue, ReadTask, ReadTaskDoc, UploadTask, UploadTaskDoc,
};
use crate::render::paths::{extract_path, load_path};
use crate::spec::field::{Field, FieldType};
use crate::spec::timeframe::Timeframe;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Fields are shared: an extract entity may hold the very same `Field` a
/// load entity owns. Nothing mutates a field after construction.
pub type SharedField = Arc<Field>;

#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    file: String,
    fields: Vec<SharedField>,
    timeframes: Vec<Timeframe>,
    timezone: String,
}

impl Entity {
    /// Validate and build an entity. Timeframes default to none and the
    /// timezone to `UTC`, see [`Entity::with_timeframes`] and
    /// [`Entity::with_timezone`].
    pub fn new(
        name: impl Into<String>,
        file: impl Into<String>,
        fields: Vec<SharedField>,
    ) -> Result<Self> {
        let name = name.into();
        let file = file.into();

        if name.trim().is_empty() {
            return Err(SpecError::incorrect("Entity name should not be empty."));
        }
        if file.trim().is_empty() {
            return Err(SpecError::incorrect(format!(
                "File of entity {name} should not be empty."
            )));
        }
        if fields.is_empty() {
            return Err(SpecError::incorrect(format!(
                "Entity {name} should contain at least one field."
            )));
        }

        // Record ids and timestamps may repeat, e.g. after merging fragments.
        let mut seen = BTreeSet::new();
        for field in &fields {
            if field.is_recordid() || field.field_type() == FieldType::Timestamp {
                continue;
            }
            if !seen.insert(field.name()) {
                return Err(SpecError::incorrect(format!(
                    "Entity {name} should not contain multiple fields with the same name ({}).",
                    field.name()
                )));
            }
        }

        Ok(Self {
            name,
            file,
            fields,
            timeframes: Vec::new(),
            timezone: crate::config::DEFAULT_TIMEZONE.to_string(),
        })
    }

    pub fn with_timeframes(mut self, timeframes: Vec<Timeframe>) -> Self {
        self.timeframes = timeframes;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Parse one entity declaration from a load spec.
    pub fn parse(spec: &Value) -> Result<Self> {
        let Value::Object(map) = spec else {
            return Err(SpecError::incorrect(format!(
                "Entity specification should be an object, got {spec}"
            )));
        };

        let name = match map.get("entity") {
            None | Some(Value::Null) => {
                return Err(SpecError::incorrect("Entity name is not specified."));
            }
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(SpecError::incorrect("Entity name should be a string.")),
        };

        let file = match map.get("file") {
            None | Some(Value::Null) => {
                return Err(SpecError::incorrect(format!(
                    "File of entity {name} is not specified."
                )));
            }
            Some(Value::String(file)) => file.clone(),
            Some(_) => {
                return Err(SpecError::incorrect(format!(
                    "File of entity {name} should be a string."
                )));
            }
        };

        let fields = match map.get("fields") {
            None | Some(Value::Null) => {
                return Err(SpecError::incorrect(format!(
                    "Fields of entity {name} are not specified."
                )));
            }
            Some(Value::Array(specs)) => specs
                .iter()
                .map(|f| Field::parse(f).map(Arc::new))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(SpecError::incorrect(format!(
                    "Fields of entity {name} should be a list."
                )));
            }
        };

        Self::new(name, file, fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn fields(&self) -> &[SharedField] {
        &self.fields
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    pub fn get_field(&self, name: &str) -> Option<&SharedField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn add_field(&mut self, field: SharedField) -> Result<()> {
        if self.has_field(field.name()) {
            return Err(SpecError::incorrect(format!(
                "There already is a field with name {} in entity {}",
                field.name(),
                self.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    /// The field keying the read map: HID, else record id, else autoincrement.
    pub fn identifying_field(&self) -> Result<&SharedField> {
        self.fields
            .iter()
            .find(|f| f.is_hid())
            .or_else(|| self.fields.iter().find(|f| f.is_recordid()))
            .or_else(|| self.fields.iter().find(|f| f.is_autoincrement()))
            .ok_or_else(|| SpecError::MissingIdentifyingField(self.name.clone()))
    }

    /// The readMap file is the plain base name of the source under the
    /// entity's extract directory.
    pub fn render_extract_fragment(
        &self,
        pid: &str,
        options: &RenderOptions,
    ) -> Result<ReadTaskDoc> {
        let populates = self.identifying_field()?.name().to_string();
        if self.timeframes.is_empty() {
            return Err(SpecError::TimeframeUndefined(self.name.clone()));
        }

        let columns = self
            .fields
            .iter()
            .map(|f| f.render_extract())
            .collect::<Result<Vec<_>>>()?;

        let read_map = vec![ReadMap {
            file: extract_path(pid, &self.name, &self.file),
            populates,
            columns,
        }];
        let read_map = if options.pretty {
            ReadMapValue::Structured(read_map)
        } else {
            let inline = serde_json::to_string(&read_map)
                .map_err(|e| SpecError::incorrect(format!("readMap of {}: {e}", self.name)))?;
            ReadMapValue::Inline(inline)
        };

        Ok(ReadTaskDoc {
            read_task: ReadTask {
                entity: self.name.clone(),
                timezone: self.timezone.clone(),
                read_map,
                computed_streams: EMPTY_COMPUTED_STREAMS.to_string(),
                time_frames: self.timeframes.iter().map(Timeframe::render).collect(),
            },
        })
    }

    /// Upload task for this declaration's own file and columns.
    pub fn render_load_fragment(&self, pid: &str) -> Result<UploadTaskDoc> {
        let attributes = self
            .fields
            .iter()
            .map(|f| f.render_load())
            .collect::<Result<Vec<_>>>()?;
        Ok(UploadTaskDoc {
            upload_task: UploadTask {
                entity: self.name.clone(),
                file: load_path(pid, &self.file),
                attributes,
            },
        })
    }

    pub fn render_load_config(&self) -> EntityConfig {
        EntityConfig {
            entity: self.name.clone(),
            file: self.file.clone(),
            fields: self.fields.iter().map(|f| f.render_load_config()).collect(),
        }
    }

    pub fn render_extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            timezone: self.timezone.clone(),
            entities: vec![EntitySelectionConfig {
                entity: self.name.clone(),
                file: self.file.clone(),
                fields: self.fields.iter().map(|f| f.name().to_string()).collect(),
            }],
        }
    }
}

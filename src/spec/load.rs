//! Load specification: every declared source entity, possibly split across
//! several declarations of the same name.

use crate::error::{Result, SpecError};
use crate::model::{EntityConfig, ExtractConfig, UploadTaskDoc};
use crate::spec::entity::Entity;
use anyhow::Context;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// File marker of an entity produced by merging declarations.
pub const MERGED_FILE: &str = "MERGED";

#[derive(Debug, Clone)]
pub struct Load {
    entities: Vec<Entity>,
}

impl Load {
    /// Build a load and check that every entity name merges cleanly.
    pub fn new(entities: Vec<Entity>) -> Result<Self> {
        let load = Self { entities };
        load.validate()?;
        Ok(load)
    }

    /// Parse a JSON list of entity declarations. No merging happens here.
    pub fn parse(spec: &Value) -> Result<Self> {
        Self::new(parse_entities(spec)?)
    }

    /// Parse several fragments and validate them as one load.
    pub fn parse_fragments<'a>(fragments: impl IntoIterator<Item = &'a Value>) -> Result<Self> {
        let mut entities = Vec::new();
        for fragment in fragments {
            entities.extend(parse_entities(fragment)?);
        }
        Self::new(entities)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Distinct entity names in first-seen order.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entity in &self.entities {
            if !names.contains(&entity.name()) {
                names.push(entity.name());
            }
        }
        names
    }

    /// First declaration of `name`.
    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    /// Concatenate the fields of every declaration named `name`, in order.
    /// Fields are shared with the declarations, not copied.
    pub fn get_merged_entity_for(&self, name: &str) -> Result<Entity> {
        let parts: Vec<&Entity> = self.entities.iter().filter(|e| e.name() == name).collect();
        if parts.is_empty() {
            return Err(SpecError::UnableToMerge(name.to_string()));
        }
        let fields = parts
            .iter()
            .flat_map(|e| e.fields().iter().cloned())
            .collect::<Vec<_>>();
        debug!(
            entity = name,
            declarations = parts.len(),
            fields = fields.len(),
            "merged entity"
        );
        Entity::new(name, MERGED_FILE, fields)
    }

    /// Declarations named in `names`, every declaration when `names` is
    /// empty. Unknown names fail with `UnableToMerge`.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Entity>> {
        if let Some(unknown) = names.iter().find(|n| self.get_entity(n).is_none()) {
            return Err(SpecError::UnableToMerge(unknown.clone()));
        }
        Ok(self
            .entities
            .iter()
            .filter(|e| names.is_empty() || names.iter().any(|n| n == e.name()))
            .collect())
    }

    /// One uploadTask per declaration: each source file lists only its own
    /// columns.
    pub fn render_upload_tasks(&self, pid: &str, names: &[String]) -> Result<Vec<UploadTaskDoc>> {
        self.select(names)?
            .into_iter()
            .map(|e| e.render_load_fragment(pid))
            .collect()
    }

    /// One extract skeleton per declaration, under `timezone`.
    pub fn render_extract_configs(&self, timezone: &str) -> Vec<ExtractConfig> {
        self.entities
            .iter()
            .map(|e| e.clone().with_timezone(timezone).render_extract_config())
            .collect()
    }

    fn validate(&self) -> Result<()> {
        for name in self.entity_names() {
            self.get_merged_entity_for(name)?;
        }
        Ok(())
    }

    pub fn render_config(&self) -> Vec<EntityConfig> {
        self.entities.iter().map(Entity::render_load_config).collect()
    }

    pub fn render_config_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.render_config())?;
        std::fs::write(path, json).with_context(|| format!("write load config {}", path.display()))
    }
}

/// A fragment is a list of entity specs or a single entity spec.
fn parse_entities(spec: &Value) -> Result<Vec<Entity>> {
    match spec {
        Value::Array(items) => items.iter().map(Entity::parse).collect(),
        Value::Object(_) => Ok(vec![Entity::parse(spec)?]),
        other => Err(SpecError::incorrect(format!(
            "Load specification should be a list of entities, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn deal_fragments() -> Value {
        json!([
            {
                "entity": "Deal",
                "file": "deal.csv",
                "fields": [
                    {"name": "A", "type": "recordid"},
                    {"name": "B", "type": "attribute"}
                ]
            },
            {"entity": "Account", "file": "account.csv", "fields": [{"name": "Id", "type": "recordid"}]},
            {"entity": "Deal", "file": "deal_extra.csv", "fields": [{"name": "C", "type": "fact"}]}
        ])
    }

    #[test]
    fn merge_concatenates_in_declaration_order() {
        let load = Load::parse(&deal_fragments()).unwrap();
        assert_eq!(load.entities().len(), 3);
        assert_eq!(load.entity_names(), vec!["Deal", "Account"]);

        let merged = load.get_merged_entity_for("Deal").unwrap();
        assert_eq!(merged.file(), MERGED_FILE);
        let names: Vec<&str> = merged.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        // Shared with the declarations, not copied.
        let declared = load.get_entity("Deal").unwrap().get_field("B").unwrap();
        assert!(Arc::ptr_eq(declared, merged.get_field("B").unwrap()));
        assert_eq!(load.get_entity("Deal").unwrap().file(), "deal.csv");
    }

    #[test]
    fn upload_tasks_are_per_declaration() {
        let load = Load::parse(&deal_fragments()).unwrap();

        let all = serde_json::to_value(load.render_upload_tasks("p", &[]).unwrap()).unwrap();
        assert_eq!(all.as_array().unwrap().len(), 3);

        let deal = load.render_upload_tasks("p", &["Deal".to_string()]).unwrap();
        let deal = serde_json::to_value(deal).unwrap();
        assert_eq!(
            deal,
            json!([
                {"uploadTask": {
                    "entity": "Deal",
                    "file": "/uploads/p/deal.csv",
                    "attributes": [
                        {"name": "A", "type": "recordid"},
                        {"name": "B", "type": "attribute"}
                    ]
                }},
                {"uploadTask": {
                    "entity": "Deal",
                    "file": "/uploads/p/deal_extra.csv",
                    "attributes": [{"name": "C", "type": "fact"}]
                }}
            ])
        );

        assert_eq!(
            load.render_upload_tasks("p", &["Lead".to_string()]).unwrap_err(),
            SpecError::UnableToMerge("Lead".into())
        );
    }

    #[test]
    fn extract_configs_are_per_declaration() {
        let load = Load::parse(&deal_fragments()).unwrap();
        let configs = serde_json::to_value(load.render_extract_configs("Europe/Prague")).unwrap();
        assert_eq!(
            configs,
            json!([
                {
                    "timezone": "Europe/Prague",
                    "entities": [{"entity": "Deal", "file": "deal.csv", "fields": ["A", "B"]}]
                },
                {
                    "timezone": "Europe/Prague",
                    "entities": [{"entity": "Account", "file": "account.csv", "fields": ["Id"]}]
                },
                {
                    "timezone": "Europe/Prague",
                    "entities": [{"entity": "Deal", "file": "deal_extra.csv", "fields": ["C"]}]
                }
            ])
        );
    }

    #[test]
    fn merge_of_unknown_name_fails() {
        let load = Load::parse(&deal_fragments()).unwrap();
        assert_eq!(
            load.get_merged_entity_for("Lead").unwrap_err(),
            SpecError::UnableToMerge("Lead".into())
        );
    }

    #[test]
    fn duplicate_fields_across_fragments_fail_eagerly() {
        let spec = json!([
            {"entity": "Deal", "file": "a.csv", "fields": [{"name": "Stage", "type": "attribute"}]},
            {"entity": "Deal", "file": "b.csv", "fields": [{"name": "Stage", "type": "attribute"}]}
        ]);
        assert!(matches!(
            Load::parse(&spec),
            Err(SpecError::IncorrectSpecification(_))
        ));

        // Record ids are allowed to repeat across fragments.
        let spec = json!([
            {"entity": "Deal", "file": "a.csv", "fields": [{"name": "Id", "type": "recordid"}]},
            {"entity": "Deal", "file": "b.csv", "fields": [{"name": "Id", "type": "recordid"}]}
        ]);
        let merged = Load::parse(&spec).unwrap().get_merged_entity_for("Deal").unwrap();
        assert_eq!(merged.fields().len(), 2);
    }

    #[test]
    fn fragments_validate_together() {
        let a = json!({"entity": "Deal", "file": "a.csv", "fields": [{"name": "Id", "type": "recordid"}]});
        let b = json!([{"entity": "Deal", "file": "b.csv", "fields": [{"name": "Amount", "type": "fact"}]}]);
        let load = Load::parse_fragments([&a, &b]).unwrap();
        assert_eq!(load.get_merged_entity_for("Deal").unwrap().fields().len(), 2);

        assert!(matches!(
            Load::parse(&json!("Deal")),
            Err(SpecError::IncorrectSpecification(_))
        ));
    }

    #[test]
    fn config_round_trip() {
        let spec = json!([
            {
                "entity": "Deal",
                "file": "deal.csv",
                "fields": [
                    {"name": "Id", "type": "recordid"},
                    {"name": "Note", "type": "none"},
                    {"name": "Closed", "type": "date"}
                ]
            }
        ]);
        let load = Load::parse(&spec).unwrap();
        let config = load.render_config();
        assert_eq!(config[0].fields[1].field_type, "");

        let reparsed = Load::parse(&serde_json::to_value(&config).unwrap()).unwrap();
        assert_eq!(reparsed.render_config(), config);
    }
}

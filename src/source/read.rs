use crate::spec::Load;
use anyhow::Context;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read and parse one JSON document.
pub fn read_fragment(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read spec file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse spec file {}", path.display()))
}

/// Read every load fragment and validate them as a single load.
pub fn read_load(paths: &[PathBuf]) -> anyhow::Result<Load> {
    let mut fragments = Vec::with_capacity(paths.len());
    for path in paths {
        fragments.push(read_fragment(path)?);
    }
    let load = Load::parse_fragments(&fragments).with_context(|| {
        let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        format!("invalid load specification in {}", shown.join(", "))
    })?;
    debug!(
        files = paths.len(),
        entities = load.entities().len(),
        "parsed load specification"
    );
    Ok(load)
}

/// True when the file holds a header plus at least one record.
pub fn has_data_rows(path: &Path) -> anyhow::Result<bool> {
    let file = File::open(path).with_context(|| format!("open source file {}", path.display()))?;
    let mut lines = 0usize;
    for line in BufReader::new(file).lines() {
        line.with_context(|| format!("read source file {}", path.display()))?;
        lines += 1;
        if lines > 1 {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn write_load_config(load: &Load, path: &Path) -> anyhow::Result<()> {
    load.render_config_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scratch(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("es-spec-read-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn data_rows() {
        assert!(!has_data_rows(&scratch("empty.csv", "")).unwrap());
        assert!(!has_data_rows(&scratch("header.csv", "Id,Name\n")).unwrap());
        assert!(has_data_rows(&scratch("rows.csv", "Id,Name\n1,a\n")).unwrap());
        assert!(has_data_rows(&std::env::temp_dir().join("es-spec-no-such-file.csv")).is_err());
    }

    #[test]
    fn load_spans_files_and_round_trips() {
        let a = scratch(
            "load_a.json",
            r#"[{"entity": "Deal", "file": "deal.csv", "fields": [{"name": "Id", "type": "recordid"}]}]"#,
        );
        let b = scratch(
            "load_b.json",
            r#"{"entity": "Deal", "file": "deal.csv", "fields": [{"name": "Amount", "type": "fact"}]}"#,
        );
        let load = read_load(&[a, b]).unwrap();
        assert_eq!(load.get_merged_entity_for("Deal").unwrap().fields().len(), 2);

        let out = scratch("load_out.json", "");
        write_load_config(&load, &out).unwrap();
        let again = read_load(&[out]).unwrap();
        assert_eq!(again.render_config(), load.render_config());
    }

    #[test]
    fn errors_name_the_file() {
        let bad = scratch("bad.json", "{ not json");
        let err = read_fragment(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));

        let invalid = scratch(
            "invalid.json",
            r#"[{"entity": "Deal", "file": "x.csv", "fields": []}]"#,
        );
        let err = read_load(&[invalid]).unwrap_err();
        assert!(format!("{err:#}").contains("at least one field"));
    }
}

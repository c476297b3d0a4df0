//! Destination paths the extract/load service reads from and writes to.
//!
//! Example (pid `abc`, entity `Deal` backed by `data/deal.csv`):
//!   extract path  /out_abc_Deal/deal.csv
//!   load path     /uploads/abc/deal.csv
//!   local name    deal_deleted_2024-06-02_10:00:00.csv  (`deleted`, `with_date`)

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::Path;

pub fn extract_dir(pid: &str, entity: &str) -> String {
    format!("/out_{pid}_{entity}")
}

pub fn load_dir(pid: &str) -> String {
    format!("/uploads/{pid}")
}

/// Base name of `source`.
pub fn file_name(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn extract_path(pid: &str, entity: &str, source: &str) -> String {
    format!("{}/{}", extract_dir(pid, entity), file_name(source))
}

pub fn load_path(pid: &str, source: &str) -> String {
    format!("{}/{}", load_dir(pid), file_name(source))
}

/// Naming of downloaded extract results on the local side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Destinations {
    /// Append `at` to the file stem.
    pub with_date: bool,
    /// Append `_deleted` to the file stem.
    pub deleted: bool,
}

impl Destinations {
    pub fn local_file_name(&self, source: &str, at: NaiveDateTime) -> String {
        let path = Path::new(source);
        let mut stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.deleted {
            stem.push_str("_deleted");
        }
        if self.with_date {
            stem.push('_');
            stem.push_str(&at.format("%Y-%m-%d_%H:%M:%S").to_string());
        }
        match path.extension() {
            Some(ext) => format!("{stem}.{}", ext.to_string_lossy()),
            None => stem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 2)
            .unwrap()
            .and_hms_opt(10, 5, 9)
            .unwrap()
    }

    #[test]
    fn task_paths() {
        assert_eq!(extract_path("abc", "Deal", "data/deal.csv"), "/out_abc_Deal/deal.csv");
        assert_eq!(load_path("abc", "/tmp/in/deal.csv"), "/uploads/abc/deal.csv");
        assert_eq!(file_name("README"), "README");
    }

    #[test]
    fn local_names() {
        assert_eq!(
            Destinations::default().local_file_name("data/deal.csv", at()),
            "deal.csv"
        );

        let deleted = Destinations {
            deleted: true,
            ..Default::default()
        };
        assert_eq!(deleted.local_file_name("data/deal.csv", at()), "deal_deleted.csv");

        let both = Destinations {
            deleted: true,
            with_date: true,
        };
        assert_eq!(
            both.local_file_name("deal.csv", at()),
            "deal_deleted_2024-06-02_10:05:09.csv"
        );
        assert_eq!(both.local_file_name("README", at()), "README_deleted_2024-06-02_10:05:09");
    }
}

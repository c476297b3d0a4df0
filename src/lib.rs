//! `es-spec`: compile declarative entity/field/timeframe specifications into
//! the readTask (extract) and uploadTask (load) configurations consumed by
//! the event store extract/load service.
//!
//! Pipeline:
//! - `source/` - JSON fragments on disk → `serde_json::Value`
//! - `spec/`   - Value → validated `Load` / `Extract` (merge + field resolution)
//! - `model/`  - output dialect views
//! - `render/` - views → JSON text, destination paths

pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod source;
pub mod spec;

pub use config::{Config, RenderOptions};
pub use error::SpecError;
pub use spec::{Entity, Extract, Field, FieldType, Load, Timeframe};

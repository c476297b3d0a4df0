//! Spec layer: declarative JSON input + validated in-memory structures.
//!
//! This module is intentionally separate from file handling and rendering.
//! It owns:
//! - Timeframe (date windows, natural-language dates)
//! - Field (plain and computed column variants)
//! - Entity (named field sets backed by a source file)
//! - Load (declared entities, merged by name)
//! - Extract (entity/field selection resolved against a Load)

pub mod date;
pub mod entity;
pub mod extract;
pub mod field;
pub mod load;
pub mod timeframe;

pub use entity::{Entity, SharedField};
pub use extract::{EntitySelection, Extract, ExtractSpec};
pub use field::{Field, FieldKind, FieldType, HidSource};
pub use load::{Load, MERGED_FILE};
pub use timeframe::{DayWithinPeriod, IntervalUnit, LATEST, Timeframe};

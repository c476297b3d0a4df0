//! Reading declaration fragments and probing source data files.

pub mod read;

pub use read::{has_data_rows, read_fragment, read_load, write_load_config};

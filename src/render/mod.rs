//! Rendering: output documents as JSON text, plus destination paths.

pub mod json;
pub mod paths;

pub use json::{render_json, write_output};
pub use paths::{Destinations, extract_path, load_path};

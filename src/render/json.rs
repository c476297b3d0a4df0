use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Render any output document as JSON text.
pub fn render_json<T: Serialize + ?Sized>(doc: &T, pretty: bool) -> anyhow::Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(doc)?
    } else {
        serde_json::to_string(doc)?
    };
    Ok(text)
}

/// Write to `out`, or to stdout when no path is given.
pub fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, format!("{text}\n"))
                .with_context(|| format!("write output {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{text}"),
    }
    Ok(())
}

mod progress;
mod tables;

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use log::info;
use rgwadmin::{BucketInfo, OutputFormat};
use serde::Serialize;
use serde_json::Value;

pub use progress::FetchProgress;

/// Prints the rgwadmin banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        style("🪣 rgwadmin").magenta().bold(),
        style(env!("CARGO_PKG_VERSION")).dim(),
        style("Ceph RADOS Gateway admin client").dim()
    );
}

pub fn render_json(value: &impl Serialize, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

/// Where and how command results are written.
pub struct Sink<'a> {
    pub format: OutputFormat,
    pub pretty: bool,
    pub path: Option<&'a Path>,
}

impl Sink<'_> {
    /// Writes an admin response. Empty responses only print a confirmation.
    pub fn emit(&self, value: Option<&Value>) -> Result<()> {
        let Some(value) = value else {
            eprintln!("{}", style("Done ✓").green().bright());
            return Ok(());
        };

        let rendered = match self.format {
            OutputFormat::Json => render_json(value, self.pretty)?,
            OutputFormat::Table => tables::value_table(value).to_string(),
        };
        self.write(&rendered)
    }

    pub fn emit_buckets(&self, buckets: &[BucketInfo]) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Json => render_json(&buckets, self.pretty)?,
            OutputFormat::Table => tables::bucket_stats_table(buckets).to_string(),
        };
        self.write(&rendered)
    }

    pub fn emit_text(&self, text: &str) -> Result<()> {
        self.write(text)
    }

    fn write(&self, rendered: &str) -> Result<()> {
        if let Some(path) = self.path {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output written to: {}", path.display());
        } else {
            println!("{rendered}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_json_compact_and_pretty() {
        let value = json!({"user_id": "alice"});
        assert_eq!(render_json(&value, false).unwrap(), r#"{"user_id":"alice"}"#);
        assert!(render_json(&value, true).unwrap().contains("\n"));
    }

    #[test]
    fn test_emit_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let sink = Sink {
            format: OutputFormat::Json,
            pretty: false,
            path: Some(&path),
        };

        sink.emit(Some(&json!(["photos"]))).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"["photos"]"#);
    }

    #[test]
    fn test_emit_table_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = Sink {
            format: OutputFormat::Table,
            pretty: false,
            path: Some(&path),
        };

        sink.emit(Some(&json!({"bucket": "photos"}))).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Field"));
        assert!(written.contains("photos"));
    }

    #[test]
    fn test_emit_nothing_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let sink = Sink {
            format: OutputFormat::Json,
            pretty: false,
            path: Some(&path),
        };

        sink.emit(None).unwrap();
        assert!(!path.exists());
    }
}

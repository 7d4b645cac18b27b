use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use follow_core::ListEntry;
use url::Url;

use crate::persist::{AtomicFileWriter, PersistError};

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub entry_count: usize,
    pub output_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Renders the plain-text report for one display set.
pub fn build_report(title: &str, generated: &str, entries: &[ListEntry], base: &Url) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title} Report");
    let _ = writeln!(out, "Generated: {generated}");
    let _ = writeln!(out, "Total: {} users", entries.len());
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");

    for entry in entries {
        let _ = writeln!(out, "@{}", entry.handle);
        match entry.profile_url(base) {
            Some(url) => {
                let _ = writeln!(out, "  URL: {url}\n");
            }
            None => {
                let _ = writeln!(out, "  URL: {}{}\n", base, entry.handle);
            }
        }
    }
    out
}

pub fn export_report(
    output_dir: &Path,
    filename: &str,
    title: &str,
    generated: &str,
    entries: &[ListEntry],
    base: &Url,
) -> Result<ExportSummary, ExportError> {
    let content = build_report(title, generated, entries, base);
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let output_path = writer.write(filename, &content)?;
    Ok(ExportSummary {
        entry_count: entries.len(),
        output_path,
    })
}

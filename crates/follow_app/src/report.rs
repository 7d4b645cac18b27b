use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use follow_core::{DisplayTab, ListEntry, RunViewModel};
use follow_engine::export_report;
use url::Url;

use crate::cli::ExportTab;

pub fn report_filename(tab: ExportTab, now: DateTime<Utc>) -> String {
    format!("follow_{}_{}.txt", tab.slug(), now.format("%Y%m%d_%H%M%S"))
}

pub fn export(
    output_dir: &Path,
    tab: ExportTab,
    entries: &[ListEntry],
    base_url: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let base = Url::parse(base_url).with_context(|| format!("invalid base url {base_url}"))?;
    let generated = now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
    let summary = export_report(
        output_dir,
        &report_filename(tab, now),
        tab.tab().title(),
        &generated,
        entries,
        &base,
    )?;
    Ok(summary.output_path)
}

/// Console rendering of a finished run.
pub fn print_summary(view: &RunViewModel, search: &str) {
    println!("{}", view.message);
    println!(
        "Followers: {}  Following: {}  Not following back: {}  Admirers: {}",
        view.followers_count,
        view.following_count,
        view.not_reciprocating.len(),
        view.admirers.len()
    );
    for tab in [DisplayTab::NotReciprocating, DisplayTab::Admirers] {
        let rows = view.rows(tab, search);
        println!();
        println!("{} ({})", tab.title(), rows.len());
        for row in rows {
            let verified = if row.verified { " [verified]" } else { "" };
            match &row.display_name {
                Some(name) => println!("  @{}{} ({})", row.handle, verified, name),
                None => println!("  @{}{}", row.handle, verified),
            }
        }
    }
}

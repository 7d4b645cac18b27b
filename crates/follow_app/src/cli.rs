use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use follow_core::DisplayTab;

/// Audits who you follow against who follows you back.
///
/// Examples:
///   follow_app --handle me                 # analyze @me
///   follow_app --path /me/followers/       # take the handle from a profile path
///   follow_app --show-cached --export admirers
#[derive(Parser, Debug)]
#[command(name = "follow_app")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Handle of the account to analyze
    #[arg(long)]
    pub handle: Option<String>,

    /// Profile URL path the handle is taken from, e.g. /me/ or /me/following/
    #[arg(long)]
    pub path: Option<String>,

    /// Page title used as the last handle source
    #[arg(long)]
    pub title: Option<String>,

    /// Saved profile page markup, searched for the handle and embedded account data
    #[arg(long, value_name = "FILE")]
    pub page_html: Option<PathBuf>,

    /// RON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for the result cache and exported reports
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Print the cached result of the last run instead of starting a new one
    #[arg(long)]
    pub show_cached: bool,

    /// Remove the cached result and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Write a plain-text report of one display set
    #[arg(long, value_enum)]
    pub export: Option<ExportTab>,

    /// Only list handles containing this text (case-insensitive)
    #[arg(long, default_value = "")]
    pub search: String,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTab {
    NotFollowingBack,
    Admirers,
}

impl ExportTab {
    pub fn tab(self) -> DisplayTab {
        match self {
            ExportTab::NotFollowingBack => DisplayTab::NotReciprocating,
            ExportTab::Admirers => DisplayTab::Admirers,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ExportTab::NotFollowingBack => "not_following_back",
            ExportTab::Admirers => "admirers",
        }
    }
}

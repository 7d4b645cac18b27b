mod cli;
mod config;
mod persistence;
mod report;
mod session;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use engine_logging::{engine_info, LogDestination};
use follow_core::RunStatus;
use follow_engine::{EngineHandle, SubjectHint};
use log::LevelFilter;

use cli::Cli;
use config::AppConfig;
use persistence::CachedResult;
use session::Session;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&cli, &config);

    let output_dir = cli.output.clone().unwrap_or_else(|| config.output_dir.clone());

    if cli.clear_cache {
        if persistence::clear_cache(&output_dir)? {
            println!("Cleared cached data in {}", output_dir.display());
        } else {
            println!("No cached data in {}", output_dir.display());
        }
        return Ok(());
    }

    let cached = if cli.show_cached {
        persistence::load_cache(&output_dir)
            .with_context(|| format!("no cached result in {}", output_dir.display()))?
    } else {
        let hint = build_hint(&cli)?;
        let engine = EngineHandle::new(config.engine_config(), config.credentials())?;
        let state = Session::new(engine, config.poll_interval()).run(hint)?;
        if state.status() != RunStatus::Complete {
            bail!("{}", state.message());
        }
        let cached = CachedResult::from_state(&state, Utc::now());
        persistence::save_cache(&output_dir, &cached)?;
        cached
    };

    report::print_summary(&cached.view(), &cli.search);

    if let Some(tab) = cli.export {
        let path = report::export(
            &output_dir,
            tab,
            &cached.entries(tab.tab()),
            &config.base_url,
            Utc::now(),
        )?;
        println!("Exported report to {}", path.display());
    }
    Ok(())
}

fn init_logging(cli: &Cli, config: &AppConfig) {
    let destination =
        LogDestination::parse(&config.log_destination).unwrap_or(LogDestination::Terminal);
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.log_level)
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Info);
    engine_logging::initialize(destination, level, &config.log_file);
    engine_info!("follow_app starting (log level {})", level);
}

fn build_hint(cli: &Cli) -> Result<SubjectHint> {
    let page_html = cli.page_html.as_deref().map(read_page).transpose()?;
    let hint = SubjectHint {
        handle: cli.handle.clone(),
        url_path: cli.path.clone(),
        title: cli.title.clone(),
        page_html,
        documents: Vec::new(),
    };
    if hint.handle.is_none()
        && hint.url_path.is_none()
        && hint.title.is_none()
        && hint.page_html.is_none()
    {
        bail!("nothing to analyze: pass --handle, --path, --title or --page-html");
    }
    Ok(hint)
}

fn read_page(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading page markup {}", path.display()))
}

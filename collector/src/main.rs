//! Interactive vacancy search
//!
//! Asks for a query, fetches vacancies from HeadHunter and SuperJob,
//! saves them to a line-delimited JSON file and filters the saved results.

use anyhow::Context;
use clap::Parser;
use collector::{
    telemetry, AppConfig, FinalFilter, HeadHunterSource, Session, SessionOptions, SuperJobSource,
    VacancySource,
};
use common::JsonLinesStore;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "collector")]
#[command(about = "Search HeadHunter and SuperJob vacancies from the terminal")]
struct Cli {
    /// File the results are saved to (overrides VACANCY_STORE_PATH)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Keep vacancies saved by earlier runs instead of clearing them
    #[arg(long)]
    keep_previous: bool,

    /// How saved vacancies are matched against the final criterion
    #[arg(long, value_enum, default_value_t = FinalFilter::ExactTitle)]
    filter_mode: FinalFilter,

    /// HeadHunter page size
    #[arg(long, default_value_t = 100)]
    per_page: u32,

    /// Also request HeadHunter vacancies without a salary
    #[arg(long)]
    include_unpaid: bool,

    /// Log filter used when RUST_LOG is not set (overrides COLLECTOR_LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.telemetry.log_level = level;
    }
    telemetry::init(&config.telemetry)?;

    if config.superjob_api_key.is_empty() {
        debug!("API_KEY_SUPER_JOB is not set, SuperJob will likely reject requests");
    }

    let headhunter = HeadHunterSource::new(&config.headhunter_url)?
        .with_page(0, cli.per_page)
        .with_only_salary(!cli.include_unpaid);
    let superjob = SuperJobSource::new(&config.superjob_url, config.superjob_api_key.clone())?;

    let store_path = cli.store.unwrap_or(config.store_path);
    info!(path = ?store_path, "using vacancy store");
    let store = JsonLinesStore::new(store_path);

    let options = SessionOptions {
        clear_before_run: !cli.keep_previous,
        final_filter: cli.filter_mode,
    };
    let sources: Vec<&dyn VacancySource> = vec![&headhunter, &superjob];
    let session = Session::new(sources, &headhunter, store, options);

    println!("🔍 Vacancy search across HeadHunter and SuperJob\n");

    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    let summary = session.run(&mut input, &mut output)?;

    info!(
        fetched = ?summary.fetched,
        matches = summary.displayed_matches,
        "done"
    );

    Ok(())
}

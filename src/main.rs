use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{init_tracing, load_config, Config, DatabaseConfig, StoreBackend};
use database::{connect, run_migrations, AlertSink, DbRepository, IndicatorStore, MemoryStore};
use engine::{data_source_status, SyncReport, SyncScheduler};
use risk::{GlobalRiskReport, RiskAssessment, RiskEngine};
use std::path::PathBuf;
use std::sync::Arc;
use web_server::AppState;

/// The main entry point for the econwatch application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(backend) = cli.store {
        config.database.backend = backend;
    }

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(&config.logging)?;

    let stores = open_stores(&config.database).await?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => handle_serve(&config, stores, false).await,
        Commands::Schedule => handle_serve(&config, stores, true).await,
        Commands::Sync => handle_sync(&config, stores).await,
        Commands::Risk(args) => handle_risk(&config, stores, args).await,
        Commands::GlobalRisk(args) => handle_global_risk(&config, stores, args).await,
        Commands::Status => handle_status(stores).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Economic indicator ingestion, threshold alerting and country risk scoring.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `database.backend` from the configuration.
    #[arg(long, global = true, value_enum)]
    store: Option<StoreBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Serve,
    /// Serve the HTTP API and run the daily sync in the background.
    Schedule,
    /// Run one full data sync now and print its summary.
    Sync,
    /// Assess the risk of one country.
    Risk(RiskArgs),
    /// Assess and rank the configured set of countries.
    GlobalRisk(GlobalRiskArgs),
    /// Show what the indicator store holds.
    Status,
}

#[derive(Parser)]
struct RiskArgs {
    /// ISO 3166 alpha-3 country code (e.g., "DEU").
    #[arg(long)]
    country: String,

    /// Last year of the three-year window; defaults to the current year.
    #[arg(long)]
    year: Option<i32>,

    /// Print the assessment as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct GlobalRiskArgs {
    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Wiring
// ==============================================================================

/// Both store roles, served by one backend.
struct Stores {
    indicators: Arc<dyn IndicatorStore>,
    alerts: Arc<dyn AlertSink>,
}

async fn open_stores(config: &DatabaseConfig) -> anyhow::Result<Stores> {
    match config.backend {
        StoreBackend::Postgres => {
            let pool = connect(config).await?;
            run_migrations(&pool).await?;
            let repo = Arc::new(DbRepository::new(pool));
            Ok(Stores { indicators: repo.clone(), alerts: repo })
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; nothing will be persisted.");
            let store = Arc::new(MemoryStore::new());
            Ok(Stores { indicators: store.clone(), alerts: store })
        }
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_serve(config: &Config, stores: Stores, with_schedule: bool) -> anyhow::Result<()> {
    let scheduler = Arc::new(SyncScheduler::from_config(
        config,
        stores.indicators.clone(),
        stores.alerts.clone(),
    )?);

    if with_schedule {
        tokio::spawn(Arc::clone(&scheduler).run_daily());
    }

    let state = Arc::new(AppState {
        store: stores.indicators,
        alerts: stores.alerts,
        risk: Arc::new(RiskEngine::new(config.risk.thresholds.clone())),
        risk_countries: config.risk.countries.clone(),
        scheduler: Some(scheduler),
    });
    web_server::run_server(config.server.bind_address, state).await
}

async fn handle_sync(config: &Config, stores: Stores) -> anyhow::Result<()> {
    let scheduler = SyncScheduler::from_config(config, stores.indicators, stores.alerts)?;
    println!("Starting sync for sources: {}", scheduler.source_names().join(", "));

    let report = scheduler.run_sync().await;
    println!("{}", sync_table(&report));

    if !report.all_succeeded() {
        anyhow::bail!("one or more sources failed to synchronize");
    }
    Ok(())
}

async fn handle_risk(config: &Config, stores: Stores, args: RiskArgs) -> anyhow::Result<()> {
    let engine = RiskEngine::new(config.risk.thresholds.clone());
    let year = args.year.unwrap_or_else(current_year);
    let assessment = engine
        .analyze_country_risk(stores.indicators.as_ref(), &args.country, year)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        println!("{}", assessment_table(&assessment));
        for recommendation in &assessment.recommendations {
            println!("- {}", recommendation);
        }
    }
    Ok(())
}

async fn handle_global_risk(
    config: &Config,
    stores: Stores,
    args: GlobalRiskArgs,
) -> anyhow::Result<()> {
    let engine = RiskEngine::new(config.risk.thresholds.clone());
    let year = args.year.unwrap_or_else(current_year);
    let report = engine
        .detect_global_risks(stores.indicators.as_ref(), &config.risk.countries, year)
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", global_table(&report));
        println!(
            "Global level: {} (average {}), highest: {}, lowest: {}",
            report.global_level,
            report.average_score,
            report.highest_risk.as_deref().unwrap_or("-"),
            report.lowest_risk.as_deref().unwrap_or("-"),
        );
        for failure in &report.failures {
            eprintln!("Could not assess {}: {}", failure.country_code, failure.error);
        }
    }
    Ok(())
}

async fn handle_status(stores: Stores) -> anyhow::Result<()> {
    let status = data_source_status(stores.indicators.as_ref()).await?;
    println!("Total records: {}", status.total_records);

    let mut sources = Table::new();
    sources
        .load_preset(UTF8_FULL)
        .set_header(vec!["Source", "Records", "Latest update", "Categories"]);
    for s in &status.sources {
        sources.add_row(vec![
            s.source.to_string(),
            s.count.to_string(),
            s.latest_update.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string()),
            s.categories.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", "),
        ]);
    }
    println!("{sources}");

    let mut years = Table::new();
    years.load_preset(UTF8_FULL).set_header(vec!["Year", "Records"]);
    for y in &status.years {
        years.add_row(vec![y.year.to_string(), y.count.to_string()]);
    }
    println!("{years}");
    Ok(())
}

// ==============================================================================
// Table Rendering
// ==============================================================================

fn sync_table(report: &SyncReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Source", "OK", "Fetched", "Written", "Unchanged", "Skipped", "Alerts", "Error",
    ]);
    for s in &report.sources {
        table.add_row(vec![
            s.source.clone(),
            if s.success { "yes".to_string() } else { "no".to_string() },
            s.records_fetched.to_string(),
            s.written.to_string(),
            s.unchanged.to_string(),
            s.skipped.to_string(),
            s.alerts_raised.to_string(),
            s.error.clone().unwrap_or_default(),
        ]);
    }
    table
}

fn assessment_table(assessment: &RiskAssessment) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Indicator", "Code", "Year", "Value", "Level", "Score"]);
    for (family, factor) in &assessment.risk_factors {
        table.add_row(vec![
            family.key().to_string(),
            factor.indicator_code.clone(),
            factor.year.to_string(),
            factor.value.to_string(),
            factor.level.to_string(),
            factor.score.to_string(),
        ]);
    }
    table.add_row(vec![
        "overall".to_string(),
        String::new(),
        assessment.year.to_string(),
        String::new(),
        assessment.overall_risk.level.to_string(),
        assessment.overall_risk.score.to_string(),
    ]);
    table.add_row(vec![
        "alert level".to_string(),
        String::new(),
        String::new(),
        String::new(),
        assessment.alert_level.to_string(),
        String::new(),
    ]);
    table
}

fn global_table(report: &GlobalRiskReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Rank", "Country", "Score", "Level", "Alert", "Factors"]);
    for (rank, a) in report.assessments.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            a.country_code.clone(),
            a.overall_risk.score.to_string(),
            a.overall_risk.level.to_string(),
            a.alert_level.to_string(),
            a.risk_factors.len().to_string(),
        ]);
    }
    table
}

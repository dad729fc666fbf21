use bmi_core::*;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bmi")]
#[command(about = "BMI calculator with optional anonymous research submission", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate BMI, store the result and submit it (with consent)
    Calc {
        /// Height in centimetres (50-250)
        #[arg(long)]
        height: f64,

        /// Weight in kilograms (30-200)
        #[arg(long)]
        weight: f64,

        /// Do not submit anonymous data
        #[arg(long)]
        no_consent: bool,

        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the last calculation and recommendations
    Show {
        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear the stored calculation to start a new assessment
    Reset,

    /// Retry submissions saved locally
    Sync,

    /// Inspect or clear the local retry queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },

    /// Send a tagged test submission and print the direct URL
    TestSubmit {
        #[arg(long, default_value_t = 170.0)]
        height: f64,

        #[arg(long, default_value_t = 65.0)]
        weight: f64,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// List pending submissions
    List,
    /// Remove all pending submissions
    Clear,
    /// Write pending submissions to a CSV file
    Export {
        #[arg(long)]
        output: PathBuf,
    },
}

/// Session-scoped and durable stores under the data directory
struct Stores {
    session: FileStore,
    durable: Arc<FileStore>,
}

impl Stores {
    fn open(data_dir: &Path) -> Self {
        Self {
            session: FileStore::new(data_dir.join("session")),
            durable: Arc::new(FileStore::new(data_dir.join("local"))),
        }
    }

    fn pipeline(&self, config: &Config) -> Result<SubmissionPipeline> {
        SubmissionPipeline::http(config.submission.clone(), self.durable.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    bmi_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let errors = validate_tables();
    if !errors.is_empty() {
        eprintln!("Category table errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Config("Invalid category tables".into()));
    }

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let stores = Stores::open(&data_dir);

    match cli.command {
        Commands::Calc {
            height,
            weight,
            no_consent,
            json,
        } => cmd_calc(&stores, &config, height, weight, !no_consent, json).await,
        Commands::Show { json } => cmd_show(&stores, &config, json).await,
        Commands::Reset => cmd_reset(&stores),
        Commands::Sync => cmd_sync(&stores, &config).await,
        Commands::Queue { action } => cmd_queue(&stores, &config, action),
        Commands::TestSubmit { height, weight } => {
            cmd_test_submit(&stores, &config, height, weight).await
        }
    }
}

async fn cmd_calc(
    stores: &Stores,
    config: &Config,
    height: f64,
    weight: f64,
    consent: bool,
    json: bool,
) -> Result<()> {
    let measurement = Measurement::new(height, weight)?;
    let now = Utc::now();
    let record =
        UserRecord::new(&measurement, consent, now)?.with_time_estimate(config.goal.target_bmi);

    if !save_user_data(&stores.session, &record, now) {
        eprintln!("Warning: result could not be saved for `bmi show`");
    }

    let status = if consent {
        let pipeline = stores.pipeline(config)?;
        if config.submission.sync_on_start {
            pipeline.sync_pending().await;
        }
        let outcome = pipeline.submit(&record).await;
        SubmissionStatus::from_outcome(&outcome)
    } else {
        SubmissionStatus::opted_out()
    };

    if json {
        print_json(&record, Some(&status))?;
    } else {
        display_result(&record, config);
        display_status(&status);
    }
    Ok(())
}

async fn cmd_show(stores: &Stores, config: &Config, json: bool) -> Result<()> {
    let Some(record) = get_user_data(&stores.session) else {
        return Err(Error::Other(
            "No calculation found. Run `bmi calc` first.".into(),
        ));
    };

    let record = if record.time_estimate.is_none() {
        record.with_time_estimate(config.goal.target_bmi)
    } else {
        record
    };

    // Retry anything left over from earlier runs, as the result view did
    if record.consent && config.submission.sync_on_start {
        let pipeline = stores.pipeline(config)?;
        let pending = pipeline.pending().len();
        if pending > 0 {
            tracing::info!("Found {} pending submissions, attempting sync", pending);
            pipeline.sync_pending().await;
        }
    }

    if json {
        print_json(&record, None)?;
    } else {
        display_result(&record, config);
        display_recommendations(&record);
    }
    Ok(())
}

fn cmd_reset(stores: &Stores) -> Result<()> {
    clear_user_data(&stores.session, stores.durable.as_ref());
    println!("✓ Data cleared. Ready for a new assessment.");
    Ok(())
}

async fn cmd_sync(stores: &Stores, config: &Config) -> Result<()> {
    if !config.submission.is_configured() {
        println!("Submission endpoint not configured - nothing to sync.");
        return Ok(());
    }

    let pipeline = stores.pipeline(config)?;
    let report = pipeline.sync_pending().await;

    println!("✓ Synced {} pending submissions", report.delivered);
    if report.retained > 0 {
        println!("  {} will be retried later", report.retained);
    }
    if report.dropped > 0 {
        println!("  {} dropped after too many attempts", report.dropped);
    }
    Ok(())
}

fn cmd_queue(stores: &Stores, config: &Config, action: QueueAction) -> Result<()> {
    let pipeline = stores.pipeline(config)?;

    match action {
        QueueAction::List => {
            let pending = pipeline.pending();
            if pending.is_empty() {
                println!("No pending submissions.");
                return Ok(());
            }

            println!("{} submissions pending synchronization:", pending.len());
            for entry in &pending {
                println!(
                    "  {}  saved {}  attempts {}  BMI {} ({})",
                    entry.id,
                    entry.saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    entry.attempts,
                    entry.payload.bmi,
                    entry.payload.category
                );
            }
        }
        QueueAction::Clear => {
            pipeline.clear_pending()?;
            println!("✓ All pending submissions cleared");
        }
        QueueAction::Export { output } => {
            let count = export_pending_csv(&pipeline.pending(), &output)?;
            println!("✓ Exported {} pending submissions", count);
            println!("  CSV: {}", output.display());
        }
    }
    Ok(())
}

async fn cmd_test_submit(stores: &Stores, config: &Config, height: f64, weight: f64) -> Result<()> {
    let pipeline = stores.pipeline(config)?;
    let test = pipeline.test_submission(height, weight).await?;

    println!("Direct test URL: {}", test.url);
    let status = SubmissionStatus::from_outcome(&test.outcome);
    if status.success {
        println!("Result: ✓ Success");
    } else {
        println!("Result: ✗ Failed ({})", status.message);
    }
    Ok(())
}

fn print_json(record: &UserRecord, status: Option<&SubmissionStatus>) -> Result<()> {
    let mut value = serde_json::json!({ "record": record });
    if let Some(status) = status {
        value["submission"] = serde_json::json!({
            "success": status.success,
            "message": status.message,
        });
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn display_result(record: &UserRecord, config: &Config) {
    let result = &record.result;
    let def = category_definition(result.category);
    let ideal = &result.ideal_weight_range;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  BMI {:.1} kg/m²  ({})", result.bmi, def.name);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", def.description);
    println!();
    println!("  Height: {} cm   Weight: {} kg", record.height_cm, record.weight_kg);
    println!(
        "  Calculated: {}",
        record.calculated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!();
    println!(
        "  Deviation: {}{}",
        if result.deviation > 0.0 { "+" } else { "" },
        result.deviation
    );
    println!("  Percentile: {}%", result.percentile);
    println!("  Risk level: {}", def.risk_level);
    println!("  {}", comparison_text(result.deviation));
    println!();
    println!("  Ideal weight: {} kg - {} kg (target {} kg)", ideal.min, ideal.max, ideal.target);

    if let Some(estimate) = &record.time_estimate {
        println!();
        println!(
            "  Weight change needed: {} kg ({})",
            estimate.weight_change_kg, estimate.direction
        );
        println!(
            "  Estimated time: {} weeks (≈{} months)",
            estimate.weeks, estimate.months
        );
        println!("  Target BMI: {:.1}", config.goal.target_bmi);
        println!("  Progress: {}%", result.progress_percentage);
    }
    println!();
}

fn display_recommendations(record: &UserRecord) {
    let def = category_definition(record.result.category);

    println!("─────────────────────────────────────────");
    println!("  Direction: {}", def.direction.summary());
    println!("  Focus: {}", def.focus);
    if let Some(estimate) = &record.time_estimate {
        println!("  Time frame: {} weeks", estimate.weeks);
    }
    println!();
}

fn display_status(status: &SubmissionStatus) {
    println!("─────────────────────────────────────────");
    if status.success {
        println!("✓ {}", status.message);
    } else {
        println!("! {}", status.message);
    }
}

// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use example_audit::classifier::{CategoryClassifier, LayeredClassifier, OllamaClassifier};
use example_audit::source::AstDirectorySource;
use example_audit::store::{ExampleStore, JsonFileStore};
use example_audit::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning,
};
use example_audit::{Config, JsonReportWriter, ProgressTracker, ReconciliationDriver, RunReport};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "example-audit")]
#[command(version = "0.1.0")]
#[command(about = "Audit trail for code examples in documentation pages", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile source pages against the stored examples
    Reconcile {
        /// Projects to reconcile. Every project in the AST directory when empty.
        projects: Vec<String>,

        /// Directory for the JSON run report
        #[arg(long, value_name = "DIR")]
        report: Option<PathBuf>,

        /// Use rule heuristics only, even if the LLM fallback is configured
        #[arg(long)]
        no_llm: bool,

        #[arg(long, value_name = "DIR", env = "EXAMPLE_AUDIT_AST_DIR")]
        ast_dir: Option<PathBuf>,

        #[arg(long, value_name = "DIR", env = "EXAMPLE_AUDIT_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Active and removed example counts per stored page
    Stats {
        project: String,

        #[arg(long, value_name = "DIR", env = "EXAMPLE_AUDIT_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Print the stored examples of one page
    Show {
        project: String,

        page_id: String,

        /// Include examples removed from the page
        #[arg(long)]
        all: bool,

        #[arg(long, value_name = "DIR", env = "EXAMPLE_AUDIT_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    example_audit::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Loading configuration from: {}", cli.config.display());

    let mut config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::default_config()
    };

    match cli.command {
        Commands::Reconcile {
            projects,
            report,
            no_llm,
            ast_dir,
            data_dir,
        } => {
            if let Some(ast_dir) = ast_dir {
                config.source.ast_dir = ast_dir;
            }
            if let Some(data_dir) = data_dir {
                config.store.data_dir = data_dir;
            }
            if no_llm {
                config.classifier.llm_enabled = false;
            }
            cmd_reconcile(&config, &projects, report, cli.color).await?;
        }
        Commands::Stats { project, data_dir } => {
            if let Some(data_dir) = data_dir {
                config.store.data_dir = data_dir;
            }
            cmd_stats(&config, &project).await?;
        }
        Commands::Show {
            project,
            page_id,
            all,
            data_dir,
        } => {
            if let Some(data_dir) = data_dir {
                config.store.data_dir = data_dir;
            }
            cmd_show(&config, &project, &page_id, all).await?;
        }
    }

    Ok(())
}

fn build_classifier(config: &Config) -> Result<Arc<dyn CategoryClassifier>> {
    let fallback: Option<Arc<dyn CategoryClassifier>> = if config.classifier.llm_enabled {
        info!(
            "LLM fallback enabled: {} at {}",
            config.classifier.model, config.classifier.ollama_url
        );
        Some(Arc::new(
            OllamaClassifier::from_config(&config.classifier)
                .context("Failed to create Ollama client")?,
        ))
    } else {
        info!("LLM fallback disabled, undecided examples stay uncategorized");
        None
    };

    Ok(Arc::new(LayeredClassifier::new(
        fallback,
        config.pipeline.classifier_concurrency,
    )))
}

async fn open_store(config: &Config) -> Result<Arc<dyn ExampleStore>> {
    let store = JsonFileStore::new(&config.store.data_dir)
        .await
        .with_context(|| format!("Failed to open store at {}", config.store.data_dir.display()))?;
    Ok(Arc::new(store))
}

async fn cmd_reconcile(
    config: &Config,
    projects: &[String],
    report_dir: Option<PathBuf>,
    colored: bool,
) -> Result<()> {
    let start_time = Instant::now();

    println!("{}", format_step(1, 3, "Preparing source, store and classifier"));
    let source = Arc::new(AstDirectorySource::new(&config.source.ast_dir));
    let store = open_store(config).await?;
    let classifier = build_classifier(config)?;

    println!("{}", format_step(2, 3, "Reconciling pages"));
    let progress = Arc::new(ProgressTracker::with_color(0, colored));
    let driver = ReconciliationDriver::new(config, source, store, classifier).with_progress(progress);
    let report = driver
        .run(projects)
        .await
        .context("Reconciliation run failed")?;

    println!("{}", format_step(3, 3, "Writing report"));
    if let Some(dir) = report_dir {
        let writer = JsonReportWriter::new(dir).context("Failed to create report directory")?;
        let path = writer.write(&report).context("Failed to write run report")?;
        println!("{}", format_info(&format!("Report written to {}", path.display())));
    }

    print_summary(&report);
    info!(
        "Reconciliation complete in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

fn print_summary(report: &RunReport) {
    for project in &report.projects {
        let counters = &project.counters;
        println!(
            "{}",
            format_info(&format!(
                "{}: {} pages ({} created, {} updated, {} removed), examples {} new / {} updated / {} removed",
                project.project,
                counters.pages_after,
                counters.pages_created,
                counters.pages_updated,
                counters.pages_removed,
                counters.examples_new,
                counters.examples_updated,
                counters.examples_removed
            ))
        );
        for change in &project.changes {
            println!("    {}", change);
        }
    }

    let issues: Vec<_> = report.issues().collect();
    if issues.is_empty() {
        println!("{}", format_success("No issues found"));
    } else {
        println!(
            "{}",
            format_warning(&format!("{} issues need attention", issues.len()))
        );
        for issue in issues {
            println!("    {}", format_error(&issue.to_string()));
        }
    }
}

async fn cmd_stats(config: &Config, project: &str) -> Result<()> {
    let store = open_store(config).await?;
    let source = Arc::new(AstDirectorySource::new(&config.source.ast_dir));
    let classifier: Arc<dyn CategoryClassifier> = Arc::new(LayeredClassifier::rules_only());
    let driver = ReconciliationDriver::new(config, source, store, classifier);

    let stats = driver
        .page_stats(project)
        .await
        .with_context(|| format!("Failed to read stored pages for {}", project))?;

    if stats.is_empty() {
        println!("{}", format_warning(&format!("No stored pages for {}", project)));
        return Ok(());
    }

    let (mut active, mut removed) = (0, 0);
    for page in &stats {
        println!("{:<70} {:>6} {:>6}", page.page_id, page.active, page.removed);
        active += page.active;
        removed += page.removed;
    }
    println!(
        "{}",
        format_success(&format!(
            "{} pages, {} active examples, {} removed examples",
            stats.len(),
            active,
            removed
        ))
    );
    Ok(())
}

async fn cmd_show(config: &Config, project: &str, page_id: &str, all: bool) -> Result<()> {
    let store = open_store(config).await?;
    let Some(examples) = store
        .get(project, page_id)
        .await
        .with_context(|| format!("Failed to read page {}", page_id))?
    else {
        println!("{}", format_warning(&format!("Page {} is not stored", page_id)));
        return Ok(());
    };

    let shown: Vec<_> = examples
        .into_iter()
        .filter(|example| all || !example.is_removed())
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&shown).context("Failed to serialize examples")?
    );
    Ok(())
}

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use scholar_clip::config::{config_dir, find_config_file, load_settings, Settings};
use scholar_clip::pipeline::{Destination, SaveMode, SaveOutcome, SavePipeline};
use scholar_clip::ui::{self, Spinner, Status};
use scholar_clip::FetchedPage;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Clip - Save academic papers into Notion with metadata and an AI summary
#[derive(Parser, Debug)]
#[command(name = "scholar-clip")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Save academic papers (HTML or PDF) into a Notion database", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

/// Log line format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save the paper at URL into the Notion database
    #[command(alias = "s")]
    Save {
        /// Page URL (HTML landing page or PDF)
        url: String,

        /// Print the Notion payload instead of creating the page
        #[arg(long, short = 'n')]
        dry_run: bool,
    },

    /// Show the resolved record for URL without summarizing or saving it
    #[command(alias = "i")]
    Inspect {
        /// Page URL
        url: String,
    },

    /// Extract the text of a PDF through the sidecar
    PdfText {
        /// PDF URL
        url: String,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective settings with secrets masked
    Show,

    /// Print the config file path in use
    Path,
}

fn init_logging(verbose: u8, quiet: bool, format: Option<LogFormat>, settings: &Settings) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => settings.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scholar_clip={}", level)),
    );

    let json = match format {
        Some(format) => format == LogFormat::Json,
        None => settings.logging.format.as_deref() == Some("json"),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

/// Path `config init` writes to and `config path` reports
fn target_config_path(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    explicit
        .cloned()
        .or_else(find_config_file)
        .or_else(|| config_dir().map(|dir| dir.join("config.toml")))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "scholar-clip", &mut std::io::stdout());
        return Ok(());
    }

    let settings = load_settings(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(cli.verbose, cli.quiet, cli.log_format, &settings);

    match cli.command {
        Commands::Save { url, dry_run } => {
            let pipeline = SavePipeline::new(settings)?;
            let page = FetchedPage::new(pipeline.client().clone(), url);
            let mode = if dry_run {
                SaveMode::DryRun
            } else {
                SaveMode::Create
            };

            let spinner = (!cli.quiet).then(|| Spinner::new("Saving paper..."));
            let result = pipeline.save(&page, mode).await;
            if let Some(spinner) = &spinner {
                spinner.finish();
            }

            if let Ok(report) = &result {
                if let Destination::DryRun(payload) = &report.destination {
                    println!("{}", serde_json::to_string_pretty(payload)?);
                }
            }
            if let Err(e) = &result {
                tracing::debug!("Save failed: {:?}", e);
            }

            let outcome = SaveOutcome::from_result(&result);
            ui::print_outcome(&outcome);
            if !outcome.success {
                std::process::exit(1);
            }
        }

        Commands::Inspect { url } => {
            let pipeline = SavePipeline::new(settings)?;
            let page = FetchedPage::new(pipeline.client().clone(), url);
            let record = pipeline.inspect(&page).await?;

            if ui::is_terminal() && !cli.quiet {
                ui::print_section("Record");
                ui::print_record(&record);
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }

        Commands::PdfText { url } => {
            let pipeline = SavePipeline::new(settings)?;
            let response = pipeline.sidecar().extract(&url).await;
            match response.text {
                Some(text) => println!("{}", text),
                None => {
                    let message = response
                        .error
                        .unwrap_or_else(|| "No text extracted".to_string());
                    ui::print_status(Status::Error, &message);
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Init { force } => {
                let path = target_config_path(cli.config.as_ref())
                    .context("Could not determine a config directory")?;
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Settings::default().save(&path)?;
                ui::print_status(
                    Status::Success,
                    &format!("Wrote default config to {}", path.display()),
                );
            }
            ConfigCommands::Show => {
                println!("{}", toml::to_string_pretty(&settings.redacted())?);
            }
            ConfigCommands::Path => match target_config_path(cli.config.as_ref()) {
                Some(path) => println!("{}", path.display()),
                None => ui::print_status(Status::Warning, "No config directory available"),
            },
        },

        Commands::Completions { .. } => {}
    }

    Ok(())
}

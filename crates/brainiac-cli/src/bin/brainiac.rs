use anyhow::{Context, Result};
use brainiac_ai::{LLMProviderFactory, MetadataGenerator, PromptSet};
use brainiac_cli::Orchestrator;
use brainiac_core::{BrainiacConfig, BrainiacError, ConfigManager};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, Registry};

#[derive(Parser)]
#[command(
    name = "brainiac",
    version,
    author,
    about = "Brainiac - generate and aggregate article metadata",
    long_about = "Brainiac reads an article, asks a language model for its title, description, keywords, genre and related articles, records the result in the metadata store and copies the article next to it."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        about = "Generate metadata for an article and copy it to the output directory",
        visible_alias = "copy-async"
    )]
    Copy {
        #[arg(help = "Path to the source article")]
        src: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConfigManager::load(cli.config.as_deref())
        .map_err(BrainiacError::from)?
        .into_config();

    init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Copy { src } => handle_copy(&config, src).await,
    }
}

async fn handle_copy(config: &BrainiacConfig, src: PathBuf) -> Result<()> {
    let provider = LLMProviderFactory::create_from_config(config)
        .context("Failed to create LLM provider")?;
    debug!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        "LLM provider ready"
    );

    let prompts = PromptSet::from_config(&config.prompts)?;
    let generator = MetadataGenerator::new(provider, prompts);
    let orchestrator = Orchestrator::new(generator, config)?;

    let record = orchestrator.run(&src).await?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Logs go to stderr; stdout carries only the generated record
fn init_tracing(config: &BrainiacConfig, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match config.logging.format.as_str() {
        "json" => {
            let subscriber = Registry::default()
                .with(env_filter)
                .with(fmt_layer.json());
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        "compact" => {
            let subscriber = Registry::default()
                .with(env_filter)
                .with(fmt_layer.compact());
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        _ => {
            let subscriber = Registry::default().with(env_filter).with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<BrainiacError>() {
        Some(e) if e.is_user_error() => 2,
        _ => 1,
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use topicsmith::completion::OpenAiCompletion;
use topicsmith::config::{self, Config, ConfigFile, Overrides};
use topicsmith::errors::PipelineError;
use topicsmith::pipeline::interject::StdinOperator;
use topicsmith::pipeline::stage::Stage;
use topicsmith::pipeline::StrategyPipeline;
use topicsmith::roles;
use topicsmith::ui::console_ui::print_run_complete;
use topicsmith::ui::{ConsoleRenderer, Renderer};

#[derive(Parser)]
#[command(name = "topicsmith")]
#[command(version, about = "Multi-agent content topic strategy generator")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Directory for generated strategy documents
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Model name override (also settable via MODEL_NAME)
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a topic strategy for a business scenario
    Run {
        /// The business scenario; prompted interactively when omitted
        scenario: Option<String>,
    },
    /// List the pipeline roles and their tools
    Roles,
    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Initialize a default topicsmith.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "topicsmith=debug"
        } else {
            "topicsmith=info"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Run { scenario } => cmd_run(&cli, &project_dir, scenario.clone()).await?,
        Commands::Roles => cmd_roles(),
        Commands::Config { command } => cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}

async fn cmd_run(cli: &Cli, project_dir: &PathBuf, scenario: Option<String>) -> Result<()> {
    let overrides = Overrides {
        model: cli.model.clone(),
        output_dir: cli.output_dir.clone(),
        verbose: cli.verbose,
    };
    let config = Config::load(project_dir, overrides)?;
    config.ensure_output_dir()?;

    let scenario = match scenario {
        Some(s) => s,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Describe the business scenario")
            .interact_text()
            .context("Failed to read scenario")?,
    };

    let renderer = Arc::new(ConsoleRenderer::new(Stage::ALL.len() as u64, config.verbose));
    let dyn_renderer: Arc<dyn Renderer> = renderer.clone();
    let service = Arc::new(OpenAiCompletion::new(&config));
    let mut pipeline = StrategyPipeline::new(config, service, dyn_renderer, Box::new(StdinOperator));

    let outcome = tokio::select! {
        result = pipeline.run(&scenario) => result,
        _ = tokio::signal::ctrl_c() => Err(PipelineError::Cancelled),
    };
    renderer.finish();

    match outcome {
        Ok(outcome) => {
            print_run_complete(&outcome.saved_to.display().to_string());
            Ok(())
        }
        Err(PipelineError::Cancelled) => {
            eprintln!("\n{}", style("Run cancelled; no document was written.").yellow());
            std::process::exit(130);
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_roles() {
    for role in roles::all_roles() {
        println!("{}", style(role.name).cyan().bold());
        if role.tools.is_empty() {
            println!("  tools: none");
        } else {
            println!("  tools: {}", role.tools.join(", "));
        }
        if let Some(first_line) = role.system_prompt.lines().next() {
            println!("  {}", style(first_line).dim());
        }
        println!();
    }
}

fn cmd_config(project_dir: &PathBuf, command: Option<ConfigCommands>) -> Result<()> {
    match command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => {
            let file = ConfigFile::load(project_dir)?;
            println!("{}", style("Configuration").bold());
            println!(
                "  base_url:   {}",
                file.base_url.as_deref().unwrap_or(config::DEFAULT_BASE_URL)
            );
            println!(
                "  model:      {}",
                file.model.as_deref().unwrap_or(config::DEFAULT_MODEL)
            );
            println!(
                "  output_dir: {}",
                file.output_dir
                    .as_deref()
                    .unwrap_or(std::path::Path::new(config::DEFAULT_OUTPUT_DIR))
                    .display()
            );
            let key_state = if std::env::var("OPENAI_API_KEY")
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false)
            {
                style("set").green()
            } else {
                style("not set").red()
            };
            println!("  OPENAI_API_KEY: {key_state}");
        }
        ConfigCommands::Init => {
            let path = project_dir.join(config::CONFIG_FILE);
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            std::fs::write(&path, config::starter_config())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Created {}", path.display());
        }
    }
    Ok(())
}

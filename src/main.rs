use aiven_provider::api::AivenClient;
use aiven_provider::config::{ProviderConfig, Settings};
use aiven_provider::engine::{DesiredConfig, Engine, PlannedChange, StateFile, DEFAULT_PARALLELISM};
use aiven_provider::provider::plan::Action;
use aiven_provider::provider::{Diagnostics, Provider};
use aiven_provider::sweep::sweep_kafka_topics;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Declarative provider for Aiven
#[derive(Parser, Debug)]
#[command(name = "aiven-provider", version = aiven_provider::VERSION, about, long_about = None)]
struct Args {
    /// Aiven API token
    #[arg(long, env = "AIVEN_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Aiven web or API URL
    #[arg(long, env = "AIVEN_WEB_URL", global = true)]
    api_url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print resource schemas as JSON
    Schema {
        /// Only this resource type
        resource_type: Option<String>,
    },
    /// Refresh, then show the planned changes
    Plan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "aiven.state.json")]
        state: PathBuf,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Refresh, plan and execute the changes
    Apply {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "aiven.state.json")]
        state: PathBuf,
        /// Maximum number of concurrent operations
        #[arg(long, default_value_t = DEFAULT_PARALLELISM)]
        parallelism: usize,
    },
    /// Read every recorded resource and drop the ones that are gone
    Refresh {
        #[arg(short, long, default_value = "aiven.state.json")]
        state: PathBuf,
    },
    /// Adopt an existing remote resource into the state
    Import {
        resource_type: String,
        address: String,
        id: String,
        #[arg(short, long, default_value = "aiven.state.json")]
        state: PathBuf,
    },
    /// Delete every recorded resource
    Destroy {
        #[arg(short, long, default_value = "aiven.state.json")]
        state: PathBuf,
        #[arg(long, default_value_t = DEFAULT_PARALLELISM)]
        parallelism: usize,
    },
    /// Delete every Kafka topic in every Kafka service of a project
    Sweep {
        #[arg(long, env = "AIVEN_PROJECT_NAME")]
        project: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(tracing_level).into())
                .from_env_lossy(),
        )
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("aiven-provider started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("aiven-provider").join("aiven-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".aiven-provider").join("aiven-provider.log");
    }
    PathBuf::from("aiven-provider.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    if let Command::Schema { resource_type } = &args.command {
        return print_schema(resource_type.as_deref());
    }

    let cli = ProviderConfig {
        api_token: args.token.clone(),
        api_url: args.api_url.clone(),
        project: match &args.command {
            Command::Sweep { project } => project.clone(),
            _ => None,
        },
    };
    let settings = cli.or(ProviderConfig::load()).into_settings()?;
    let client = AivenClient::new(&settings.api_token, &settings.api_url)
        .context("cannot build API client")?;

    tracing::info!("Using API endpoint: {}", settings.api_url);

    match args.command {
        Command::Schema { .. } => Ok(()),
        Command::Plan { config, state, json } => plan(client, &config, &state, json).await,
        Command::Apply {
            config,
            state,
            parallelism,
        } => apply(client, &config, &state, parallelism).await,
        Command::Refresh { state } => refresh(client, &state).await,
        Command::Import {
            resource_type,
            address,
            id,
            state,
        } => import(client, &resource_type, &address, &id, &state).await,
        Command::Destroy { state, parallelism } => destroy(client, &state, parallelism).await,
        Command::Sweep { .. } => sweep(client, &settings).await,
    }
}

fn print_schema(resource_type: Option<&str>) -> Result<()> {
    let provider = Provider::new();
    let output = match resource_type {
        Some(name) => {
            let def = provider
                .resource(name)
                .ok_or_else(|| anyhow!("unsupported resource type `{}`", name))?;
            serde_json::to_string_pretty(def.schema.as_ref())?
        },
        None => serde_json::to_string_pretty(&provider.schemas())?,
    };
    println!("{}", output);
    Ok(())
}

/// Print diagnostics and turn errors into a failure
fn report(diagnostics: &Diagnostics) -> Result<()> {
    if !diagnostics.is_empty() {
        eprintln!("{}", diagnostics);
    }
    if diagnostics.has_error() {
        bail!("{} problem(s) reported", diagnostics.iter().count());
    }
    Ok(())
}

fn print_plan(changes: &[PlannedChange]) {
    let mut pending = 0;
    for change in changes.iter().filter(|c| c.plan.action != Action::NoOp) {
        pending += 1;
        println!("{} {} ({})", change.plan.action, change.address, change.type_name);
        for attribute in &change.plan.changes {
            let old = attribute.old.as_ref().map(|v| v.to_string()).unwrap_or_default();
            let new = attribute.new.as_ref().map(|v| v.to_string()).unwrap_or_default();
            let marker = if attribute.forces_replacement { " # forces replacement" } else { "" };
            println!("    {}: {} -> {}{}", attribute.name, old, new, marker);
        }
    }
    if pending == 0 {
        println!("No changes.");
    }
}

async fn plan(client: AivenClient, config: &Path, state_path: &Path, json: bool) -> Result<()> {
    let desired = DesiredConfig::load(config)?;
    let mut state = StateFile::load(state_path)?;
    let engine = Engine::new(Provider::new(), client);

    report(&engine.refresh(&mut state).await)?;
    let changes = engine.plan(&desired, &state).map_err(|diags| {
        eprintln!("{}", diags);
        anyhow!("invalid configuration")
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else {
        print_plan(&changes);
    }
    Ok(())
}

async fn apply(client: AivenClient, config: &Path, state_path: &Path, parallelism: usize) -> Result<()> {
    let desired = DesiredConfig::load(config)?;
    let mut state = StateFile::load(state_path)?;
    let engine = Engine::new(Provider::new(), client).with_parallelism(parallelism);

    let refreshed = engine.refresh(&mut state).await;
    let applied = if refreshed.has_error() {
        refreshed
    } else {
        let mut diagnostics = refreshed;
        diagnostics.extend(engine.apply(&desired, &mut state).await);
        diagnostics
    };

    state.save(state_path)?;
    report(&applied)?;
    println!("Apply complete: {} resource(s) in state.", state.resources.len());
    Ok(())
}

async fn refresh(client: AivenClient, state_path: &Path) -> Result<()> {
    let mut state = StateFile::load(state_path)?;
    let engine = Engine::new(Provider::new(), client);

    let diagnostics = engine.refresh(&mut state).await;
    state.save(state_path)?;
    report(&diagnostics)
}

async fn import(client: AivenClient, resource_type: &str, address: &str, id: &str, state_path: &Path) -> Result<()> {
    let mut state = StateFile::load(state_path)?;
    let engine = Engine::new(Provider::new(), client);

    report(&engine.import(resource_type, address, id, &mut state).await)?;
    state.save(state_path)?;
    println!("Imported {} as {}.", id, address);
    Ok(())
}

async fn destroy(client: AivenClient, state_path: &Path, parallelism: usize) -> Result<()> {
    let mut state = StateFile::load(state_path)?;
    let engine = Engine::new(Provider::new(), client).with_parallelism(parallelism);

    let diagnostics = engine.destroy(&mut state).await;
    state.save(state_path)?;
    report(&diagnostics)?;
    println!("Destroy complete.");
    Ok(())
}

async fn sweep(client: AivenClient, settings: &Settings) -> Result<()> {
    let Some(project) = settings.project.as_deref() else {
        bail!("no project configured: set AIVEN_PROJECT_NAME or use --project");
    };

    let deleted = sweep_kafka_topics(&client, project).await?;
    println!("Swept {} kafka topic(s) in {}.", deleted, project);
    Ok(())
}

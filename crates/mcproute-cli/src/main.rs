//! mcproute command line
//!
//! `mcproute` (or `mcproute repl`) reads queries interactively and routes
//! each to the best registered MCP server. `probe` inspects one endpoint,
//! `local` answers with the built-in arithmetic tools only.

mod repl;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mcproute_core::agent::{Agent, AgentOptions, AgentOutcome, AgentResult};
use mcproute_core::config::{AppConfig, ConfigFile};
use mcproute_core::logging::{ConsoleLogger, LogLevel, Logger, SharedLogger};
use mcproute_core::mcp::{RmcpConnector, Session};
use mcproute_core::pipeline::{PipelineEvent, QueryOutcome, QueryPipeline};
use mcproute_core::providers::{create_provider, Provider, ProviderModelConfig};
use mcproute_core::registry::Registry;
use mcproute_core::secrets::{ChainSecretStore, EnvSecretStore, MemorySecretStore, SecretStore};
use mcproute_core::tools::{LocalTool, LOCAL_MATH_INSTRUCTION};

use repl::{interrupted, QueryReader};

const QUERY_PROMPT: &str = "\nUser Query: ";
const GOODBYE: &str = "\nGoodbye!";

#[derive(Parser, Debug)]
#[command(
    name = "mcproute",
    version,
    about = "Route questions to the right MCP tool server"
)]
struct Cli {
    /// Configuration file (default: ~/.config/mcproute/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server registry JSON file
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Model as provider/model, e.g. openai/gpt-4o-mini
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum model turns per query
    #[arg(long)]
    max_turns: Option<usize>,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read queries interactively (default)
    Repl,
    /// Answer one query and exit
    Ask { query: Vec<String> },
    /// Connect to one endpoint and show its tools and instruction
    Probe { url: String },
    /// Answer with the built-in add/subtract/multiply/divide tools, no server
    Local { query: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::parse(&config.log_level)
    };
    let logger: SharedLogger = Arc::new(ConsoleLogger::new().with_level(level));
    logger.debug(&format!("[cli] configuration: {:?}", redacted(&config)));

    match cli.command.unwrap_or(Command::Repl) {
        Command::Repl => run_routed(&config, None, logger).await,
        Command::Ask { query } => run_routed(&config, Some(query.join(" ")), logger).await,
        Command::Probe { url } => probe(&config, &url, logger).await,
        Command::Local { query } => {
            let query = (!query.is_empty()).then(|| query.join(" "));
            run_local(&config, query, logger).await
        }
    }
}

/// File config with command-line overrides applied
fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn Error>> {
    let file = match &cli.config {
        Some(path) => ConfigFile::new(path),
        None => ConfigFile::user(),
    };
    let mut config = file.load()?;

    if let Some(registry) = &cli.registry {
        config.registry = registry.clone();
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(max_turns) = cli.max_turns {
        config.max_turns = max_turns;
    }
    config.validate()?;
    Ok(config)
}

fn redacted(config: &AppConfig) -> AppConfig {
    AppConfig {
        api_key: config.api_key.as_ref().map(|_| "***".to_string()),
        ..config.clone()
    }
}

fn build_provider(config: &AppConfig, logger: Arc<dyn Logger>) -> Arc<dyn Provider> {
    let explicit = MemorySecretStore::new();
    if let Some(key) = &config.api_key {
        explicit.insert(config.provider_id(), key.clone());
    }
    let secrets: Arc<dyn SecretStore> = Arc::new(ChainSecretStore::new(vec![
        Arc::new(explicit),
        Arc::new(EnvSecretStore::new()),
    ]));
    create_provider(config.provider_id(), secrets, logger)
}

fn model_config(config: &AppConfig) -> ProviderModelConfig {
    let model = ProviderModelConfig::new(config.model.clone());
    match &config.api_base {
        Some(base) => model.with_api_base(base.clone()),
        None => model,
    }
}

fn print_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::Routing => println!("[*] Routing query..."),
        PipelineEvent::Routed { server, url } => {
            println!("[*] Router selected: {} ({})", server, url)
        }
        PipelineEvent::Ready {
            tools,
            used_fallback,
            ..
        } => {
            println!("[*] Connected. Tools: {}", tools.join(", "));
            if *used_fallback {
                println!("[!] Instruction prompt unavailable, using fallback");
            }
        }
    }
}

fn print_outcome(outcome: &QueryOutcome) {
    match outcome {
        QueryOutcome::Answered { answer, .. } => println!("\nAgent Output: {}", answer),
        QueryOutcome::NoRoute => println!("[!] No suitable server found for this query."),
        QueryOutcome::Unreachable { server, reason } => {
            println!("[!] Could not reach server '{}': {}", server, reason)
        }
        QueryOutcome::Failed { reason, .. } => println!("[!] Query failed: {}", reason),
        QueryOutcome::Interrupted { server: Some(server) } => {
            println!("[!] Interrupted, connection to '{}' closed", server)
        }
        QueryOutcome::Interrupted { server: None } => println!("[!] Interrupted"),
    }
}

async fn run_routed(
    config: &AppConfig,
    query: Option<String>,
    logger: Arc<dyn Logger>,
) -> Result<(), Box<dyn Error>> {
    let registry = match Registry::load(&config.registry) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("[!] Failed to load registry: {}", e);
            std::process::exit(1);
        }
    };
    println!(
        "[*] Loaded {} server(s) from {}",
        registry.len(),
        config.registry.display()
    );

    let provider = build_provider(config, Arc::clone(&logger));
    let connector = Arc::new(RmcpConnector::new(Arc::clone(&logger)));
    let pipeline = QueryPipeline::from_config(config, registry, provider, connector, logger)
        .with_observer(print_event);

    if let Some(query) = query {
        print_outcome(&pipeline.run_until(&query, interrupted()).await);
        return Ok(());
    }

    println!("--- MCP Router ---  (type 'exit' or 'quit' to leave)");
    let mut reader = QueryReader::stdin();
    loop {
        let query = tokio::select! {
            query = reader.next_query(QUERY_PROMPT) => query?,
            _ = interrupted() => None,
        };
        let Some(query) = query else {
            break;
        };

        let outcome = pipeline.run_until(&query, interrupted()).await;
        print_outcome(&outcome);
        if matches!(outcome, QueryOutcome::Interrupted { .. }) {
            break;
        }
    }
    println!("{}", GOODBYE);
    Ok(())
}

async fn probe(config: &AppConfig, url: &str, logger: Arc<dyn Logger>) -> Result<(), Box<dyn Error>> {
    println!("[*] Connecting to {}...", url);
    let connector = RmcpConnector::new(Arc::clone(&logger));

    let catalog = Session::scoped_until(&connector, url, logger, interrupted(), |session| async move {
        session.fetch_catalog(&config.instruction_prompt).await
    })
    .await;

    match catalog {
        Ok(Ok(catalog)) => {
            println!("[*] Connected. {} tool(s):", catalog.tools.len());
            for tool in &catalog.tools {
                let params: Vec<String> = tool
                    .parameters()
                    .iter()
                    .map(|p| {
                        let marker = if p.required { "" } else { "?" };
                        format!("{}{}: {}", p.name, marker, p.kind)
                    })
                    .collect();
                println!("    - {}({}): {}", tool.name, params.join(", "), tool.description);
            }
            if catalog.used_fallback {
                println!("[!] Prompt '{}' unavailable, fallback:", config.instruction_prompt);
            } else {
                println!("[*] Instruction '{}':", config.instruction_prompt);
            }
            println!("{}", catalog.instruction);
            Ok(())
        }
        Ok(Err(e)) | Err(e) => {
            println!("[!] Probe failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_local(
    config: &AppConfig,
    query: Option<String>,
    logger: Arc<dyn Logger>,
) -> Result<(), Box<dyn Error>> {
    let provider = build_provider(config, Arc::clone(&logger));
    let agent = Agent::new(
        provider,
        model_config(config),
        LOCAL_MATH_INSTRUCTION,
        LocalTool::all(),
        logger,
    )
    .with_options(AgentOptions {
        max_turns: config.max_turns,
        temperature: config.temperature,
    });

    // None when interrupted
    let answer = |result: Option<AgentResult<AgentOutcome>>| match result {
        Some(Ok(outcome)) => println!("\nAgent Output: {}", outcome.answer),
        Some(Err(e)) => println!("[!] Query failed: {}", e),
        None => println!("[!] Interrupted"),
    };

    if let Some(query) = query {
        let result = tokio::select! {
            result = agent.run(&query) => Some(result),
            _ = interrupted() => None,
        };
        answer(result);
        return Ok(());
    }

    println!("--- Local math agent ---  (type 'exit' or 'quit' to leave)");
    let mut reader = QueryReader::stdin();
    loop {
        let query = tokio::select! {
            query = reader.next_query(QUERY_PROMPT) => query?,
            _ = interrupted() => None,
        };
        let Some(query) = query else {
            break;
        };

        let result = tokio::select! {
            result = agent.run(&query) => Some(result),
            _ = interrupted() => None,
        };
        let stop = result.is_none();
        answer(result);
        if stop {
            break;
        }
    }
    println!("{}", GOODBYE);
    Ok(())
}

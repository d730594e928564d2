use anyhow::{Context, Result};
use clap::Parser;
use tokio::fs::File;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use weighted_router::cli::{is_exit_command, Cli, Commands};
use weighted_router::config::DomainKind;
use weighted_router::routing::{AgentDomain, RouteRequest, Supervisor};
use weighted_router::{batch, utils, FoodAgent, Settings, SportsAgent};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match settings.routing.domain {
        DomainKind::Sports => run::<SportsAgent>(cli, &settings).await,
        DomainKind::Food => run::<FoodAgent>(cli, &settings).await,
    }
}

async fn run<A: AgentDomain>(cli: Cli, settings: &Settings) -> Result<()> {
    tracing::info!("Weighted router starting ({} domain)", A::NAME);
    let supervisor = Supervisor::<A>::from_settings(settings).await?;

    let result = match cli.command {
        Commands::Route { query, weights, preset, offline, json } => {
            handle_route(&supervisor, query, weights, preset, offline, json).await
        }
        Commands::Interactive { offline } => handle_interactive(&supervisor, offline).await,
        Commands::Batch { file, concurrency, offline } => {
            handle_batch(&supervisor, file, concurrency, offline).await
        }
        Commands::Stats { json } => handle_stats(&supervisor, json).await,
        Commands::History { limit } => handle_history(&supervisor, limit).await,
    };

    // Drain pending history writes before exiting
    supervisor.history().shutdown().await;

    result
}

async fn handle_route<A: AgentDomain>(
    supervisor: &Supervisor<A>,
    query: String,
    weight_overrides: Vec<(String, String)>,
    preset: Option<String>,
    offline: bool,
    json: bool,
) -> Result<()> {
    // Surface bad presets and overrides to the user instead of silently using defaults
    supervisor.resolve_weights(preset.as_deref(), &weight_overrides)?;

    let response = supervisor
        .route(RouteRequest {
            query,
            weight_overrides,
            preset,
            offline,
        })
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        utils::print_route_response(&response);
    }
    Ok(())
}

async fn handle_interactive<A: AgentDomain>(supervisor: &Supervisor<A>, offline: bool) -> Result<()> {
    utils::print_header(A::TITLE);
    utils::print_info("Type a query to route it ('quit', 'exit', '종료' or 'q' to leave)\n");

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        utils::print_prompt("Query: ");
        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            utils::print_success("Bye");
            break;
        }

        let response = supervisor
            .route(RouteRequest {
                query: input.to_string(),
                offline,
                ..RouteRequest::default()
            })
            .await;
        utils::print_route_response(&response);
        println!();
    }

    Ok(())
}

async fn handle_batch<A: AgentDomain>(
    supervisor: &Supervisor<A>,
    file: String,
    concurrency: usize,
    offline: bool,
) -> Result<()> {
    utils::print_info(&format!(
        "Routing queries from {} with concurrency {}",
        file, concurrency
    ));

    let file = File::open(&file)
        .await
        .with_context(|| format!("Failed to open batch file: {}", file))?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let mut queries = vec![];
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            queries.push(line.trim().to_string());
        }
    }

    let mut results = batch::route_queries(supervisor, queries, concurrency, offline).await;
    results.sort_by_key(|(index, _)| *index);

    for (index, response) in &results {
        utils::print_success(&format!(
            "{:>3}. {} → {} {} ({:.2})",
            index + 1,
            response.query,
            response.selected_agent.icon(),
            response.selected_agent.id(),
            response.metadata.confidence
        ));
    }

    let stats = supervisor.history().statistics().await?;
    utils::print_statistics(&stats);
    Ok(())
}

async fn handle_stats<A: AgentDomain>(supervisor: &Supervisor<A>, json: bool) -> Result<()> {
    let stats = supervisor.history().statistics().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        utils::print_statistics(&stats);
    }
    Ok(())
}

async fn handle_history<A: AgentDomain>(supervisor: &Supervisor<A>, limit: usize) -> Result<()> {
    let records = supervisor.history().load(Some(limit)).await?;
    utils::print_history(&records);
    Ok(())
}

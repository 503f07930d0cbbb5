//! Turing CLI: drives a client session against a JSON-RPC ledger node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use turing_client::{init_logging, ClientConfig, ClientSession, SessionOptions};
use turing_gateway::RpcGateway;
use turing_types::{RankingReport, RankingStatus, TokenAmount};

#[derive(Parser)]
#[command(name = "turing", about = "Token-weighted voting client")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TURING_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP JSON-RPC endpoint of the ledger node.
    #[arg(long, env = "TURING_RPC_URL")]
    rpc_url: Option<String>,

    /// WebSocket endpoint for vote-cast notifications.
    #[arg(long, env = "TURING_WS_URL")]
    ws_url: Option<String>,

    /// Address of the voting contract.
    #[arg(long, env = "TURING_CONTRACT")]
    contract: Option<String>,

    /// Caller account for submissions.
    #[arg(long, env = "TURING_ACCOUNT")]
    account: Option<String>,

    /// Candidate names in registry order (comma-separated).
    #[arg(long, env = "TURING_CANDIDATES", value_delimiter = ',')]
    candidates: Vec<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TURING_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TURING_LOG_FORMAT")]
    log_format: Option<String>,

    /// Print Prometheus metrics before exiting.
    #[arg(long, env = "TURING_ENABLE_METRICS")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the current leaderboard.
    Ranking,
    /// Print the voting switch and connection settings.
    Status,
    /// Issue tokens to a candidate.
    Issue { candidate: String, amount: TokenAmount },
    /// Vote for a candidate with an amount of tokens.
    Vote { candidate: String, amount: TokenAmount },
    /// Flip the voting switch.
    Toggle,
    /// Print the leaderboard on every change until Ctrl-C.
    Watch,
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(url) = &cli.ws_url {
        config.ws_url = url.clone();
    }
    if let Some(contract) = &cli.contract {
        config.contract_address = contract.clone();
    }
    if cli.account.is_some() {
        config.account = cli.account.clone();
    }
    if !cli.candidates.is_empty() {
        config.candidates = cli.candidates.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    config.enable_metrics |= cli.metrics;
    Ok(config)
}

fn print_ranking(report: &RankingReport) {
    match report.status {
        RankingStatus::AggregateEmpty | RankingStatus::NoCandidates => {
            println!("ranking unavailable ({})", report.status);
        }
        RankingStatus::Complete | RankingStatus::Partial => {
            for (i, entry) in report.ranking.iter().enumerate() {
                println!("{}º {} - {} TUR", i + 1, entry.name, entry.display_balance());
            }
        }
    }
    if report.lookup_failures() > 0 {
        eprintln!(
            "warning: {} candidate(s) could not be read and are not shown",
            report.lookup_failures()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(config.log_format()?, &config.log_level)?;

    let gateway = Arc::new(RpcGateway::new(config.gateway_config())?);
    let mut options = SessionOptions::from_config(&config)?;
    if !matches!(cli.command, Command::Watch) {
        options = options.without_listener();
    }
    let session = ClientSession::connect(gateway, options).await?;

    match &cli.command {
        Command::Ranking => print_ranking(&session.view().report),
        Command::Status => {
            let voting = match session.view().voting_enabled {
                Some(true) => "enabled",
                Some(false) => "disabled",
                None => "unknown",
            };
            println!("voting:     {voting}");
            println!("account:    {}", config.account.as_deref().unwrap_or("-"));
            println!("contract:   {}", config.contract_address);
            println!("rpc:        {}", config.rpc_url);
            println!("candidates: {}", session.registry().len());
        }
        Command::Issue { candidate, amount } => {
            let receipt = session.issue_tokens(candidate, *amount).await?;
            println!("{}", receipt.message());
        }
        Command::Vote { candidate, amount } => {
            let receipt = session.cast_vote(candidate, *amount).await?;
            println!("{}", receipt.message());
        }
        Command::Toggle => {
            let receipt = session.toggle_voting().await?;
            println!("{}", receipt.message());
        }
        Command::Watch => {
            let mut changes = session.watch();
            print_ranking(&changes.borrow_and_update().report);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("interrupt received, stopping");
                        break;
                    }
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let view = changes.borrow_and_update().clone();
                        println!();
                        print_ranking(&view.report);
                    }
                }
            }
        }
        Command::Config => {}
    }

    if config.enable_metrics {
        print!("{}", session.metrics().encode()?);
    }
    session.close().await;
    Ok(())
}

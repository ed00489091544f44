use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use weight_agent::admin::{AdminChannel, SocketAdminChannel};
use weight_agent::config::loader::load_or_default;
use weight_agent::net::AgentReply;
use weight_agent::stats::{HttpStatsSource, StatsSource};
use weight_agent::weight::compute_weights;

#[derive(Parser)]
#[command(name = "agent-cli")]
#[command(about = "Management CLI for the HAProxy weight agent", long_about = None)]
struct Cli {
    /// Agent / HAProxy config file (same format as the agent's)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a running agent for a server's reply, exactly as HAProxy would
    Query {
        server: String,
        /// Agent address
        #[arg(short, long, default_value = "127.0.0.1:9099")]
        addr: String,
    },
    /// Fetch HAProxy stats once and print the weights the agent would compute
    Weights,
    /// Send the counter reset command to HAProxy's admin socket
    Reset,
}

#[derive(Serialize)]
struct WeightReport {
    backend: String,
    server: String,
    status: String,
    weight: u8,
    retries: u64,
    redispatches: u64,
    response_errors: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Query { server, addr } => {
            let mut stream = tokio::time::timeout(Duration::from_secs(5), TcpStream::connect(&addr)).await??;
            stream.write_all(format!("{}\n", server).as_bytes()).await?;

            let mut reply = String::new();
            tokio::time::timeout(Duration::from_secs(10), stream.read_to_string(&mut reply)).await??;
            if reply.trim().is_empty() {
                eprintln!("No reply: the agent has not published any stats yet");
                return Ok(());
            }
            let parsed: AgentReply = reply.parse()?;
            println!("{}", parsed);
        }
        Commands::Weights => {
            let source = HttpStatsSource::new(&config.haproxy)?;
            let mut report: Vec<WeightReport> = compute_weights(source.fetch().await?)
                .into_iter()
                .map(|state| WeightReport {
                    backend: state.record.backend.clone(),
                    server: state.record.server.clone(),
                    status: state.record.status.to_string(),
                    weight: state.weight,
                    retries: state.record.retries,
                    redispatches: state.record.redispatches,
                    response_errors: state.record.response_errors,
                })
                .collect();
            report.sort_by(|a, b| (&a.backend, &a.server).cmp(&(&b.backend, &b.server)));
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Reset => {
            let channel = SocketAdminChannel::from_config(&config.haproxy);
            let reply = channel.send(&config.haproxy.reset_command).await?;
            println!("{} → {}", config.haproxy.reset_command, if reply.is_empty() { "ok" } else { reply.as_str() });
        }
    }

    Ok(())
}

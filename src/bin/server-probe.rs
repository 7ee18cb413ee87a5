use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::ORIGIN;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "server-probe")]
#[command(about = "Check a running Nutrition Tracker server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness, environment and AI mode
    Health,
    /// Connectivity check as seen by the server
    Test {
        /// Send this Origin header, e.g. a mobile dev server
        #[arg(long)]
        origin: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Test { origin } => {
            let mut req = client.get(format!("{}/test", base));
            if let Some(origin) = origin {
                req = req.header(ORIGIN, origin);
            }
            req.send().await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(ExitCode::FAILURE);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}

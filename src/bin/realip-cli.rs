use axum::http::{HeaderMap, HeaderName, HeaderValue};
use clap::{Parser, Subcommand};
use serde_json::Value;

use realip::resolve;

#[derive(Parser)]
#[command(name = "realip-cli")]
#[command(about = "Resolve client IPs offline or query a running realip service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a client IP from a peer address and headers
    Resolve {
        /// Transport peer address, e.g. 1.1.1.1:42
        #[arg(short, long)]
        peer: String,

        /// Request header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// Send a request to a running service and print its answer
    Query {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        /// Request header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { peer, headers } => {
            let headers = parse_headers(&headers)?;
            let resolution = resolve(&peer, &headers);
            println!("{} (from {})", resolution.ip, resolution.source);
        }
        Commands::Query { url, headers } => {
            let headers = parse_headers(&headers)?;
            let res = reqwest::Client::new()
                .get(&url)
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    for entry in raw {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| format!("header {:?} is not in \"Name: value\" form", entry))?;
        headers.append(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

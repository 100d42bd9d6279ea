use std::collections::HashMap;

use clap::{Parser, Subcommand};
use serde_json::Value;

use drift_gateway::routing::{find, ParamKind, ENDPOINTS};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for drift-gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List every operation and its local/upstream routes
    Routes,
    /// Invoke one operation through the gateway
    Call {
        /// Operation name, e.g. get_stations
        operation: String,
        /// Path identifier, NAME=VALUE (repeatable)
        #[arg(long = "path", value_parser = parse_pair)]
        path: Vec<(String, String)>,
        /// Query parameter, NAME=VALUE (repeatable)
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
        /// JSON request body
        #[arg(long)]
        data: Option<String>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Routes => print_routes(),
        Commands::Call { operation, path, params, data } => {
            let endpoint = find(&operation).ok_or_else(|| format!("unknown operation '{operation}'"))?;
            let path: HashMap<String, String> = path.into_iter().collect();
            let (method, route) = endpoint.local_route(&path)?;

            let mut request = client.request(method, format!("{}{}", cli.url, route));
            if !params.is_empty() {
                request = request.query(&params);
            }
            if let Some(data) = data {
                let body: Value = serde_json::from_str(&data)?;
                request = request.json(&body);
            }
            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

fn print_routes() {
    for e in ENDPOINTS {
        let params: Vec<String> = e
            .params
            .iter()
            .map(|p| match p.kind {
                ParamKind::Bool(d) => format!("{}={d}", p.name),
                ParamKind::Int(d) => format!("{}={d}", p.name),
                ParamKind::Str => format!("{} (required)", p.name),
            })
            .collect();
        println!(
            "{:<24} {:<7} {:<58} -> {}",
            e.id.name(),
            e.method.as_str(),
            e.local_path,
            e.upstream_path
        );
        if !params.is_empty() {
            println!("{:<33}params: {}", "", params.join(", "));
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}

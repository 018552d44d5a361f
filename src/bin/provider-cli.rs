use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "provider-cli")]
#[command(about = "Operator CLI for the provider resilience service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// List every slot's health snapshot
    Slots,
    /// Show the field schema for a provider type
    Schema { provider_type: String },
    /// Health snapshot for one slot
    Health { slot: String },
    /// Force a fresh health snapshot for one slot
    Refresh { slot: String },
    /// Run a connection test against a slot's active configuration.
    /// While the circuit is OPEN this is the recovery probe.
    Test { slot: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/api/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Slots => {
            let res = client
                .get(format!("{}/api/slots", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Schema { provider_type } => {
            let res = client
                .get(format!("{}/api/schemas/{}", cli.url, provider_type))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health { slot } => {
            let res = client
                .get(format!("{}/api/slots/{}/health", cli.url, slot))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Refresh { slot } => {
            let res = client
                .post(format!("{}/api/slots/{}/refresh", cli.url, slot))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Test { slot } => {
            let res = client
                .post(format!("{}/api/slots/{}/test", cli.url, slot))
                .headers(headers)
                .json(&serde_json::json!({}))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use keygate::auth::credential::{CredentialCodec, DEFAULT_KEY_LENGTH};

#[derive(Parser)]
#[command(name = "keygate-cli")]
#[command(about = "Management CLI for the keygate API key gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Header used for `whoami` when `--bearer` is not set.
    #[arg(long, default_value = "X-API-Key")]
    header: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a new identity and print its API key (shown once)
    Provision {
        #[arg(short, long)]
        name: String,
    },
    /// Show the identity behind an API key
    Whoami {
        #[arg(short, long)]
        key: String,
        /// Send the key as `Authorization: Bearer` instead of the key header
        #[arg(long)]
        bearer: bool,
    },
    /// Check gateway health
    Health,
    /// Generate a key and its digest locally without contacting the gateway
    Generate {
        #[arg(short, long, default_value_t = DEFAULT_KEY_LENGTH)]
        length: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Provision { name } => {
            let res = client
                .post(format!("{}/api/v1/users", cli.url))
                .json(&serde_json::json!({ "name": name }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Whoami { key, bearer } => {
            let mut headers = HeaderMap::new();
            if bearer {
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
            } else {
                headers.insert(
                    reqwest::header::HeaderName::from_bytes(cli.header.as_bytes())?,
                    HeaderValue::from_str(&key)?,
                );
            }
            let res = client
                .get(format!("{}/api/v1/me", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Generate { length } => {
            let issued = CredentialCodec::issue(length);
            let json = serde_json::json!({
                "api_key": issued.api_key.expose(),
                "digest": issued.digest.as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

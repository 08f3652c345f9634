use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Management CLI for the Papermark edge router", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PAPERMARK_EDGE_ADMIN_URL", default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "PAPERMARK_EDGE_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check edge router status
    Status,
    /// Show the active configuration with secrets redacted
    Config,
    /// Explain how a request would be routed
    Route {
        /// Host header of the request
        #[arg(long)]
        host: String,
        /// Path and query of the request
        #[arg(long)]
        path: String,
        /// Session token to route with
        #[arg(long)]
        token: Option<String>,
    },
    /// List conversion queues, or the queue for one plan
    Queues {
        #[arg(long)]
        plan: Option<String>,
    },
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

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Config => client.get(format!("{}/admin/config", base)),
        Commands::Route { host, path, token } => {
            let mut query = vec![("host", host), ("path", path)];
            if let Some(token) = token {
                query.push(("token", token));
            }
            client.get(format!("{}/admin/route", base)).query(&query)
        }
        Commands::Queues { plan } => {
            let request = client.get(format!("{}/admin/queues", base));
            match plan {
                Some(plan) => request.query(&[("plan", plan)]),
                None => request,
            }
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

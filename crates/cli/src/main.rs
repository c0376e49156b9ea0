use clap::Parser;
use std::net::SocketAddr;

use server::Config;

#[derive(Parser)]
#[command(name = "ani-enrich")]
#[command(about = "Character enrichment pipeline server", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Database file path
    #[arg(short, long, default_value = "ani-enrich.db")]
    database: String,

    /// Base URL of the text-generation service
    #[arg(long, env = "GENTEXT_BASE_URL", default_value = "http://localhost:8900")]
    gentext_base_url: String,

    /// API key for the text-generation service
    #[arg(long, env = "GENTEXT_API_KEY", default_value = "")]
    gentext_api_key: String,

    /// Token required by destructive admin endpoints
    #[arg(long, env = "ADMIN_TOKEN")]
    admin_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let database_url = format!("sqlite:{}?mode=rwc", cli.database);

    let mut config = Config::new(database_url, cli.gentext_base_url, cli.gentext_api_key);
    config.admin_token = cli.admin_token;

    server::run_server(addr, config).await
}

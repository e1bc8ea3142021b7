use clap::{Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use sw_core::ShipwrightConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sw")]
struct Cli {
    /// Config file; missing file falls back to defaults.
    #[arg(long, default_value = "shipwright.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve,
    /// Print the OpenAPI document and exit.
    Openapi,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => {
            let config = ShipwrightConfig::load(&cli.config);
            let port = config.port;
            let state = match sw_serve::build_state(&config) {
                Ok(state) => state,
                Err(err) => {
                    tracing::error!(%err, "startup failed");
                    std::process::exit(1);
                }
            };
            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
            if let Err(err) = sw_serve::serve(state, addr).await {
                tracing::error!(%err, "serve error");
            }
        }
        Command::Openapi => {
            println!("{}", sw_serve::openapi::generate_spec());
        }
    }
}

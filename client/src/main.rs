use clap::Parser;
use client::config::ClientConfig;
use client::network::Client;
use log::{error, info};
use shared::MAX_STRING_LEN;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// GUI address as host:port
    #[arg(short = 'd', long)]
    gui_address: String,

    /// Name to join games with
    #[arg(short = 'n', long, value_parser = parse_name)]
    player_name: String,

    /// UDP port to receive GUI input on
    #[arg(short = 'p', long)]
    port: u16,

    /// Server address as host:port
    #[arg(short = 's', long)]
    server_address: String,
}

fn parse_name(value: &str) -> Result<String, String> {
    if value.len() > MAX_STRING_LEN {
        return Err(format!("must be at most {} bytes", MAX_STRING_LEN));
    }
    Ok(value.to_string())
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        ClientConfig {
            player_name: args.player_name,
            port: args.port,
            gui_address: args.gui_address,
            server_address: args.server_address,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClientConfig::from(Args::parse());
    info!(
        "Starting client '{}': server {}, GUI {}",
        config.player_name, config.server_address, config.gui_address
    );

    let client = Client::connect(config).await?;
    if let Err(e) = client.run().await {
        error!("{}", e);
        return Err(e.into());
    }

    Ok(())
}

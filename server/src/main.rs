use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use shared::MAX_STRING_LEN;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Turns a bomb waits before exploding
    #[arg(short = 'b', long)]
    bomb_timer: u16,

    /// Players needed to start a game
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..))]
    players_count: u8,

    /// Turn duration in milliseconds
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u64).range(1..))]
    turn_duration: u64,

    /// How far an explosion reaches in each direction
    #[arg(short = 'e', long)]
    explosion_radius: u16,

    /// Blocks randomly placed when a game starts
    #[arg(short = 'k', long)]
    initial_blocks: u16,

    /// Turns per game
    #[arg(short = 'l', long)]
    game_length: u16,

    /// Name announced to clients
    #[arg(short = 'n', long, value_parser = parse_name)]
    server_name: String,

    /// TCP port to listen on
    #[arg(short = 'p', long)]
    port: u16,

    /// Seed for board layout and respawns (random when omitted)
    #[arg(short = 's', long)]
    seed: Option<u32>,

    /// Board width
    #[arg(short = 'x', long, value_parser = clap::value_parser!(u16).range(1..))]
    size_x: u16,

    /// Board height
    #[arg(short = 'y', long, value_parser = clap::value_parser!(u16).range(1..))]
    size_y: u16,
}

fn parse_name(value: &str) -> Result<String, String> {
    if value.len() > MAX_STRING_LEN {
        return Err(format!("must be at most {} bytes", MAX_STRING_LEN));
    }
    Ok(value.to_string())
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            server_name: args.server_name,
            port: args.port,
            players_count: args.players_count,
            size_x: args.size_x,
            size_y: args.size_y,
            game_length: args.game_length,
            bomb_timer: args.bomb_timer,
            explosion_radius: args.explosion_radius,
            initial_blocks: args.initial_blocks,
            turn_duration: Duration::from_millis(args.turn_duration),
            seed: args.seed.unwrap_or_else(rand::random),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());
    info!(
        "Starting server: {} players, {}x{} board, {} turns of {:?}, seed {}",
        config.players_count,
        config.size_x,
        config.size_y,
        config.game_length,
        config.turn_duration,
        config.seed
    );

    let server = Server::bind(config).await?;
    server.run().await;

    Ok(())
}

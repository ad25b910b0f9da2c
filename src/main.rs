use clap::Parser;
use tickstream::cli::{Cli, Commands};
use tickstream::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    tickstream::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Stream(args) => {
            args.execute(&config, cli.token.clone()).await?;
        }
        Commands::Config => {
            let token = config
                .resolve_token(cli.token.clone())
                .map(|_| "<set>")
                .unwrap_or("<missing>");
            println!("Current configuration:");
            println!("  Feed URL: {}", config.feed.ws_url);
            println!("  Token: {}", token);
            println!("  Symbols: {:?}", config.feed.symbols);
            println!("  Sink capacity: {}", config.feed.sink_capacity);
            println!("  Log level: {}", config.telemetry.log_level);
        }
    }

    Ok(())
}

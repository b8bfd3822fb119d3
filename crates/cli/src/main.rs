mod recent;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mibridge_shared::{Config, CookieSet, Error, MinaClient};

#[derive(Parser)]
#[command(name = "soundbox")]
#[command(about = "Show what a speaker was asked recently", long_about = None)]
struct Cli {
    /// Speaker display name, as shown in the device list
    name: String,

    /// Number of conversation records to request
    #[arg(short, long, default_value_t = 2)]
    limit: u32,

    /// Only print queries asked within this many seconds
    #[arg(short, long)]
    window: Option<u64>,

    #[arg(short, long)]
    verbose: bool,
}

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .init();

    let config = Config::load()?;
    debug!(?config, "Loaded config");

    let cookies = CookieSet::from_config(&config)?;
    let client = MinaClient::new(cookies, &config)?;

    let options = recent::Options {
        name: cli.name,
        limit: cli.limit,
        window: cli.window,
    };

    match recent::run(&client, &options).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(Error::NotFound(_)) => {
            println!("No such device: {}", options.name);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

use clap::Parser;
use client::{menu, network};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:65434")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let choice = menu::run()?;

    info!("Connecting to: {}", args.server);
    let client = network::Client::new(&args.server).await?;
    println!("Connected to server successfully. Waiting for game setup...");
    println!("Controls: w/a/s/d + Enter to move, q to quit");

    client.run(choice).await?;

    Ok(())
}

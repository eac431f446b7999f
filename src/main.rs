use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = fmp_relay::cli::Cli::parse();
    if let Err(e) = fmp_relay::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

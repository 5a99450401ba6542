use anyhow::Result;
use clap::Parser;
use ecom_admin::cli::Cli;
use ecom_admin::log::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.run().await
}

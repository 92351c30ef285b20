mod cli;
mod output;

use clap::Parser;
use cli::Cli;
use console::style;
use log::info;

#[tokio::main]
async fn main() {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting rgwadmin");
    if let Err(e) = cli.execute().await {
        eprintln!("{} {e:#}", style("Error:").red().bright());
        std::process::exit(1);
    }
}

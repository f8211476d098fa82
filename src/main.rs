//! gcservant CLI entry point.

use clap::Parser;

use gcservant::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = gcservant::cli::execute(cli).await {
        gcservant::cli::handle_error(&err);
    }
}

use clap::Parser;

mod cli;
mod commands;
mod password;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    commands::init_tracing(cli.verbose);
    commands::run(cli).await
}

use std::env;

use leetcommit::cli::Commands;
use leetcommit::config::Config;
use leetcommit::lcdb::Store;

use anyhow::Result;

async fn run(args: &[String]) -> Result<String> {
    let config = Config::from_env();

    // Initialize database
    let store = Store::open(&config.db_path)?;

    Commands::run_command(&store, &config, args).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Begin logger
    env_logger::init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    match run(&args).await {
        Ok(output) => println!("{output}"),
        Err(err) => {
            log::debug!("Command failed: {err:?}");
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
    }
}

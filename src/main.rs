// src/main.rs

use devlaunch::engine::SessionEnd;
use devlaunch::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(end) => {
            tracing::debug!(?end, "devlaunch finished");
        }
        Err(err) => {
            eprintln!("devlaunch error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<SessionEnd> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}

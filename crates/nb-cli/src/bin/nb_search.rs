use anyhow::Context;
use nb_cli::{execute, RunFile};
use tracing_subscriber::filter::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let run_file_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NASBUDGET_RUN_FILE").ok())
        .context("usage: nb-search <run-file.json> (or set NASBUDGET_RUN_FILE)")?;

    let run_file = RunFile::load(&run_file_path)?;
    let (record, outcome) = execute(&run_file)?;

    let json = serde_json::to_string_pretty(&record)?;
    match std::env::var("NASBUDGET_RECORD_PATH") {
        Ok(path) => {
            std::fs::write(&path, json).with_context(|| format!("failed to write run record {path}"))?;
            println!("Run record written to {path}");
        }
        Err(_) => println!("{json}"),
    }

    let result = outcome?;
    if let Some(best) = &result.best {
        println!(
            "Best network {} scored {:.4} ({:.1}s, {} epochs, {:?})",
            best.network_id(),
            best.fitness(),
            result.total_time,
            result.total_epoch,
            result.termination
        );
    }
    Ok(())
}

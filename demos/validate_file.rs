//! Validate a document on the background worker.
//!
//! Run with:
//!     cargo run --example validate_file -- /path/to/file.pdf [timeout-secs]
//!
//! Set `RUST_LOG=docseal=debug` to see the job's stage transitions.

use std::env;
use std::time::Duration;

use docseal::{Outcome, ProcessConfig, ProtocolOptions, Worker};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());
    let timeout = env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(60));

    let bytes = std::fs::read(&path)?;
    println!("Validating {} ({} bytes)\n", path, bytes.len());

    let worker = Worker::spawn(ProcessConfig::default(), ProtocolOptions::default())?;
    let outcome = worker.validate_with_timeout(bytes, timeout, |event| {
        println!("{:>3}% {}", event.progress, event.stage);
    })?;

    let result = match outcome {
        Outcome::Done(result) => result,
        Outcome::Cancelled => {
            println!("\nprocessing cancelled after {:?}", timeout);
            return Ok(());
        }
    };

    println!();
    println!("hash with block:    {}", result.hash_with_block);
    match result.hash_without_block {
        Some(hash) => println!("hash without block: {}", hash),
        None => println!("no validation block found"),
    }

    if let Some(fields) = &result.metadata_fields {
        println!(
            "\nblock at {}..{}, {} field(s):",
            result.block_start.unwrap_or(0),
            result.block_end.unwrap_or(0),
            fields.len()
        );
        for (key, value) in fields.iter() {
            println!("  {key}: {value}");
        }
    }

    println!("\n{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

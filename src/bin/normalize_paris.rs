//! Rebuild `paris_travaux_clean.json` and `paris_terrasses_clean.json` from
//! the raw ParisData dumps of one directory (default: `./data`).
//!
//! Usage: `normalize-paris [DIR]`

use lexpar_aggregator::ingest::normalize_paris_data;
use lexpar_aggregator::FsStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    lexpar_aggregator::telemetry::init_tracing();

    let dir = std::env::args().nth(1).unwrap_or_else(|| "./data".to_string());
    let store = FsStore::new(&dir);

    let written = normalize_paris_data(&store).await?;
    for f in &written {
        println!("{}: {} records", f.file, f.count);
    }
    Ok(())
}

// acquire_agp.rs
//! Downloads an American Gut Project sample subset from Qiita.
//!
//! Authenticated access reads `QIITA_USERNAME` and `QIITA_PASSWORD` from the
//! environment; without them, or on any fetch failure, the run degrades to a
//! seeded synthetic cohort. Either way, `metadata.tsv`, `feature-table.tsv`,
//! and `taxonomy.tsv` are written under `data/raw/`, overwriting.
//!
//! Usage: `acquire_agp [n_samples]` (default 5000).

use anyhow::Result as AnyhowResult;
use biomeprep::acquisition_utils::{download_study_sample, AcquisitionConfig};
use std::env;
use tokio::runtime::Runtime;

fn main() -> AnyhowResult<()> {
    let n_samples = env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<usize>().ok())
        .unwrap_or(5000);

    let config = AcquisitionConfig {
        n_samples,
        ..AcquisitionConfig::default()
    };

    let rt = Runtime::new()?;
    rt.block_on(download_study_sample(&config))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

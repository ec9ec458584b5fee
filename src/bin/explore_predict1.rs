// explore_predict1.rs
//! Explores a PREDICT1-style supplementary workbook.
//!
//! Finds a workbook in `data/raw/`, lists its sheets with shapes and leading
//! columns, guesses which sheets hold microbiome abundances versus sample
//! metadata, and scans every sheet for coffee/caffeine/beverage columns. The
//! report is printed; nothing is written.
//!
//! Usage: `explore_predict1 [workbook_path]`. The optional path skips
//! discovery when several candidates sit in `data/raw/`.

use anyhow::Result as AnyhowResult;
use biomeprep::workbook_utils::explore_workbook;
use std::env;

fn main() -> AnyhowResult<()> {
    let explicit = env::args().nth(1);
    explore_workbook("data/raw", explicit.as_deref()).map_err(|e| anyhow::anyhow!("{}", e))
}

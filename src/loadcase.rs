use crate::case::Case;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads a JSON encoded case.
pub fn load_case(case_path: &Path) -> Result<Case> {
    let file = File::open(case_path)
        .with_context(|| format!("failed to open case file {}", case_path.display()))?;
    let case: Case = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse case file {}", case_path.display()))?;
    Ok(case)
}

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// One module and the modules it imports, as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub id: String,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[cfg(test)]
impl DependencyRecord {
    pub fn new(id: impl Into<String>, imports: &[&str]) -> Self {
        Self {
            id: id.into(),
            imports: imports.iter().map(|import| (*import).to_owned()).collect(),
        }
    }
}

pub fn parse_records(raw: &str) -> Result<Vec<DependencyRecord>> {
    let records: Vec<DependencyRecord> =
        serde_json::from_str(raw).context("dependency input is not a JSON array of records")?;
    if records.is_empty() {
        return Err(anyhow!("dependency input contains no records"));
    }
    Ok(records)
}

/// Reads records from a JSON file, or from stdin when `source` is `-`.
pub fn load_records(source: &Path) -> Result<Vec<DependencyRecord>> {
    let raw = if source == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read dependency records from stdin")?;
        raw
    } else {
        fs::read_to_string(source)
            .with_context(|| format!("failed to read {}", source.display()))?
    };

    parse_records(&raw).with_context(|| format!("failed to parse {}", source.display()))
}

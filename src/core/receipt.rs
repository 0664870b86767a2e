//! Install receipts
//!
//! Every keg carries an `INSTALL_RECEIPT.json` describing what was
//! installed from where. Its presence is what marks a keg as installed.

use crate::formula::{Formula, Resource, version};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const RECEIPT_FILE: &str = "INSTALL_RECEIPT.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub name: String,
    pub version: String,
    pub source: Resource,
    pub resources: Vec<Resource>,
    /// Interpreter the virtualenv was created with, if any
    #[serde(default)]
    pub python: Option<String>,
    /// Symlinks created under `<prefix>/bin`
    #[serde(default)]
    pub linked: Vec<PathBuf>,
    /// UNIX seconds
    pub installed_at: u64,
}

impl Receipt {
    pub fn new(formula: &Formula, python: Option<String>, linked: Vec<PathBuf>) -> Self {
        let installed_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            name: formula.name.clone(),
            version: formula.version.clone(),
            source: formula.source(),
            resources: formula.resources.clone(),
            python,
            linked,
            installed_at,
        }
    }

    pub fn write(&self, keg: &Path) -> Result<()> {
        let path = keg.join(RECEIPT_FILE);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize receipt")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write receipt: {}", path.display()))
    }

    /// Read the receipt of a keg; `None` if the keg is not installed.
    pub fn read(keg: &Path) -> Result<Option<Self>> {
        let path = keg.join(RECEIPT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read receipt: {}", path.display()))?;
        let receipt = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt receipt: {}", path.display()))?;
        Ok(Some(receipt))
    }
}

/// Every installed receipt under `cellar`, sorted by name then version.
pub fn installed(cellar: &Path) -> Result<Vec<Receipt>> {
    let mut receipts = Vec::new();
    if !cellar.exists() {
        return Ok(receipts);
    }
    for formula_dir in std::fs::read_dir(cellar)? {
        let formula_dir = formula_dir?.path();
        if !formula_dir.is_dir() {
            continue;
        }
        for keg in std::fs::read_dir(&formula_dir)? {
            let keg = keg?;
            // Hidden entries are kegs being replaced
            if keg.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let keg = keg.path();
            if let Some(receipt) = Receipt::read(&keg)? {
                receipts.push(receipt);
            }
        }
    }
    receipts.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| version::compare(&a.version, &b.version))
    });
    Ok(receipts)
}

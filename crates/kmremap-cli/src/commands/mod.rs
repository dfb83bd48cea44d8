//! CLI command implementations

pub mod inspect;
pub mod remap;

use anyhow::Context;
use kmremap::Header;
use std::path::Path;

/// Load a metadata header from a JSON file
pub fn read_header(path: &Path) -> anyhow::Result<Header> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a metadata header", path.display()))
}

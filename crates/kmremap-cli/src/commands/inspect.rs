//! `kmremap inspect`: Print the decoded metadata tree of a header.

use super::read_header;
use anyhow::Context;
use kmremap::{Header, KotlinClassMetadata};
use serde_json::{json, Value};
use std::path::Path;

pub fn execute(path: &Path) -> anyhow::Result<()> {
    let header = read_header(path)?;
    let value = render(&header)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn render(header: &Header) -> anyhow::Result<Value> {
    let metadata = KotlinClassMetadata::read(header).context("Failed to decode metadata")?;
    Ok(json!({
        "k": header.kind,
        "mv": header.metadata_version,
        "metadata": metadata,
    }))
}

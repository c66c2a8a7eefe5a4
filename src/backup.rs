use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::record::{NormalizedRecord, Platform};
use crate::util::time::timestamp_slug;

pub fn file_name(platform: Platform, slug: &str) -> String {
    format!("{}_data_{}.json", platform.label(), slug)
}

/// `{dir}/{blog|stream}_data_{YYYYmmdd_HHMMSS}.json`, pretty-printed.
pub fn write(dir: &Path, platform: Platform, records: &[NormalizedRecord]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create backup dir {}", dir.display()))?;
    let path = dir.join(file_name(platform, &timestamp_slug(Local::now())));
    let json = serde_json::to_string_pretty(records).context("serialize records")?;
    fs::write(&path, json).with_context(|| format!("write backup {}", path.display()))?;
    Ok(path)
}

pub fn read(path: &Path) -> Result<Vec<NormalizedRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read backup {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse backup {}", path.display()))
}

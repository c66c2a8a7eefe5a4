use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;

use crate::record::NormalizedRecord;
use crate::util::time::timestamp_slug;

use super::sheets;

/// Turns the final record list into a report artifact.
pub trait ReportGenerator {
    fn generate(&self, records: &[NormalizedRecord], keywords: &[String]) -> Result<PathBuf>;
}

/// Writes `{dir}/sns_kpi_report_{YYYYmmdd_HHMMSS}.json`.
pub struct JsonReportWriter {
    dir: PathBuf,
}

impl JsonReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self { JsonReportWriter { dir: dir.into() } }
}

impl ReportGenerator for JsonReportWriter {
    fn generate(&self, records: &[NormalizedRecord], keywords: &[String]) -> Result<PathBuf> {
        let now = Local::now();
        let doc = sheets::build(records, keywords, now);
        fs::create_dir_all(&self.dir).with_context(|| format!("create report dir {}", self.dir.display()))?;
        let path = self.dir.join(format!("sns_kpi_report_{}.json", timestamp_slug(now)));
        let json = serde_json::to_string_pretty(&doc).context("serialize report")?;
        fs::write(&path, json).with_context(|| format!("write report {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate::golden;

    #[test]
    fn writes_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonReportWriter::new(dir.path().join("output"));
        let kws = vec!["rust".to_string(), "tokio".into(), "serde".into()];
        let path = writer.generate(&golden::records(), &kws).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("sns_kpi_report_"), "{name}");
        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        for section in ["summary", "unified", "platforms", "keyword_analysis", "daily"] {
            assert!(v.get(section).is_some(), "missing {section}");
        }
        assert_eq!(v["summary"]["keywords"], 3);
        assert_eq!(v["unified"].as_array().unwrap().len(), 7);
        assert_eq!(v["platforms"]["blog"].as_array().unwrap().len(), 4);
        assert_eq!(v["summary"]["by_keyword"][0]["keyword"], "rust");
    }

    #[test]
    fn empty_input_still_writes_a_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = JsonReportWriter::new(dir.path()).generate(&[], &["rust".to_string()]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["summary"]["by_keyword"][0]["total"], 0);
        assert!(v["daily"].as_array().unwrap().is_empty());
    }
}

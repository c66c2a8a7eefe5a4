use chrono::{DateTime, Local};
use serde::Serialize;

use crate::record::{Platform, Region};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordSummary {
    pub keyword: String,
    pub total: usize,
    pub blog: usize,
    pub stream: usize,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub reposts: u64,
    /// Records whose view count is known and positive.
    pub with_views: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub platform: Platform,
    pub keyword: String,
    pub region: Region,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegionCounts {
    pub domestic: usize,
    pub foreign: usize,
    pub unclassified: usize,
}

impl RegionCounts {
    pub fn add(&mut self, region: Region) {
        match region {
            Region::Domestic => self.domestic += 1,
            Region::Foreign => self.foreign += 1,
            Region::Unclassified => self.unclassified += 1,
        }
    }

    #[cfg(test)]
    pub fn total(&self) -> usize { self.domestic + self.foreign + self.unclassified }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegionSplit {
    pub blog: RegionCounts,
    pub stream: RegionCounts,
    pub total: RegionCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformTotals {
    pub platform: Platform,
    pub records: usize,
    pub detail_success: usize,
}

// Report document sections

#[derive(Debug, Serialize)]
pub struct SummarySection {
    pub generated_at: DateTime<Local>,
    pub keywords: usize,
    pub platforms: Vec<PlatformTotals>,
    pub regions: RegionSplit,
    pub by_keyword: Vec<KeywordSummary>,
}

#[derive(Debug, Serialize)]
pub struct UnifiedRow {
    pub region: Region,
    pub platform: Platform,
    pub channel: String,
    pub url: String,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub keyword: String,
    pub title: String,
    pub posted_at: String,
    pub collected_at: String,
}

#[derive(Debug, Serialize)]
pub struct BlogRow {
    pub region: Region,
    pub author_name: String,
    pub author_id: String,
    pub url: String,
    pub title: String,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub keyword: String,
    pub posted_at: String,
    pub detail: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StreamRow {
    pub region: Region,
    pub author_name: String,
    pub author_id: String,
    pub url: String,
    pub text: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub reposts: u64,
    pub keyword: String,
    pub posted_at: String,
}

#[derive(Debug, Serialize)]
pub struct PlatformSection {
    pub blog: Vec<BlogRow>,
    pub stream: Vec<StreamRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordAnalysis {
    pub keyword: String,
    pub blog_posts: usize,
    pub stream_posts: usize,
    pub total_posts: usize,
    pub stream_views: u64,
    pub stream_likes: u64,
    pub stream_comments: u64,
    pub stream_reposts: u64,
    pub stream_avg_views: f64,
    /// `collected/total` for blog view counts.
    pub blog_views_collected: String,
    pub blog_avg_views: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub summary: SummarySection,
    pub unified: Vec<UnifiedRow>,
    pub platforms: PlatformSection,
    pub keyword_analysis: Vec<KeywordAnalysis>,
    pub daily: Vec<DailyCount>,
}

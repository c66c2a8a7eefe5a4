use chrono::{DateTime, Local};

use crate::record::{DetailStatus, NormalizedRecord, Platform};

use super::aggregate;
use super::types::{BlogRow, KeywordAnalysis, PlatformSection, ReportDocument, StreamRow, SummarySection, UnifiedRow};

const STREAM_PREVIEW_CHARS: usize = 100;

fn preview(text: &str) -> String {
    if text.chars().count() <= STREAM_PREVIEW_CHARS { return text.to_string(); }
    let mut out: String = text.chars().take(STREAM_PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

fn round1(v: f64) -> f64 { (v * 10.0).round() / 10.0 }

fn by_date_desc<T>(rows: &mut [T], date: impl Fn(&T) -> &str) {
    rows.sort_by(|a, b| date(b).cmp(date(a)));
}

pub fn unified(records: &[NormalizedRecord]) -> Vec<UnifiedRow> {
    let mut rows: Vec<UnifiedRow> = records.iter().map(|r| {
        let (channel, title) = match r.platform {
            Platform::BlogSource => (r.author_name.clone(), r.title_or_text.clone()),
            Platform::StreamSource => (format!("@{}", r.author_id), preview(&r.title_or_text)),
        };
        UnifiedRow {
            region: r.region,
            platform: r.platform,
            channel,
            url: r.source_url.clone(),
            views: r.views,
            likes: r.likes,
            comments: r.comments,
            keyword: r.keyword.clone(),
            title,
            posted_at: r.posted_at.clone(),
            collected_at: r.collected_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }).collect();
    by_date_desc(&mut rows, |r| r.posted_at.as_str());
    rows
}

pub fn platforms(records: &[NormalizedRecord]) -> PlatformSection {
    let mut blog: Vec<BlogRow> = records.iter().filter(|r| r.platform == Platform::BlogSource).map(|r| BlogRow {
        region: r.region,
        author_name: r.author_name.clone(),
        author_id: r.author_id.clone(),
        url: r.source_url.clone(),
        title: r.title_or_text.clone(),
        views: r.views,
        likes: r.likes,
        comments: r.comments,
        keyword: r.keyword.clone(),
        posted_at: r.posted_at.clone(),
        detail: match r.detail_status {
            DetailStatus::Success => "success",
            DetailStatus::Failed { .. } => "failed",
            DetailStatus::NotAttempted => "not_attempted",
        },
    }).collect();
    let mut stream: Vec<StreamRow> = records.iter().filter(|r| r.platform == Platform::StreamSource).map(|r| StreamRow {
        region: r.region,
        author_name: r.author_name.clone(),
        author_id: format!("@{}", r.author_id),
        url: r.source_url.clone(),
        text: r.title_or_text.clone(),
        views: r.views.unwrap_or(0),
        likes: r.likes.unwrap_or(0),
        comments: r.comments.unwrap_or(0),
        reposts: r.reposts.unwrap_or(0),
        keyword: r.keyword.clone(),
        posted_at: r.posted_at.clone(),
    }).collect();
    by_date_desc(&mut blog, |r| r.posted_at.as_str());
    by_date_desc(&mut stream, |r| r.posted_at.as_str());
    PlatformSection { blog, stream }
}

pub fn keyword_analysis(records: &[NormalizedRecord], keywords: &[String]) -> Vec<KeywordAnalysis> {
    keywords.iter().map(|kw| {
        let blog: Vec<&NormalizedRecord> = records.iter().filter(|r| &r.keyword == kw && r.platform == Platform::BlogSource).collect();
        let stream: Vec<&NormalizedRecord> = records.iter().filter(|r| &r.keyword == kw && r.platform == Platform::StreamSource).collect();
        let sum = |f: fn(&NormalizedRecord) -> Option<u64>| stream.iter().map(|r| f(r).unwrap_or(0)).sum::<u64>();
        let stream_views = sum(|r| r.views);
        let blog_views: Vec<u64> = blog.iter().filter_map(|r| r.views).filter(|v| *v > 0).collect();
        KeywordAnalysis {
            keyword: kw.clone(),
            blog_posts: blog.len(),
            stream_posts: stream.len(),
            total_posts: blog.len() + stream.len(),
            stream_views,
            stream_likes: sum(|r| r.likes),
            stream_comments: sum(|r| r.comments),
            stream_reposts: sum(|r| r.reposts),
            stream_avg_views: if stream.is_empty() { 0.0 } else { round1(stream_views as f64 / stream.len() as f64) },
            blog_views_collected: format!("{}/{}", blog_views.len(), blog.len()),
            blog_avg_views: if blog_views.is_empty() { 0.0 } else { round1(blog_views.iter().sum::<u64>() as f64 / blog_views.len() as f64) },
        }
    }).collect()
}

/// Assembles every section of the report from the final record list.
pub fn build(records: &[NormalizedRecord], keywords: &[String], generated_at: DateTime<Local>) -> ReportDocument {
    ReportDocument {
        summary: SummarySection {
            generated_at,
            keywords: keywords.len(),
            platforms: aggregate::platform_totals(records),
            regions: aggregate::region_split(records),
            by_keyword: aggregate::keyword_table(records, keywords),
        },
        unified: unified(records),
        platforms: platforms(records),
        keyword_analysis: keyword_analysis(records, keywords),
        daily: aggregate::by_day(records),
    }
}

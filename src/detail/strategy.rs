use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use super::session::{RenderSession, SelectorKind, SessionError};

pub const VIEWS_LABEL: &str = "조회";
pub const COMMENTS_LABEL: &str = "댓글";
pub const LIKES_LABEL: &str = "공감";
pub const LIKES_ALT_LABEL: &str = "좋아요";

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("valid number pattern"));
static VIEWS_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"조회\s*(\d[\d,]*)").expect("valid views pattern"));
static COMMENTS_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"댓글\s*(\d[\d,]*)").expect("valid comments pattern"));
static LIKES_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"공감\s*(\d[\d,]*)").expect("valid likes pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric { Views, Comments, Likes }

impl Metric {
    pub fn label(&self) -> &'static str {
        match self { Metric::Views => "views", Metric::Comments => "comments", Metric::Likes => "likes" }
    }
}

/// First run of digits and thousands separators, separators stripped.
pub fn parse_count(text: &str) -> Option<u64> {
    let m = NUMBER_RE.find(text)?;
    m.as_str().replace(',', "").parse().ok()
}

/// One heuristic for recovering a metric. `Ok(None)` is a miss.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, session: &dyn RenderSession) -> Result<Option<u64>, SessionError>;
}

/// Elements under known selectors whose text carries the label (any text when `label` is None).
pub struct LabeledSelectors {
    pub kind: SelectorKind,
    pub selectors: &'static [&'static str],
    pub label: Option<&'static str>,
}

#[async_trait]
impl Strategy for LabeledSelectors {
    fn name(&self) -> &'static str { "labeled_selectors" }

    async fn attempt(&self, session: &dyn RenderSession) -> Result<Option<u64>, SessionError> {
        for sel in self.selectors {
            let found = match session.find(self.kind, sel).await {
                Ok(found) => found,
                Err(SessionError::Closed) => return Err(SessionError::Closed),
                Err(e) => {
                    tracing::debug!(selector = *sel, error = %e, "selector query failed; trying next");
                    continue;
                }
            };
            for el in found {
                let text = el.text.trim();
                if text.is_empty() { continue; }
                if let Some(label) = self.label && !text.contains(label) { continue; }
                if let Some(n) = parse_count(text) { return Ok(Some(n)); }
            }
        }
        Ok(None)
    }
}

/// Layouts that render one node per item: the count is the number of matches.
pub struct CountMatches {
    pub css: &'static str,
}

#[async_trait]
impl Strategy for CountMatches {
    fn name(&self) -> &'static str { "count_matches" }

    async fn attempt(&self, session: &dyn RenderSession) -> Result<Option<u64>, SessionError> {
        let found = session.find(SelectorKind::Css, self.css).await?;
        Ok((!found.is_empty()).then_some(found.len() as u64))
    }
}

pub struct ButtonLabels {
    pub labels: &'static [&'static str],
}

#[async_trait]
impl Strategy for ButtonLabels {
    fn name(&self) -> &'static str { "button_labels" }

    async fn attempt(&self, session: &dyn RenderSession) -> Result<Option<u64>, SessionError> {
        for el in session.find(SelectorKind::TagName, "button").await? {
            if !self.labels.iter().any(|l| el.text.contains(l)) { continue; }
            if let Some(n) = parse_count(&el.text) { return Ok(Some(n)); }
        }
        Ok(None)
    }
}

/// Last resort: `label <digits>` anywhere in the rendered body text.
pub struct PageTextPattern {
    pub pattern: &'static LazyLock<Regex>,
}

#[async_trait]
impl Strategy for PageTextPattern {
    fn name(&self) -> &'static str { "page_text" }

    async fn attempt(&self, session: &dyn RenderSession) -> Result<Option<u64>, SessionError> {
        let body = session.find(SelectorKind::TagName, "body").await?;
        let text = body.iter().map(|e| e.text.as_str()).collect::<Vec<_>>().join(" ");
        Ok(self.pattern.captures(&text).and_then(|c| c.get(1)).and_then(|m| parse_count(m.as_str())))
    }
}

/// Ordered strategies for one metric; the first hit wins, nothing found is `0`.
pub struct MetricCascade {
    pub metric: Metric,
    pub strategies: Vec<Box<dyn Strategy>>,
}

impl MetricCascade {
    /// Strategy errors count as misses, except a closed session which nothing after it can recover from.
    pub async fn resolve(&self, session: &dyn RenderSession) -> Result<u64, SessionError> {
        for s in &self.strategies {
            match s.attempt(session).await {
                Ok(Some(n)) => {
                    tracing::debug!(metric = self.metric.label(), strategy = s.name(), value = n, "metric resolved");
                    return Ok(n);
                }
                Ok(None) => {}
                Err(SessionError::Closed) => return Err(SessionError::Closed),
                Err(e) => tracing::debug!(metric = self.metric.label(), strategy = s.name(), error = %e, "strategy failed; trying next"),
            }
        }
        Ok(0)
    }

    pub fn views() -> Self {
        MetricCascade {
            metric: Metric::Views,
            strategies: vec![
                Box::new(LabeledSelectors { kind: SelectorKind::ClassName, selectors: &["se_publishDate", "se-f", "se-module-text", "blog2_series"], label: Some(VIEWS_LABEL) }),
                Box::new(PageTextPattern { pattern: &VIEWS_TEXT_RE }),
            ],
        }
    }

    pub fn comments() -> Self {
        MetricCascade {
            metric: Metric::Comments,
            strategies: vec![
                Box::new(LabeledSelectors { kind: SelectorKind::Css, selectors: &[".u_cbox_count", ".cmt_count", ".comment_count", ".num", ".u_cbox_info_txt"], label: Some(COMMENTS_LABEL) }),
                Box::new(CountMatches { css: ".u_cbox_comment_box, .cmt_item" }),
                Box::new(PageTextPattern { pattern: &COMMENTS_TEXT_RE }),
            ],
        }
    }

    pub fn likes() -> Self {
        MetricCascade {
            metric: Metric::Likes,
            strategies: vec![
                Box::new(LabeledSelectors { kind: SelectorKind::Css, selectors: &[".u_likeit_text", ".btn_sympathy .count", ".ico_like", ".u_likeit_list_count"], label: None }),
                Box::new(ButtonLabels { labels: &[LIKES_LABEL, LIKES_ALT_LABEL] }),
                Box::new(PageTextPattern { pattern: &LIKES_TEXT_RE }),
            ],
        }
    }
}

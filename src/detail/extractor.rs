use std::sync::Arc;
use std::time::Duration;

use crate::pacing::Clock;
use crate::record::DetailResult;

use super::session::{FrameScope, RenderSession, SelectorKind, SessionError};
use super::strategy::MetricCascade;

pub const CONTENT_FRAME_ID: &str = "mainFrame";
const SETTLE: Duration = Duration::from_secs(2);
const FRAME_SETTLE: Duration = Duration::from_secs(1);

/// Recovers views/comments/likes for one post url on a caller-owned session.
pub struct DetailExtractor {
    views: MetricCascade,
    comments: MetricCascade,
    likes: MetricCascade,
    clock: Arc<dyn Clock>,
    settle: Duration,
    frame_settle: Duration,
    frame_id: &'static str,
}

impl DetailExtractor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        DetailExtractor {
            views: MetricCascade::views(),
            comments: MetricCascade::comments(),
            likes: MetricCascade::likes(),
            clock,
            settle: SETTLE,
            frame_settle: FRAME_SETTLE,
            frame_id: CONTENT_FRAME_ID,
        }
    }

    #[cfg(test)]
    pub fn with_settle(mut self, settle: Duration, frame_settle: Duration) -> Self {
        self.settle = settle;
        self.frame_settle = frame_settle;
        self
    }

    /// Never fails: any session error becomes a `Failed` result with zeroed metrics.
    pub async fn extract(&self, session: &mut dyn RenderSession, url: &str) -> DetailResult {
        match self.try_extract(session, url).await {
            Ok(res) => res,
            Err(e) => DetailResult::failed(e),
        }
    }

    async fn try_extract(&self, session: &mut dyn RenderSession, url: &str) -> Result<DetailResult, SessionError> {
        session.navigate(url).await?;
        self.clock.sleep(self.settle).await;

        let has_frame = match session.find(SelectorKind::Id, self.frame_id).await {
            Ok(found) => !found.is_empty(),
            Err(SessionError::Closed) => return Err(SessionError::Closed),
            Err(_) => false,
        };
        let scope = if has_frame { FrameScope::enter(session, self.frame_id).await } else { FrameScope::top(session) };
        if scope.in_frame() { self.clock.sleep(self.frame_settle).await; }

        let page = scope.session();
        let views = self.views.resolve(page).await?;
        let comments = self.comments.resolve(page).await?;
        let likes = self.likes.resolve(page).await?;
        Ok(DetailResult::success(views, likes, comments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::session::testing::{StubPage, StubSession, Visit};
    use crate::pacing::testing::ManualClock;
    use crate::record::DetailStatus;

    const URL: &str = "https://blog.example.com/writer/1";

    #[tokio::test]
    async fn navigation_failure_is_a_failed_result() {
        let clock = ManualClock::new();
        let ex = DetailExtractor::new(clock.clone());
        let mut s = StubSession::single(URL, Visit::NavigationFails);
        let res = ex.extract(&mut s, URL).await;
        assert_eq!((res.views, res.likes, res.comments), (0, 0, 0));
        assert!(res.status.is_failed());
        assert!(!res.error().unwrap_or_default().is_empty());
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn page_text_fallback_recovers_views() {
        let ex = DetailExtractor::new(ManualClock::new());
        let mut s = StubSession::single(URL, Visit::Page(StubPage::default().with_top("body", &["오늘의 글 조회 1,234"])));
        let res = ex.extract(&mut s, URL).await;
        assert_eq!(res.views, 1234);
        assert_eq!((res.likes, res.comments), (0, 0));
        assert_eq!(res.status, DetailStatus::Success);
    }

    #[tokio::test]
    async fn reads_metrics_inside_content_frame() {
        let clock = ManualClock::new();
        let ex = DetailExtractor::new(clock.clone());
        let page = StubPage::default()
            .with_top("body", &["조회 999"])
            .with_frame(".se-f", &["조회 321"])
            .with_frame(".u_cbox_count", &["댓글 4"])
            .with_frame(".u_likeit_text", &["15"]);
        let mut s = StubSession::single(URL, Visit::Page(page));
        let res = ex.extract(&mut s, URL).await;
        assert_eq!((res.views, res.comments, res.likes), (321, 4, 15));
        assert!(!s.in_frame());
        assert_eq!(clock.sleeps(), vec![SETTLE, FRAME_SETTLE]);
    }

    #[tokio::test]
    async fn frame_is_reset_when_session_dies_mid_extraction() {
        let ex = DetailExtractor::new(ManualClock::new());
        let page = StubPage::default().with_frame(".se-f", &["조회 1"]).dying_in_frame();
        let mut s = StubSession::single(URL, Visit::Page(page));
        let res = ex.extract(&mut s, URL).await;
        assert!(res.status.is_failed());
        assert!(!s.in_frame());

        let mut s = StubSession::single(URL, Visit::Crashes);
        assert!(ex.extract(&mut s, URL).await.status.is_failed());
    }

    #[tokio::test]
    async fn nothing_found_is_success_with_zeros() {
        let ex = DetailExtractor::new(ManualClock::new());
        let mut s = StubSession::single(URL, Visit::Page(StubPage::default()));
        let res = ex.extract(&mut s, URL).await;
        assert_eq!(res, DetailResult::success(0, 0, 0));
    }
}

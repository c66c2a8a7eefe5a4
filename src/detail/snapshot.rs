#[cfg(test)]
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::session::{Element, RenderSession, SelectorKind, SessionError, SessionFactory};

/// Where page HTML comes from.
#[derive(Clone)]
pub enum Source {
    Http(Client),
    #[cfg(test)]
    Fixtures(HashMap<String, String>),
}

/// Static-HTML session: no script execution, but the same frame handling as a browser.
/// Useful where launching Chromium is not possible.
pub struct SnapshotSession {
    source: Source,
    top: Option<(Url, String)>,
    frame: Option<String>,
}

impl SnapshotSession {
    pub fn new(source: Source) -> Self {
        SnapshotSession { source, top: None, frame: None }
    }

    async fn fetch(&self, url: &Url) -> Result<String, SessionError> {
        let nav_err = |message: String| SessionError::Navigation { url: url.to_string(), message };
        match &self.source {
            #[cfg(test)]
            Source::Fixtures(pages) => pages.get(url.as_str()).cloned().ok_or_else(|| nav_err("404 Not Found".into())),
            Source::Http(client) => {
                let resp = client.get(url.clone()).send().await.map_err(|e| nav_err(e.to_string()))?;
                let status = resp.status();
                if !status.is_success() { return Err(nav_err(status.to_string())); }
                resp.text().await.map_err(|e| nav_err(e.to_string()))
            }
        }
    }
}

fn node_texts(html: &str, css: &str) -> Result<Vec<Element>, SessionError> {
    let sel = Selector::parse(css).map_err(|e| SessionError::Query(format!("invalid selector '{css}': {e:?}")))?;
    let doc = Html::parse_document(html);
    Ok(doc.select(&sel)
        .map(|el| Element::new(el.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(" ")))
        .collect())
}

fn frame_src(html: &str, id: &str) -> Option<String> {
    let sel = Selector::parse(&SelectorKind::Id.to_css(id)).ok()?;
    let doc = Html::parse_document(html);
    let src = doc.select(&sel).next()?.value().attr("src")?.trim().to_string();
    (!src.is_empty()).then_some(src)
}

#[async_trait]
impl RenderSession for SnapshotSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.top = None;
        self.frame = None;
        let parsed = Url::parse(url).map_err(|e| SessionError::Navigation { url: url.to_string(), message: e.to_string() })?;
        let html = self.fetch(&parsed).await?;
        self.top = Some((parsed, html));
        Ok(())
    }

    async fn find(&self, kind: SelectorKind, selector: &str) -> Result<Vec<Element>, SessionError> {
        let html = match (&self.frame, &self.top) {
            (Some(frame), _) => frame.as_str(),
            (None, Some((_, top))) => top.as_str(),
            (None, None) => return Ok(Vec::new()),
        };
        node_texts(html, &kind.to_css(selector))
    }

    async fn enter_frame(&mut self, id: &str) -> Result<(), SessionError> {
        let Some((base, html)) = &self.top else { return Err(SessionError::Query("no page loaded".into())) };
        let src = frame_src(html, id).ok_or_else(|| SessionError::Query(format!("frame '{id}' has no src")))?;
        let target = base.join(&src).map_err(|e| SessionError::Query(e.to_string()))?;
        let html = self.fetch(&target).await?;
        self.frame = Some(html);
        Ok(())
    }

    fn exit_frame(&mut self) { self.frame = None; }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.top = None;
        self.frame = None;
        Ok(())
    }
}

pub struct SnapshotSessionFactory {
    source: Source,
}

impl SnapshotSessionFactory {
    pub fn http(user_agent: &str, timeout: Duration) -> Result<Self, SessionError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Launch(e.to_string()))?;
        Ok(SnapshotSessionFactory { source: Source::Http(client) })
    }
}

#[async_trait]
impl SessionFactory for SnapshotSessionFactory {
    async fn open(&self) -> Result<Box<dyn RenderSession>, SessionError> {
        Ok(Box::new(SnapshotSession::new(self.source.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::extractor::DetailExtractor;
    use crate::pacing::testing::ManualClock;

    const POST: &str = "https://blog.example.com/writer01/223";
    const FRAME: &str = "https://blog.example.com/PostView.naver?blogId=writer01&logNo=223";

    fn pages() -> HashMap<String, String> {
        HashMap::from([
            (POST.to_string(), r#"<html><body><iframe id="mainFrame" src="/PostView.naver?blogId=writer01&amp;logNo=223"></iframe></body></html>"#.to_string()),
            (FRAME.to_string(), r#"<html><body>
                <div class="se-module-text"><span>조회 2,048</span></div>
                <span class="u_cbox_count">댓글 12</span>
                <em class="u_likeit_text">77</em>
            </body></html>"#.to_string()),
        ])
    }

    #[tokio::test]
    async fn follows_content_frame() {
        let mut s = SnapshotSession::new(Source::Fixtures(pages()));
        s.navigate(POST).await.unwrap();
        assert_eq!(s.find(SelectorKind::Id, "mainFrame").await.unwrap().len(), 1);
        s.enter_frame("mainFrame").await.unwrap();
        let found = s.find(SelectorKind::ClassName, "se-module-text").await.unwrap();
        assert_eq!(found, vec![Element::new("조회 2,048")]);
        s.exit_frame();
        assert!(s.find(SelectorKind::ClassName, "se-module-text").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn extractor_reads_fixture_post() {
        let ex = DetailExtractor::new(ManualClock::new());
        let mut s = SnapshotSession::new(Source::Fixtures(pages()));
        let res = ex.extract(&mut s, POST).await;
        assert_eq!((res.views, res.comments, res.likes), (2048, 12, 77));
    }

    #[tokio::test]
    async fn invalid_selector_is_a_query_error() {
        let mut s = SnapshotSession::new(Source::Fixtures(pages()));
        s.navigate(POST).await.unwrap();
        assert!(matches!(s.find(SelectorKind::Css, "[[").await, Err(SessionError::Query(_))));
    }
}

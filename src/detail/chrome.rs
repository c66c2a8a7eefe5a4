use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::session::{Element, RenderSession, SelectorKind, SessionError, SessionFactory};

const VIEWPORT: (u32, u32) = (1920, 1080);

/// Launches one Chromium per session: fixed viewport, custom user agent, automation flag hidden.
pub struct ChromeSessionFactory {
    user_agent: String,
    headless: bool,
    nav_timeout: Duration,
}

impl ChromeSessionFactory {
    pub fn new(user_agent: impl Into<String>, headless: bool, nav_timeout: Duration) -> Self {
        ChromeSessionFactory { user_agent: user_agent.into(), headless, nav_timeout }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn RenderSession>, SessionError> {
        let mut builder = BrowserConfig::builder()
            .window_size(VIEWPORT.0, VIEWPORT.1)
            .no_sandbox()
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--disable-blink-features=AutomationControlled");
        if !self.headless { builder = builder.with_head(); }
        let config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| SessionError::Launch(e.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(ev) = handler.next().await {
                if ev.is_err() { break; }
            }
        });
        let page = match browser.new_page("about:blank").await {
            Ok(p) => p,
            Err(e) => { handler.abort(); return Err(SessionError::Launch(e.to_string())); }
        };
        tracing::debug!(headless = self.headless, "chromium session started");
        Ok(Box::new(ChromeSession { browser: Some(browser), page: Some(page), handler, frame: None, nav_timeout: self.nav_timeout }))
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: JoinHandle<()>,
    frame: Option<String>,
    nav_timeout: Duration,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, SessionError> {
        self.page.as_ref().ok_or(SessionError::Closed)
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, js: String) -> Result<T, SessionError> {
        let res = self.page()?.evaluate(js).await.map_err(|e| SessionError::Query(e.to_string()))?;
        res.into_value::<T>().map_err(|e| SessionError::Query(e.to_string()))
    }
}

/// JS expression for the document queries run against.
fn root_expr(frame: Option<&str>) -> Result<String, SessionError> {
    match frame {
        None => Ok("document".to_string()),
        Some(id) => {
            let id = serde_json::to_string(id).map_err(|e| SessionError::Query(e.to_string()))?;
            Ok(format!("(() => {{ const f = document.getElementById({id}); return f && f.contentDocument ? f.contentDocument : null; }})()"))
        }
    }
}

fn query_script(root: &str, css: &str) -> Result<String, SessionError> {
    let css = serde_json::to_string(css).map_err(|e| SessionError::Query(e.to_string()))?;
    Ok(format!(
        "(() => {{ const root = {root}; if (!root) return null; \
         return Array.from(root.querySelectorAll({css})).map(e => (e.innerText || e.textContent || '').trim()); }})()"
    ))
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.frame = None;
        let nav_err = |message: String| SessionError::Navigation { url: url.to_string(), message };
        let page = self.page()?;
        match tokio::time::timeout(self.nav_timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(nav_err(e.to_string())),
            Err(_) => Err(nav_err(format!("timed out after {}s", self.nav_timeout.as_secs()))),
        }
    }

    async fn find(&self, kind: SelectorKind, selector: &str) -> Result<Vec<Element>, SessionError> {
        let js = query_script(&root_expr(self.frame.as_deref())?, &kind.to_css(selector))?;
        match self.eval::<Option<Vec<String>>>(js).await? {
            Some(texts) => Ok(texts.into_iter().map(Element::new).collect()),
            None => Err(SessionError::Query("content frame is no longer attached".into())),
        }
    }

    async fn enter_frame(&mut self, id: &str) -> Result<(), SessionError> {
        let check = format!("(() => {{ const r = {}; return r !== null; }})()", root_expr(Some(id))?);
        if self.eval::<bool>(check).await? {
            self.frame = Some(id.to_string());
            Ok(())
        } else {
            Err(SessionError::Query(format!("frame '{id}' has no accessible document")))
        }
    }

    fn exit_frame(&mut self) { self.frame = None; }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.page = None;
        let Some(mut browser) = self.browser.take() else { return Ok(()); };
        let res = browser.close().await.map(|_| ()).map_err(|e| SessionError::Query(e.to_string()));
        let _ = browser.wait().await;
        self.handler.abort();
        res
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

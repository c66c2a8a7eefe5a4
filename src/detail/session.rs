use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start rendering session: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("dom query failed: {0}")]
    Query(String),

    #[error("rendering session is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind { Css, ClassName, TagName, Id }

impl SelectorKind {
    pub fn to_css(self, selector: &str) -> String {
        match self {
            SelectorKind::Css | SelectorKind::TagName => selector.to_string(),
            SelectorKind::ClassName => format!(".{}", selector.trim()),
            SelectorKind::Id => format!("#{}", selector.trim()),
        }
    }
}

/// Text snapshot of one matched node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub text: String,
}

impl Element {
    pub fn new(text: impl Into<String>) -> Self { Element { text: text.into() } }
}

/// A single-owner browser-like context. Queries run against the current frame,
/// which is the top-level document unless `enter_frame` succeeded.
#[async_trait]
pub trait RenderSession: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;
    async fn find(&self, kind: SelectorKind, selector: &str) -> Result<Vec<Element>, SessionError>;
    async fn enter_frame(&mut self, id: &str) -> Result<(), SessionError>;
    /// Back to the top-level document. Idempotent.
    fn exit_frame(&mut self);
    async fn close(&mut self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderSession>, SessionError>;
}

/// Scoped frame context. Dropping the scope always returns the session to the
/// top-level document, whichever way the caller leaves.
pub struct FrameScope<'a> {
    session: &'a mut dyn RenderSession,
    entered: bool,
}

impl<'a> FrameScope<'a> {
    pub fn top(session: &'a mut dyn RenderSession) -> Self {
        FrameScope { session, entered: false }
    }

    /// A frame that cannot be entered leaves the scope on the top-level document.
    pub async fn enter(session: &'a mut dyn RenderSession, id: &str) -> Self {
        let entered = match session.enter_frame(id).await {
            Ok(()) => true,
            Err(e) => { tracing::debug!(frame = id, error = %e, "frame switch failed; using top-level document"); false }
        };
        FrameScope { session, entered }
    }

    pub fn in_frame(&self) -> bool { self.entered }

    pub fn session(&self) -> &dyn RenderSession { &*self.session }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        self.session.exit_frame();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{StubPage, StubSession, Visit};
    use super::*;

    #[test]
    fn selector_kinds_map_to_css() {
        assert_eq!(SelectorKind::ClassName.to_css("se-f"), ".se-f");
        assert_eq!(SelectorKind::Id.to_css("mainFrame"), "#mainFrame");
        assert_eq!(SelectorKind::TagName.to_css("button"), "button");
        assert_eq!(SelectorKind::Css.to_css(".btn_sympathy .count"), ".btn_sympathy .count");
    }

    #[tokio::test]
    async fn frame_scope_resets_on_drop() {
        let page = StubPage::default().with_frame(".se-f", &["조회 3"]);
        let mut s = StubSession::single("u", Visit::Page(page));
        s.navigate("u").await.unwrap();
        {
            let scope = FrameScope::enter(&mut s, "mainFrame").await;
            assert!(scope.in_frame());
            let found = scope.session().find(SelectorKind::ClassName, "se-f").await.unwrap();
            assert_eq!(found, vec![Element::new("조회 3")]);
        }
        assert!(!s.in_frame());
    }

    #[tokio::test]
    async fn failed_enter_stays_on_top_document() {
        let mut s = StubSession::single("u", Visit::Page(StubPage::default().with_top(".se-f", &["top"])));
        s.navigate("u").await.unwrap();
        let scope = FrameScope::enter(&mut s, "mainFrame").await;
        assert!(!scope.in_frame());
        let found = scope.session().find(SelectorKind::ClassName, "se-f").await.unwrap();
        assert_eq!(found, vec![Element::new("top")]);
    }
}

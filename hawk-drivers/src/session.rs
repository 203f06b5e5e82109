use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

/// Failures reported by a page session.
///
/// Element absence is not an error: lookups return `Ok(None)` or an empty
/// list, so callers can tell "not on the page" apart from "the browser did
/// not answer".
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("timed out after {0:?}: {1}")]
    Timeout(Duration, String),

    #[error("element is not interactable: {0}")]
    NotInteractable(String),

    #[error("script failed: {0}")]
    Script(String),

    #[error("webdriver command failed: {0}")]
    Command(String),
}

/// A single live page exposing element queries and interaction primitives.
///
/// Implementations must bound every wait. A session is driven by one caller
/// at a time; methods take `&self` so a session can be shared behind an
/// `Arc` between the listing, detail and form components that take turns
/// using it.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Opaque handle to an element on the current page.
    type Element: Clone + Debug + Send + Sync;

    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    async fn current_url(&self) -> Result<String, SessionError>;

    /// First element matching `selector`, without waiting.
    async fn find(&self, selector: &str) -> Result<Option<Self::Element>, SessionError>;

    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, SessionError>;

    /// Wait up to `timeout` for `selector` to appear.
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Self::Element>, SessionError>;

    async fn find_in(
        &self,
        scope: &Self::Element,
        selector: &str,
    ) -> Result<Option<Self::Element>, SessionError>;

    async fn find_all_in(
        &self,
        scope: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>, SessionError>;

    async fn text(&self, element: &Self::Element) -> Result<String, SessionError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    /// DOM property such as `value`, `scrollHeight` or `checked`.
    async fn property(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    async fn is_displayed(&self, element: &Self::Element) -> Result<bool, SessionError>;

    async fn click(&self, element: &Self::Element) -> Result<(), SessionError>;

    /// Replace the element's value. Select elements pick the option whose
    /// label matches `text`.
    async fn set_value(&self, element: &Self::Element, text: &str) -> Result<(), SessionError>;

    /// Attach a local file to a file input.
    async fn upload_file(&self, element: &Self::Element, path: &Path)
        -> Result<(), SessionError>;

    /// Set the element's vertical scroll offset.
    async fn scroll_to(&self, element: &Self::Element, offset: i64) -> Result<(), SessionError>;
}

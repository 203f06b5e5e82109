//! In-memory scripted page session.
//!
//! Pages are modelled as named views holding flat lists of nodes. Nodes are
//! matched by exact selector string rather than by parsing CSS, which keeps
//! scripted pages short: a node declares the selector constants the code
//! under test will ask for. Clicking a node can switch views, and a node can
//! be tied to a form field so it only shows while that field is empty, which
//! is how required-field error markers behave.
use crate::session::{PageSession, SessionError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Views named `*` are present regardless of the current view.
pub const ANY_VIEW: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeElement {
    pub id: usize,
}

/// Declarative description of one scripted node.
#[derive(Debug, Clone)]
pub struct FakeNode {
    view: String,
    selectors: Vec<String>,
    parent: Option<usize>,
    name: Option<String>,
    text: String,
    attributes: HashMap<String, String>,
    properties: HashMap<String, String>,
    displayed: bool,
    on_click: Option<String>,
    shown_while_empty: Option<usize>,
    click_fails: bool,
    removed: bool,
}

impl FakeNode {
    pub fn new(view: &str, selector: &str) -> Self {
        Self {
            view: view.to_string(),
            selectors: vec![selector.to_string()],
            parent: None,
            name: None,
            text: String::new(),
            attributes: HashMap::new(),
            properties: HashMap::new(),
            displayed: true,
            on_click: None,
            shown_while_empty: None,
            click_fails: false,
            removed: false,
        }
    }

    pub fn child_of(mut self, parent: &FakeElement) -> Self {
        self.parent = Some(parent.id);
        self
    }

    /// Name recorded in the click log; defaults to the first selector.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn prop(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Clicking this node switches the session to `view`.
    pub fn navigates_to(mut self, view: &str) -> Self {
        self.on_click = Some(view.to_string());
        self
    }

    /// Present only while `field` has no value and is not checked.
    pub fn shown_while_empty(mut self, field: &FakeElement) -> Self {
        self.shown_while_empty = Some(field.id);
        self
    }

    /// Clicks on this node fail as not interactable.
    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }

    fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.selectors.first().cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: Vec<FakeNode>,
    view: String,
    url: String,
    routes: Vec<(String, String)>,
    navigation_failures: HashMap<String, usize>,
    navigations: Vec<String>,
    waits: Vec<(String, Duration)>,
    clicks: Vec<String>,
    scrolls: Vec<(FakeElement, i64)>,
    uploads: Vec<(FakeElement, PathBuf)>,
}

impl State {
    fn is_empty_field(&self, id: usize) -> bool {
        let props = &self.nodes[id].properties;
        let blank = props.get("value").map_or(true, |v| v.trim().is_empty());
        let checked = props.get("checked").is_some_and(|v| v == "true");
        blank && !checked
    }

    fn present(&self, id: usize) -> bool {
        let node = &self.nodes[id];
        if node.removed || (node.view != self.view && node.view != ANY_VIEW) {
            return false;
        }
        if let Some(field) = node.shown_while_empty {
            if !self.is_empty_field(field) {
                return false;
            }
        }
        node.parent.map_or(true, |p| self.present(p))
    }

    fn descends_from(&self, id: usize, ancestor: usize) -> bool {
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }

    fn matching(&self, selector: &str, scope: Option<usize>) -> Vec<FakeElement> {
        (0..self.nodes.len())
            .filter(|&id| self.nodes[id].selectors.iter().any(|s| s == selector))
            .filter(|&id| self.present(id))
            .filter(|&id| scope.map_or(true, |s| self.descends_from(id, s)))
            .map(|id| FakeElement { id })
            .collect()
    }

    fn attached(&self, element: &FakeElement) -> Result<&FakeNode, SessionError> {
        match self.nodes.get(element.id) {
            Some(_) if self.present(element.id) => Ok(&self.nodes[element.id]),
            _ => Err(SessionError::Command(format!(
                "stale element reference: node {}",
                element.id
            ))),
        }
    }
}

/// Scripted [`PageSession`] for tests.
#[derive(Debug)]
pub struct FakeSession {
    state: Mutex<State>,
}

impl FakeSession {
    pub fn new(initial_view: &str) -> Self {
        Self {
            state: Mutex::new(State {
                view: initial_view.to_string(),
                url: "about:blank".to_string(),
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, node: FakeNode) -> FakeElement {
        let mut state = self.lock();
        state.nodes.push(node);
        FakeElement {
            id: state.nodes.len() - 1,
        }
    }

    /// Navigating to any URL starting with `prefix` shows `view`.
    pub fn route(&self, prefix: &str, view: &str) {
        self.lock()
            .routes
            .push((prefix.to_string(), view.to_string()));
    }

    /// The next `times` navigations to URLs starting with `prefix` time out.
    pub fn fail_navigation(&self, prefix: &str, times: usize) {
        self.lock()
            .navigation_failures
            .insert(prefix.to_string(), times);
    }

    pub fn show(&self, view: &str) {
        self.lock().view = view.to_string();
    }

    pub fn current_view(&self) -> String {
        self.lock().view.clone()
    }

    pub fn remove(&self, element: &FakeElement) {
        self.lock().nodes[element.id].removed = true;
    }

    pub fn value_of(&self, element: &FakeElement) -> Option<String> {
        self.lock().nodes[element.id].properties.get("value").cloned()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Selector and timeout of every `wait_for` call, in order.
    pub fn waits(&self) -> Vec<(String, Duration)> {
        self.lock().waits.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    pub fn scrolls(&self) -> Vec<(FakeElement, i64)> {
        self.lock().scrolls.clone()
    }

    pub fn uploads(&self) -> Vec<(FakeElement, PathBuf)> {
        self.lock().uploads.clone()
    }
}

#[async_trait]
impl PageSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.navigations.push(url.to_string());

        let failing = state
            .navigation_failures
            .iter_mut()
            .find(|(prefix, left)| url.starts_with(prefix.as_str()) && **left > 0);
        if let Some((_, left)) = failing {
            *left -= 1;
            return Err(SessionError::Timeout(
                Duration::from_secs(30),
                format!("navigating to {url}"),
            ));
        }

        let view = state
            .routes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, view)| view.clone())
            .ok_or_else(|| SessionError::Command(format!("no route for {url}")))?;
        state.view = view;
        state.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.lock().url.clone())
    }

    async fn find(&self, selector: &str) -> Result<Option<FakeElement>, SessionError> {
        Ok(self.lock().matching(selector, None).into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeElement>, SessionError> {
        Ok(self.lock().matching(selector, None))
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<FakeElement>, SessionError> {
        self.lock().waits.push((selector.to_string(), timeout));
        self.find(selector).await
    }

    async fn find_in(
        &self,
        scope: &FakeElement,
        selector: &str,
    ) -> Result<Option<FakeElement>, SessionError> {
        let state = self.lock();
        state.attached(scope)?;
        Ok(state.matching(selector, Some(scope.id)).into_iter().next())
    }

    async fn find_all_in(
        &self,
        scope: &FakeElement,
        selector: &str,
    ) -> Result<Vec<FakeElement>, SessionError> {
        let state = self.lock();
        state.attached(scope)?;
        Ok(state.matching(selector, Some(scope.id)))
    }

    async fn text(&self, element: &FakeElement) -> Result<String, SessionError> {
        Ok(self.lock().attached(element)?.text.clone())
    }

    async fn attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        Ok(self.lock().attached(element)?.attributes.get(name).cloned())
    }

    async fn property(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        Ok(self.lock().attached(element)?.properties.get(name).cloned())
    }

    async fn is_displayed(&self, element: &FakeElement) -> Result<bool, SessionError> {
        Ok(self.lock().attached(element)?.displayed)
    }

    async fn click(&self, element: &FakeElement) -> Result<(), SessionError> {
        let mut state = self.lock();
        let node = state.attached(element)?;
        if node.click_fails || !node.displayed {
            return Err(SessionError::NotInteractable(node.label()));
        }
        let label = node.label();
        let next_view = node.on_click.clone();

        state.clicks.push(label);
        state.nodes[element.id]
            .properties
            .insert("checked".to_string(), "true".to_string());
        if let Some(view) = next_view {
            state.view = view;
        }
        Ok(())
    }

    async fn set_value(&self, element: &FakeElement, text: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.attached(element)?;
        state.nodes[element.id]
            .properties
            .insert("value".to_string(), text.to_string());
        Ok(())
    }

    async fn upload_file(&self, element: &FakeElement, path: &Path) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.attached(element)?;
        state.nodes[element.id]
            .properties
            .insert("value".to_string(), path.display().to_string());
        state.uploads.push((*element, path.to_path_buf()));
        Ok(())
    }

    async fn scroll_to(&self, element: &FakeElement, offset: i64) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.attached(element)?;
        state.nodes[element.id]
            .properties
            .insert("scrollTop".to_string(), offset.to_string());
        state.scrolls.push((*element, offset));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_switch_views() {
        let session = FakeSession::new("blank");
        session.route("https://portal.test/jobs", "listing");
        session.add(FakeNode::new("listing", "li.tile"));
        session.add(FakeNode::new("listing", "li.tile"));

        assert!(session.find_all("li.tile").await.unwrap().is_empty());
        session.navigate("https://portal.test/jobs?page=1").await.unwrap();
        assert_eq!(session.find_all("li.tile").await.unwrap().len(), 2);
        assert!(session.navigate("https://elsewhere.test").await.is_err());
    }

    #[tokio::test]
    async fn scoped_lookup_and_absence() {
        let session = FakeSession::new("page");
        let card = session.add(FakeNode::new("page", ".card"));
        session.add(FakeNode::new("page", ".title").child_of(&card).text("Engineer"));
        session.add(FakeNode::new("page", ".title").text("Outside"));

        let title = session.find_in(&card, ".title").await.unwrap().unwrap();
        assert_eq!(session.text(&title).await.unwrap(), "Engineer");
        assert!(session.find_in(&card, ".missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn markers_hide_once_field_is_filled() {
        let session = FakeSession::new("form");
        let input = session.add(FakeNode::new("form", "input"));
        session.add(FakeNode::new("form", ".error").shown_while_empty(&input));

        assert!(session.find(".error").await.unwrap().is_some());
        session.set_value(&input, "5").await.unwrap();
        assert!(session.find(".error").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn detached_handles_are_stale() {
        let session = FakeSession::new("a");
        let button = session.add(FakeNode::new("a", "button").navigates_to("b"));
        session.click(&button).await.unwrap();
        assert_eq!(session.current_view(), "b");
        assert!(session.click(&button).await.is_err());
    }

    #[tokio::test]
    async fn navigation_failures_are_counted_down() {
        let session = FakeSession::new("blank");
        session.route("https://portal.test", "home");
        session.fail_navigation("https://portal.test", 1);

        assert!(matches!(
            session.navigate("https://portal.test").await,
            Err(SessionError::Timeout(..))
        ));
        session.navigate("https://portal.test").await.unwrap();
        assert_eq!(session.navigations().len(), 2);
    }
}

use crate::behavioral::BehavioralEngine;
use crate::session::{PageSession, SessionError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use hawk_config::BrowserConfig;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use webdriver::capabilities::Capabilities;

impl From<CmdError> for SessionError {
    fn from(err: CmdError) -> Self {
        match err {
            CmdError::WaitTimeout => {
                SessionError::Timeout(Duration::ZERO, "wait condition not met".into())
            }
            other => SessionError::Command(other.to_string()),
        }
    }
}

/// Chrome command-line arguments for a session reusing `profile_dir`.
pub fn chrome_arguments(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--disable-plugins-discovery".to_string(),
        "--window-size=1920,1080".to_string(),
        "--lang=en-US".to_string(),
        format!(
            "--user-data-dir={}",
            config.resolved_profile_dir().display()
        ),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// Render a DOM property value returned by a script as text.
fn property_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

/// [`PageSession`] backed by a `fantoccini` WebDriver client.
pub struct WebDriverSession {
    client: Client,
    behavioral_engine: BehavioralEngine,
    page_load_timeout: Duration,
}

impl WebDriverSession {
    /// Connect to a running WebDriver service (Chromedriver by default).
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": chrome_arguments(config) }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .with_context(|| format!("failed to connect to webdriver at {}", config.webdriver_url))?;

        tracing::info!(
            target: "browser.session",
            webdriver = %config.webdriver_url,
            headless = config.headless,
            "webdriver session started"
        );

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::new(),
            page_load_timeout: Duration::from_millis(config.page_load_timeout_ms),
        })
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    fn first_or_none(found: Result<Vec<Element>, CmdError>) -> Result<Option<Element>, SessionError> {
        Ok(found?.into_iter().next())
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.behavioral_engine.random_delay(300, 1200).await;
        match tokio::time::timeout(self.page_load_timeout, self.client.goto(url)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SessionError::Timeout(
                self.page_load_timeout,
                format!("navigating to {url}"),
            )),
        }
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn find(&self, selector: &str) -> Result<Option<Element>, SessionError> {
        Self::first_or_none(self.client.find_all(Locator::Css(selector)).await)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SessionError> {
        Ok(self.client.find_all(Locator::Css(selector)).await?)
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Element>, SessionError> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(element) => Ok(Some(element)),
            Err(CmdError::WaitTimeout) => Ok(None),
            Err(err) if err.is_no_such_element() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_in(&self, scope: &Element, selector: &str) -> Result<Option<Element>, SessionError> {
        Self::first_or_none(scope.find_all(Locator::Css(selector)).await)
    }

    async fn find_all_in(&self, scope: &Element, selector: &str) -> Result<Vec<Element>, SessionError> {
        Ok(scope.find_all(Locator::Css(selector)).await?)
    }

    async fn text(&self, element: &Element) -> Result<String, SessionError> {
        Ok(element.text().await?)
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, SessionError> {
        Ok(element.attr(name).await?)
    }

    async fn property(&self, element: &Element, name: &str) -> Result<Option<String>, SessionError> {
        // `Element::prop` rejects numeric values, and layout metrics are numbers.
        let target = serde_json::to_value(element).map_err(|e| SessionError::Script(e.to_string()))?;
        let value = self
            .client
            .execute("return arguments[0][arguments[1]];", vec![target, json!(name)])
            .await?;
        Ok(property_text(value))
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool, SessionError> {
        Ok(element.is_displayed().await?)
    }

    async fn click(&self, element: &Element) -> Result<(), SessionError> {
        self.behavioral_engine.random_delay(100, 400).await;
        element.click().await.map_err(|err| {
            if err.to_string().contains("not interactable") {
                SessionError::NotInteractable(err.to_string())
            } else {
                SessionError::from(err)
            }
        })
    }

    async fn set_value(&self, element: &Element, text: &str) -> Result<(), SessionError> {
        if element.tag_name().await?.eq_ignore_ascii_case("select") {
            return Ok(element.select_by_label(text).await?);
        }
        element.clear().await?;
        self.behavioral_engine
            .type_text_human_like(element, text)
            .await
            .map_err(|e| SessionError::Command(e.to_string()))
    }

    async fn upload_file(&self, element: &Element, path: &Path) -> Result<(), SessionError> {
        let path = path
            .to_str()
            .ok_or_else(|| SessionError::Command(format!("non UTF-8 path: {}", path.display())))?;
        Ok(element.send_keys(path).await?)
    }

    async fn scroll_to(&self, element: &Element, offset: i64) -> Result<(), SessionError> {
        let target = serde_json::to_value(element).map_err(|e| SessionError::Script(e.to_string()))?;
        self.client
            .execute("arguments[0].scrollTop = arguments[1];", vec![target, json!(offset)])
            .await?;
        Ok(())
    }
}

use super::selectors as sel;
use crate::error::{PortalError, SessionResultExt};
use crate::traits::Authenticator;
use async_trait::async_trait;
use hawk_drivers::PageSession;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Checks that the browser profile already holds a LinkedIn login.
///
/// Signing in is left to the user: the profile directory keeps the cookies
/// between runs.
pub struct LinkedInAuthenticator<S: PageSession> {
    session: Arc<S>,
    timeout: Duration,
}

impl<S: PageSession> LinkedInAuthenticator<S> {
    pub fn new(session: Arc<S>, timeout: Duration) -> Self {
        Self { session, timeout }
    }
}

#[async_trait]
impl<S: PageSession + 'static> Authenticator for LinkedInAuthenticator<S> {
    async fn ensure_logged_in(&self) -> Result<(), PortalError> {
        self.session
            .navigate(sel::FEED_URL)
            .await
            .map_err(|e| PortalError::Auth(format!("feed unreachable: {e}")))?;

        let url = self.session.current_url().await.navigation("current url")?;
        if url.contains("/login") || url.contains("/authwall") || url.contains("/checkpoint") {
            return Err(PortalError::Auth(format!(
                "session is not signed in (redirected to {url})"
            )));
        }

        self.session
            .wait_for(sel::GLOBAL_NAV, self.timeout)
            .await
            .map_err(|e| PortalError::Auth(format!("feed did not load: {e}")))?
            .ok_or_else(|| PortalError::Auth("signed-in navigation is missing".into()))?;
        info!(target: "portal.linkedin", "signed-in session confirmed");
        Ok(())
    }
}

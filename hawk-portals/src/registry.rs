//! The single place where a portal name turns into concrete components.
use crate::answers::AnswerSource;
use crate::error::RegistryError;
use crate::linkedin;
use crate::traits::{ApplicationFormDriver, Authenticator, JobDetailNavigator, JobListingSource};
use hawk_config::{HawkConfig, SearchConfig};
use hawk_drivers::behavioral::BehavioralEngine;
use hawk_drivers::scroll::ScrollPlan;
use hawk_drivers::PageSession;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Portals compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Portal {
    LinkedIn,
}

impl Portal {
    pub const ALL: [Portal; 1] = [Portal::LinkedIn];

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Portal::LinkedIn => "linkedin",
        }
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a portal binding needs besides the session.
#[derive(Clone)]
pub struct PortalSettings {
    pub search: SearchConfig,
    /// Upper bound for every element wait.
    pub element_timeout: Duration,
    pub scroll: ScrollPlan,
    pub behavior: BehavioralEngine,
    pub answers: Arc<dyn AnswerSource>,
}

impl PortalSettings {
    pub fn from_config(config: &HawkConfig, answers: Arc<dyn AnswerSource>) -> Self {
        Self {
            search: config.search.clone(),
            element_timeout: Duration::from_millis(config.browser.element_timeout_ms),
            scroll: ScrollPlan::default(),
            behavior: BehavioralEngine::new(),
            answers,
        }
    }
}

impl fmt::Debug for PortalSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalSettings")
            .field("element_timeout", &self.element_timeout)
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}

/// The components of one portal, all driving the same session.
pub struct PortalBinding<E: Send + Sync> {
    pub portal: Portal,
    pub listing: Box<dyn JobListingSource<Element = E>>,
    pub detail: Box<dyn JobDetailNavigator<Element = E>>,
    pub form: Box<dyn ApplicationFormDriver<Element = E>>,
    pub authenticator: Box<dyn Authenticator>,
}

/// Build the binding for `name`. Unknown names fail closed.
pub fn get_job_portal<S>(
    name: &str,
    session: Arc<S>,
    settings: PortalSettings,
) -> Result<PortalBinding<S::Element>, RegistryError>
where
    S: PageSession + 'static,
{
    let portal =
        Portal::from_name(name).ok_or_else(|| RegistryError::UnknownPortal(name.to_string()))?;
    tracing::info!(target: "portal.registry", portal = %portal, "portal binding resolved");

    match portal {
        Portal::LinkedIn => Ok(PortalBinding {
            portal,
            listing: Box::new(linkedin::LinkedInJobsPage::new(session.clone(), &settings)),
            detail: Box::new(linkedin::LinkedInJobPage::new(session.clone(), &settings)),
            form: Box::new(linkedin::LinkedInApplicationPage::new(session.clone(), &settings)),
            authenticator: Box::new(linkedin::LinkedInAuthenticator::new(
                session,
                settings.element_timeout,
            )),
        }),
    }
}

/// Authenticator for `name` on its own. `element_timeout` bounds the wait for
/// the signed-in page, as [`PortalSettings::element_timeout`] does for a full
/// binding.
pub fn get_authenticator<S>(
    session: Arc<S>,
    name: &str,
    element_timeout: Duration,
) -> Result<Box<dyn Authenticator>, RegistryError>
where
    S: PageSession + 'static,
{
    match Portal::from_name(name) {
        Some(Portal::LinkedIn) => Ok(Box::new(linkedin::LinkedInAuthenticator::new(
            session,
            element_timeout,
        ))),
        None => Err(RegistryError::NotImplemented(name.to_string())),
    }
}

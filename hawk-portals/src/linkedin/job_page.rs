use super::selectors as sel;
use super::{canonical_link, BASE_URL};
use crate::error::{PortalError, SessionResultExt};
use crate::job::{Job, JobContext};
use crate::registry::PortalSettings;
use crate::traits::JobDetailNavigator;
use async_trait::async_trait;
use hawk_drivers::behavioral::BehavioralEngine;
use hawk_drivers::PageSession;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A single LinkedIn posting.
pub struct LinkedInJobPage<S: PageSession> {
    session: Arc<S>,
    timeout: Duration,
    behavior: BehavioralEngine,
}

impl<S: PageSession> LinkedInJobPage<S> {
    pub fn new(session: Arc<S>, settings: &PortalSettings) -> Self {
        Self {
            session,
            timeout: settings.element_timeout,
            behavior: settings.behavior.clone(),
        }
    }

    fn job_url(job: &Job) -> String {
        job.link
            .clone()
            .unwrap_or_else(|| format!("{BASE_URL}/jobs/view/{}/", job.id))
    }

    async fn expand_description(&self) {
        let button = match self.session.find(sel::SEE_MORE).await {
            Ok(Some(button)) => button,
            Ok(None) => return,
            Err(err) => {
                debug!(target: "portal.linkedin", error = %err, "see-more lookup failed");
                return;
            }
        };
        if matches!(self.session.is_displayed(&button).await, Ok(true)) {
            if let Err(err) = self.session.click(&button).await {
                warn!(target: "portal.linkedin", error = %err, "could not expand description");
            }
            self.behavior.random_delay(200, 600).await;
        }
    }
}

#[async_trait]
impl<S: PageSession + 'static> JobDetailNavigator for LinkedInJobPage<S> {
    type Element = S::Element;

    async fn goto_job_page(&self, job: &Job) -> Result<(), PortalError> {
        let url = Self::job_url(job);
        debug!(target: "portal.linkedin", job_id = %job.id, %url, "opening posting");
        self.session.navigate(&url).await.navigation("posting")?;
        self.behavior.random_delay(500, 1500).await;
        Ok(())
    }

    async fn get_job_description(&self, job: &Job) -> Result<String, PortalError> {
        self.expand_description().await;
        let region = self
            .session
            .wait_for(sel::DESCRIPTION, self.timeout)
            .await
            .extraction("description")?
            .ok_or_else(|| {
                PortalError::Extraction(format!("posting {} has no description region", job.id))
            })?;
        let text = self.session.text(&region).await.extraction("description")?;
        Ok(text.trim().to_string())
    }

    async fn get_recruiter_link(&self, _job: &Job) -> Result<Option<String>, PortalError> {
        let Some(link) = self
            .session
            .find(sel::RECRUITER_LINK)
            .await
            .extraction("recruiter")?
        else {
            return Ok(None);
        };
        Ok(self
            .session
            .attribute(&link, "href")
            .await
            .extraction("recruiter link")?
            .and_then(|href| canonical_link(&href)))
    }

    async fn get_apply_button(&self, job_context: &JobContext) -> Result<S::Element, PortalError> {
        let buttons = self
            .session
            .find_all(sel::APPLY_BUTTON)
            .await
            .extraction("apply button")?;
        for button in buttons {
            let text = self.session.text(&button).await.extraction("apply button")?;
            if text.contains(sel::EASY_APPLY_TEXT)
                && self.session.is_displayed(&button).await.extraction("apply button")?
            {
                return Ok(button);
            }
        }
        Err(PortalError::NotFound(format!(
            "posting {} offers no Easy Apply",
            job_context.job().id
        )))
    }

    async fn click_apply_button(&self, job_context: &mut JobContext) -> Result<(), PortalError> {
        let button = match self.get_apply_button(job_context).await {
            Ok(button) => button,
            Err(PortalError::NotFound(what)) => {
                return Err(PortalError::Interaction(format!("apply button vanished: {what}")))
            }
            Err(err) => return Err(err),
        };
        self.session.click(&button).await.interaction("apply button")?;
        self.session
            .wait_for(sel::EASY_APPLY_MODAL, self.timeout)
            .await
            .interaction("application modal")?
            .ok_or_else(|| PortalError::Interaction("application modal did not open".into()))?;
        debug!(
            target: "portal.linkedin",
            job_id = %job_context.job().id,
            attempt_id = %job_context.attempt_id,
            "application modal open"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::ProfileAnswers;
    use crate::job::JobId;
    use hawk_config::SearchConfig;
    use hawk_drivers::fake::{FakeNode, FakeSession};
    use hawk_drivers::scroll::ScrollPlan;

    fn page(session: &Arc<FakeSession>) -> LinkedInJobPage<FakeSession> {
        let settings = PortalSettings {
            search: SearchConfig::default(),
            element_timeout: Duration::from_millis(10),
            scroll: ScrollPlan::default(),
            behavior: BehavioralEngine::instant(),
            answers: Arc::new(ProfileAnswers::default()),
        };
        LinkedInJobPage::new(session.clone(), &settings)
    }

    fn job() -> Job {
        Job::new(JobId::new("3901"), "Rust Engineer", "Ferris GmbH")
    }

    #[tokio::test]
    async fn navigates_by_id_when_no_link_is_known() {
        let session = Arc::new(FakeSession::new("blank"));
        session.route("https://www.linkedin.com/jobs/view/", "posting");
        page(&session).goto_job_page(&job()).await.unwrap();
        assert_eq!(
            session.navigations(),
            vec!["https://www.linkedin.com/jobs/view/3901/".to_string()]
        );
        assert_eq!(session.current_view(), "posting");
    }

    #[tokio::test]
    async fn description_is_expanded_before_reading() {
        let session = Arc::new(FakeSession::new("posting"));
        session.add(FakeNode::new("posting", sel::SEE_MORE).named("see more"));
        session.add(FakeNode::new("posting", sel::DESCRIPTION).text("  Build the crawler.\n"));

        let text = page(&session).get_job_description(&job()).await.unwrap();
        assert_eq!(text, "Build the crawler.");
        assert_eq!(session.clicks(), vec!["see more".to_string()]);
    }

    #[tokio::test]
    async fn empty_description_is_valid_but_missing_region_is_not() {
        let session = Arc::new(FakeSession::new("posting"));
        let region = session.add(FakeNode::new("posting", sel::DESCRIPTION));
        let page = page(&session);
        assert_eq!(page.get_job_description(&job()).await.unwrap(), "");

        session.remove(&region);
        assert!(matches!(
            page.get_job_description(&job()).await,
            Err(PortalError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn recruiter_absence_is_none() {
        let session = Arc::new(FakeSession::new("posting"));
        assert_eq!(page(&session).get_recruiter_link(&job()).await.unwrap(), None);

        session.add(
            FakeNode::new("posting", sel::RECRUITER_LINK)
                .attr("href", "https://www.linkedin.com/in/ana?trk=hirer"),
        );
        assert_eq!(
            page(&session).get_recruiter_link(&job()).await.unwrap().as_deref(),
            Some("https://www.linkedin.com/in/ana")
        );
    }

    #[tokio::test]
    async fn external_apply_is_not_found() {
        let session = Arc::new(FakeSession::new("posting"));
        session.add(FakeNode::new("posting", sel::APPLY_BUTTON).text("Apply"));
        let ctx = JobContext::new(job());
        assert!(matches!(
            page(&session).get_apply_button(&ctx).await,
            Err(PortalError::NotFound(msg)) if msg.contains("3901")
        ));
    }

    #[tokio::test]
    async fn apply_click_opens_the_modal() {
        let session = Arc::new(FakeSession::new("posting"));
        session.add(
            FakeNode::new("posting", sel::APPLY_BUTTON)
                .text("Easy Apply")
                .named("easy apply")
                .navigates_to("form"),
        );
        session.add(FakeNode::new("form", sel::EASY_APPLY_MODAL));
        let mut ctx = JobContext::new(job());

        page(&session).click_apply_button(&mut ctx).await.unwrap();
        assert_eq!(session.current_view(), "form");
        assert_eq!(session.clicks(), vec!["easy apply".to_string()]);
    }

    #[tokio::test]
    async fn modal_that_never_opens_is_an_interaction_failure() {
        let session = Arc::new(FakeSession::new("posting"));
        session.add(FakeNode::new("posting", sel::APPLY_BUTTON).text("Easy Apply"));
        let mut ctx = JobContext::new(job());
        assert!(matches!(
            page(&session).click_apply_button(&mut ctx).await,
            Err(PortalError::Interaction(_))
        ));
    }
}

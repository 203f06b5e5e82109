use super::selectors as sel;
use crate::answers::AnswerSource;
use crate::error::{PortalError, SessionResultExt};
use crate::job::JobContext;
use crate::registry::PortalSettings;
use crate::traits::{ApplicationFormDriver, FieldFill};
use async_trait::async_trait;
use hawk_drivers::behavioral::BehavioralEngine;
use hawk_drivers::PageSession;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// The Easy Apply modal.
///
/// Every field of a step sits in its own grouping with a label and one or
/// more inputs; the grouping is the element handed to the state machine.
pub struct LinkedInApplicationPage<S: PageSession> {
    session: Arc<S>,
    answers: Arc<dyn AnswerSource>,
    timeout: Duration,
    behavior: BehavioralEngine,
}

impl<S: PageSession> LinkedInApplicationPage<S> {
    pub fn new(session: Arc<S>, settings: &PortalSettings) -> Self {
        Self {
            session,
            answers: settings.answers.clone(),
            timeout: settings.element_timeout,
            behavior: settings.behavior.clone(),
        }
    }

    async fn visible(&self, selector: &str) -> Result<Option<S::Element>, PortalError> {
        let Some(el) = self.session.find(selector).await.interaction(selector)? else {
            return Ok(None);
        };
        if self.session.is_displayed(&el).await.interaction(selector)? {
            Ok(Some(el))
        } else {
            Ok(None)
        }
    }

    async fn next_control(&self) -> Result<Option<S::Element>, PortalError> {
        if let Some(next) = self.visible(sel::NEXT_BUTTON).await? {
            return Ok(Some(next));
        }
        self.visible(sel::REVIEW_BUTTON).await
    }

    async fn label_of(&self, section: &S::Element) -> Result<String, PortalError> {
        let Some(label) = self
            .session
            .find_in(section, sel::FIELD_LABEL)
            .await
            .interaction("field label")?
        else {
            return Ok(String::new());
        };
        let text = self.session.text(&label).await.interaction("field label")?;
        Ok(text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string())
    }

    async fn has_value(&self, input: &S::Element) -> Result<bool, PortalError> {
        Ok(self
            .session
            .property(input, "value")
            .await
            .interaction("field value")?
            .is_some_and(|v| !v.trim().is_empty()))
    }

    async fn fill_upload(
        &self,
        input: &S::Element,
        label: &str,
        ctx: &mut JobContext,
    ) -> Result<FieldFill, PortalError> {
        if self.has_value(input).await? {
            return Ok(FieldFill::AlreadySet);
        }
        let Some(path) = self.answers.document(label) else {
            return Ok(FieldFill::NoAnswer);
        };
        self.session
            .upload_file(input, &path)
            .await
            .interaction("file upload")?;
        ctx.record_answer(label, path.display().to_string());
        Ok(FieldFill::Uploaded)
    }

    async fn fill_radio(
        &self,
        options: &[S::Element],
        label: &str,
        ctx: &mut JobContext,
    ) -> Result<FieldFill, PortalError> {
        for option in options {
            let checked = self
                .session
                .property(option, "checked")
                .await
                .interaction("radio state")?;
            if checked.as_deref() == Some("true") {
                return Ok(FieldFill::AlreadySet);
            }
        }
        let Some(answer) = self.answers.answer(label) else {
            return Ok(FieldFill::NoAnswer);
        };
        for option in options {
            let value = self
                .session
                .attribute(option, "value")
                .await
                .interaction("radio option")?
                .unwrap_or_default();
            if value.trim().eq_ignore_ascii_case(answer.trim()) {
                self.session.click(option).await.interaction("radio option")?;
                ctx.record_answer(label, answer);
                return Ok(FieldFill::Filled);
            }
        }
        debug!(target: "portal.linkedin", question = label, %answer, "answer matches no option");
        Ok(FieldFill::NoAnswer)
    }

    async fn fill_text(
        &self,
        input: &S::Element,
        label: &str,
        ctx: &mut JobContext,
    ) -> Result<FieldFill, PortalError> {
        if self.has_value(input).await? {
            return Ok(FieldFill::AlreadySet);
        }
        let Some(answer) = self.answers.answer(label) else {
            return Ok(FieldFill::NoAnswer);
        };
        self.session
            .set_value(input, &answer)
            .await
            .interaction("field input")?;
        self.behavior.random_delay(100, 400).await;
        ctx.record_answer(label, answer);
        Ok(FieldFill::Filled)
    }
}

#[async_trait]
impl<S: PageSession + 'static> ApplicationFormDriver for LinkedInApplicationPage<S> {
    type Element = S::Element;

    async fn has_next_button(&self) -> Result<bool, PortalError> {
        Ok(self.next_control().await?.is_some())
    }

    async fn click_next_button(&self) -> Result<(), PortalError> {
        let button = self
            .next_control()
            .await?
            .ok_or_else(|| PortalError::Interaction("next button is gone".into()))?;
        self.session.click(&button).await.interaction("next button")?;
        self.behavior.random_delay(400, 1000).await;
        Ok(())
    }

    async fn has_submit_button(&self) -> Result<bool, PortalError> {
        Ok(self.visible(sel::SUBMIT_BUTTON).await?.is_some())
    }

    async fn click_submit_button(&self) -> Result<(), PortalError> {
        let button = self
            .visible(sel::SUBMIT_BUTTON)
            .await?
            .ok_or_else(|| PortalError::Interaction("submit button is gone".into()))?;
        self.session.click(&button).await.interaction("submit button")?;
        info!(target: "portal.linkedin", "application submitted");

        // The confirmation dialog is informational; closing it is best effort.
        self.behavior.random_delay(800, 1600).await;
        if let Ok(Some(dismiss)) = self.session.find(sel::DISMISS).await {
            let _ = self.session.click(&dismiss).await;
        }
        Ok(())
    }

    async fn check_for_errors(&self) -> Result<(), PortalError> {
        let markers = self
            .session
            .find_all(sel::FIELD_ERROR)
            .await
            .interaction("error markers")?;
        let mut details = Vec::new();
        for marker in &markers {
            if !self.session.is_displayed(marker).await.interaction("error marker")? {
                continue;
            }
            let text = self.session.text(marker).await.interaction("error marker")?;
            let text = text.trim();
            details.push(if text.is_empty() {
                "field requires attention".to_string()
            } else {
                text.to_string()
            });
        }
        if details.is_empty() {
            Ok(())
        } else {
            Err(PortalError::Validation(details))
        }
    }

    async fn handle_errors(&self, job_context: &mut JobContext) -> Result<(), PortalError> {
        for section in self.get_input_elements().await? {
            if self
                .session
                .find_in(&section, sel::FIELD_ERROR)
                .await
                .interaction("field error")?
                .is_none()
            {
                continue;
            }
            let label = self.label_of(&section).await?;
            match self.fill_field(&section, job_context).await? {
                FieldFill::Filled | FieldFill::Uploaded => {
                    debug!(target: "portal.linkedin", question = %label, "flagged field answered");
                }
                // A flagged field that already holds a value was rejected
                // as entered; there is nothing better to put there.
                FieldFill::NoAnswer | FieldFill::AlreadySet => {
                    let name = if label.is_empty() { "unlabelled field".to_string() } else { label };
                    return Err(PortalError::Unresolvable(name));
                }
            }
        }
        Ok(())
    }

    async fn get_input_elements(&self) -> Result<Vec<S::Element>, PortalError> {
        let Some(modal) = self
            .session
            .find(sel::EASY_APPLY_MODAL)
            .await
            .interaction("application modal")?
        else {
            return Err(PortalError::Interaction("application modal is not open".into()));
        };
        self.session
            .find_all_in(&modal, sel::FORM_SECTION)
            .await
            .interaction("form fields")
    }

    async fn is_upload_field(&self, element: &S::Element) -> Result<bool, PortalError> {
        Ok(self
            .session
            .find_in(element, sel::FILE_INPUT)
            .await
            .interaction("file input")?
            .is_some())
    }

    async fn fill_field(
        &self,
        element: &S::Element,
        job_context: &mut JobContext,
    ) -> Result<FieldFill, PortalError> {
        let label = self.label_of(element).await?;

        if self.is_upload_field(element).await? {
            if let Some(input) = self
                .session
                .find_in(element, sel::FILE_INPUT)
                .await
                .interaction("file input")?
            {
                return self.fill_upload(&input, &label, job_context).await;
            }
        }

        let options = self
            .session
            .find_all_in(element, sel::RADIO_INPUT)
            .await
            .interaction("radio options")?;
        if !options.is_empty() {
            return self.fill_radio(&options, &label, job_context).await;
        }

        match self
            .session
            .find_in(element, sel::FIELD_INPUT)
            .await
            .interaction("field input")?
        {
            Some(input) => self.fill_text(&input, &label, job_context).await,
            None => Ok(FieldFill::AlreadySet),
        }
    }

    async fn discard_application(&self) -> Result<(), PortalError> {
        let Some(dismiss) = self.session.find(sel::DISMISS).await.interaction("dismiss")? else {
            return Ok(());
        };
        self.session.click(&dismiss).await.interaction("dismiss")?;
        if let Some(confirm) = self
            .session
            .wait_for(sel::DISCARD_CONFIRM, self.timeout)
            .await
            .interaction("discard confirmation")?
        {
            self.session
                .click(&confirm)
                .await
                .interaction("discard confirmation")?;
        }
        debug!(target: "portal.linkedin", "application discarded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::ProfileAnswers;
    use crate::job::{Job, JobId};
    use hawk_config::SearchConfig;
    use hawk_drivers::fake::{FakeElement, FakeNode, FakeSession};
    use hawk_drivers::scroll::ScrollPlan;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    const STEP: &str = "step";

    fn driver(session: &Arc<FakeSession>) -> LinkedInApplicationPage<FakeSession> {
        let answers = BTreeMap::from([
            ("Mobile phone number".to_string(), "555-0100".to_string()),
            ("Authorized to work in the EU".to_string(), "Yes".to_string()),
        ]);
        let documents = BTreeMap::from([("Resume".to_string(), PathBuf::from("/srv/cv.pdf"))]);
        let settings = PortalSettings {
            search: SearchConfig::default(),
            element_timeout: Duration::from_millis(10),
            scroll: ScrollPlan::default(),
            behavior: BehavioralEngine::instant(),
            answers: Arc::new(ProfileAnswers::new(&answers, &documents)),
        };
        LinkedInApplicationPage::new(session.clone(), &settings)
    }

    fn ctx() -> JobContext {
        JobContext::new(Job::new(JobId::new("3901"), "Rust Engineer", "Ferris GmbH"))
    }

    fn modal(session: &FakeSession) -> FakeElement {
        session.add(FakeNode::new(STEP, sel::EASY_APPLY_MODAL))
    }

    fn section(session: &FakeSession, modal: &FakeElement, label: &str) -> FakeElement {
        let section = session.add(FakeNode::new(STEP, sel::FORM_SECTION).child_of(modal));
        session.add(FakeNode::new(STEP, sel::FIELD_LABEL).child_of(&section).text(label));
        section
    }

    #[tokio::test]
    async fn fills_text_radio_and_upload_fields() {
        let session = Arc::new(FakeSession::new(STEP));
        let modal = modal(&session);

        let phone = section(&session, &modal, "Mobile phone number*");
        let phone_input = session.add(FakeNode::new(STEP, sel::FIELD_INPUT).child_of(&phone));

        let auth = section(&session, &modal, "Authorized to work in the EU?");
        session.add(FakeNode::new(STEP, sel::RADIO_INPUT).child_of(&auth).attr("value", "No").named("no"));
        session.add(FakeNode::new(STEP, sel::RADIO_INPUT).child_of(&auth).attr("value", "Yes").named("yes"));

        let resume = section(&session, &modal, "Resume");
        session.add(FakeNode::new(STEP, sel::FILE_INPUT).child_of(&resume));

        let form = driver(&session);
        let mut ctx = ctx();
        let fields = form.get_input_elements().await.unwrap();
        assert_eq!(fields.len(), 3);
        assert!(!form.is_upload_field(&fields[0]).await.unwrap());
        assert!(form.is_upload_field(&fields[2]).await.unwrap());

        let mut fills = Vec::new();
        for field in &fields {
            fills.push(form.fill_field(field, &mut ctx).await.unwrap());
        }

        assert_eq!(fills, vec![FieldFill::Filled, FieldFill::Filled, FieldFill::Uploaded]);
        assert_eq!(session.value_of(&phone_input).as_deref(), Some("555-0100"));
        assert_eq!(session.clicks(), vec!["yes".to_string()]);
        assert_eq!(session.uploads().len(), 1);
        assert_eq!(ctx.answers.len(), 3);

        // A second pass leaves answered fields alone.
        for field in &fields {
            assert_eq!(form.fill_field(field, &mut ctx).await.unwrap(), FieldFill::AlreadySet);
        }
    }

    #[tokio::test]
    async fn flagged_field_is_fixed_by_handle_errors() {
        let session = Arc::new(FakeSession::new(STEP));
        let modal = modal(&session);
        let phone = section(&session, &modal, "Mobile phone number");
        let input = session.add(FakeNode::new(STEP, sel::FIELD_INPUT).child_of(&phone));
        session.add(
            FakeNode::new(STEP, sel::FIELD_ERROR)
                .child_of(&phone)
                .text("Enter a valid phone number")
                .shown_while_empty(&input),
        );

        let form = driver(&session);
        let mut ctx = ctx();
        assert!(matches!(
            form.check_for_errors().await,
            Err(PortalError::Validation(d)) if d == vec!["Enter a valid phone number".to_string()]
        ));
        form.handle_errors(&mut ctx).await.unwrap();
        form.check_for_errors().await.unwrap();
        assert_eq!(ctx.answers[0].answer, "555-0100");
    }

    #[tokio::test]
    async fn unanswerable_flagged_field_is_named() {
        let session = Arc::new(FakeSession::new(STEP));
        let modal = modal(&session);
        let salary = section(&session, &modal, "Desired salary\nDesired salary");
        let input = session.add(FakeNode::new(STEP, sel::FIELD_INPUT).child_of(&salary));
        session.add(FakeNode::new(STEP, sel::FIELD_ERROR).child_of(&salary).shown_while_empty(&input));

        let form = driver(&session);
        let mut ctx = ctx();
        assert!(matches!(
            form.handle_errors(&mut ctx).await,
            Err(PortalError::Unresolvable(field)) if field == "Desired salary"
        ));
    }

    #[tokio::test]
    async fn review_counts_as_next_and_hidden_controls_do_not() {
        let session = Arc::new(FakeSession::new(STEP));
        session.add(FakeNode::new(STEP, sel::SUBMIT_BUTTON).hidden());
        session.add(FakeNode::new(STEP, sel::REVIEW_BUTTON).named("review").navigates_to("review"));

        let form = driver(&session);
        assert!(form.has_next_button().await.unwrap());
        assert!(!form.has_submit_button().await.unwrap());
        form.click_next_button().await.unwrap();
        assert_eq!(session.current_view(), "review");
    }

    #[tokio::test]
    async fn discard_dismisses_and_confirms() {
        let session = Arc::new(FakeSession::new(STEP));
        session.add(FakeNode::new(STEP, sel::DISMISS).named("dismiss").navigates_to("confirm"));
        session.add(FakeNode::new("confirm", sel::DISCARD_CONFIRM).named("discard").navigates_to("posting"));

        driver(&session).discard_application().await.unwrap();
        assert_eq!(session.clicks(), vec!["dismiss".to_string(), "discard".to_string()]);
        assert_eq!(session.current_view(), "posting");

        // Nothing open: nothing to do.
        driver(&session).discard_application().await.unwrap();
        assert_eq!(session.clicks().len(), 2);
    }
}

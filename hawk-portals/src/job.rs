use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Portal-assigned identifier of a posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a posting accepts applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMethod {
    /// The portal's own application form.
    Direct,
    /// The application continues on the employer's site.
    ExternalRedirect,
    /// The listing did not say; the detail page decides.
    #[default]
    Unknown,
}

impl ApplyMethod {
    /// Whether the form driver may be attempted for this posting.
    pub fn may_apply_directly(&self) -> bool {
        !matches!(self, ApplyMethod::ExternalRedirect)
    }
}

/// One job posting.
///
/// Built from a listing tile, then enriched once with detail-page data via
/// [`Job::enriched`]. After that it is only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: Option<String>,
    /// Empty until the detail page has been read.
    pub description: String,
    pub recruiter_link: Option<String>,
    pub apply_method: ApplyMethod,
}

impl Job {
    pub fn new(id: JobId, title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            company: company.into(),
            location: String::new(),
            link: None,
            description: String::new(),
            recruiter_link: None,
            apply_method: ApplyMethod::Unknown,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_apply_method(mut self, method: ApplyMethod) -> Self {
        self.apply_method = method;
        self
    }

    /// Attach detail-page data.
    pub fn enriched(self, description: String, recruiter_link: Option<String>) -> Self {
        Self {
            description,
            recruiter_link,
            ..self
        }
    }
}

/// A value entered into the application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnsweredField {
    pub step: usize,
    pub question: String,
    pub answer: String,
}

/// Scratch state for one application attempt.
///
/// Owned by the attempt and dropped when it ends; the job itself cannot be
/// changed through the context.
#[derive(Debug)]
pub struct JobContext {
    job: Job,
    pub attempt_id: Uuid,
    /// Zero-based index of the current form step.
    pub step: usize,
    pub answers: Vec<AnsweredField>,
}

impl JobContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            attempt_id: Uuid::new_v4(),
            step: 0,
            answers: Vec::new(),
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn into_job(self) -> Job {
        self.job
    }

    pub fn record_answer(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.answers.push(AnsweredField {
            step: self.step,
            question: question.into(),
            answer: answer.into(),
        });
    }

    pub fn advance_step(&mut self) {
        self.step += 1;
    }
}

/// How one application attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum ApplicationOutcome {
    Submitted,
    /// The job is skipped; traversal continues.
    RecoverableFailure(String),
    /// The form was left in an unknown state.
    FatalFailure(String),
}

impl ApplicationOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ApplicationOutcome::Submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrichment_keeps_identity() {
        let job = Job::new(JobId::new("4021"), "Rust Engineer", "Ferris GmbH")
            .with_location("Berlin")
            .with_apply_method(ApplyMethod::Direct);
        let enriched = job
            .clone()
            .enriched("Build things.".into(), Some("https://portal.test/in/ana".into()));

        assert_eq!(enriched.id, job.id);
        assert_eq!(enriched.title, job.title);
        assert_eq!(enriched.description, "Build things.");
        assert_eq!(enriched.recruiter_link.as_deref(), Some("https://portal.test/in/ana"));
    }

    #[test]
    fn answers_are_tagged_with_their_step() {
        let mut ctx = JobContext::new(Job::new(JobId::new("1"), "SRE", "Acme"));
        ctx.record_answer("Phone", "555-0100");
        ctx.advance_step();
        ctx.record_answer("Years of experience", "6");

        assert_eq!(ctx.answers[0].step, 0);
        assert_eq!(ctx.answers[1].step, 1);
        assert_eq!(ctx.job().company, "Acme");
    }

    #[test]
    fn external_postings_are_not_direct() {
        assert!(ApplyMethod::Direct.may_apply_directly());
        assert!(ApplyMethod::Unknown.may_apply_directly());
        assert!(!ApplyMethod::ExternalRedirect.may_apply_directly());
    }

    #[test]
    fn outcome_serializes_with_reason() {
        let value = serde_json::to_value(ApplicationOutcome::RecoverableFailure(
            "no answer for salary".into(),
        ))
        .unwrap();
        assert_eq!(value["outcome"], "recoverable_failure");
        assert_eq!(value["reason"], "no answer for salary");
    }
}

//! State machine driving one application attempt through a multi-step form.
//!
//! ```text
//! AwaitingStep ─▶ (ResolvingErrors)* ─▶ AwaitingStep ─▶ … ─▶ AwaitingSubmit ─▶ Submitted
//!        └──────────────── any state ───────────────▶ Aborted
//! ```
//!
//! A step with validation errors gets exactly one `handle_errors` call. If
//! errors remain, or a field has no known answer, the attempt is abandoned
//! without submitting. Failed clicks are never retried: the form state is
//! unknown afterwards and a blind retry can submit twice.
use crate::error::PortalError;
use crate::job::{ApplicationOutcome, JobContext};
use crate::traits::{ApplicationFormDriver, FieldFill};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    AwaitingStep,
    ResolvingErrors,
    AwaitingSubmit,
    Submitted,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    /// Steps allowed before the attempt is abandoned.
    pub max_steps: usize,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self { max_steps: 12 }
    }
}

enum Abort {
    Recoverable(String),
    Fatal(String),
}

impl From<PortalError> for Abort {
    fn from(err: PortalError) -> Self {
        if err.is_fatal_for_attempt() {
            Abort::Fatal(err.to_string())
        } else {
            Abort::Recoverable(err.to_string())
        }
    }
}

/// One pass through an application form.
pub struct ApplicationAttempt<'a, E: Send + Sync> {
    form: &'a dyn ApplicationFormDriver<Element = E>,
    policy: AttemptPolicy,
    cancel: CancellationToken,
    state: FormState,
}

impl<'a, E: Send + Sync> ApplicationAttempt<'a, E> {
    pub fn new(
        form: &'a dyn ApplicationFormDriver<Element = E>,
        policy: AttemptPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            form,
            policy,
            cancel,
            state: FormState::AwaitingStep,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    /// Drive the form until it is submitted or the attempt aborts.
    pub async fn run(&mut self, ctx: &mut JobContext) -> ApplicationOutcome {
        match self.drive(ctx).await {
            Ok(()) => {
                self.transition(FormState::Submitted);
                info!(
                    target: "portal.form",
                    job_id = %ctx.job().id,
                    steps = ctx.step + 1,
                    "application submitted"
                );
                ApplicationOutcome::Submitted
            }
            Err(Abort::Recoverable(reason)) => {
                self.transition(FormState::Aborted);
                warn!(target: "portal.form", job_id = %ctx.job().id, step = ctx.step, %reason, "application abandoned");
                ApplicationOutcome::RecoverableFailure(reason)
            }
            Err(Abort::Fatal(reason)) => {
                self.transition(FormState::Aborted);
                warn!(target: "portal.form", job_id = %ctx.job().id, step = ctx.step, %reason, "application aborted");
                ApplicationOutcome::FatalFailure(reason)
            }
        }
    }

    fn transition(&mut self, next: FormState) {
        if self.state != next {
            debug!(target: "portal.form", from = ?self.state, to = ?next, "form state");
            self.state = next;
        }
    }

    fn ensure_not_cancelled(&self) -> Result<(), Abort> {
        if self.cancel.is_cancelled() {
            return Err(Abort::Fatal("cancelled".to_string()));
        }
        Ok(())
    }

    async fn drive(&mut self, ctx: &mut JobContext) -> Result<(), Abort> {
        loop {
            self.ensure_not_cancelled()?;
            if ctx.step >= self.policy.max_steps {
                return Err(Abort::Recoverable(format!(
                    "form did not reach a submit step within {} steps",
                    self.policy.max_steps
                )));
            }
            self.transition(FormState::AwaitingStep);

            self.fill_visible_fields(ctx).await?;
            self.resolve_errors(ctx).await?;

            // A step offering both controls is the submit step.
            if self.form.has_submit_button().await? {
                self.transition(FormState::AwaitingSubmit);
                if let Err(err) = self.form.check_for_errors().await {
                    return Err(match err {
                        PortalError::Validation(details) => Abort::Recoverable(format!(
                            "submit step still invalid: {}",
                            details.join("; ")
                        )),
                        other => other.into(),
                    });
                }
                self.ensure_not_cancelled()?;
                self.form.click_submit_button().await?;
                return Ok(());
            }

            if !self.form.has_next_button().await? {
                return Err(Abort::Recoverable(format!(
                    "step {} has neither a next nor a submit control",
                    ctx.step + 1
                )));
            }
            self.form.click_next_button().await?;
            ctx.advance_step();
        }
    }

    async fn fill_visible_fields(&self, ctx: &mut JobContext) -> Result<(), Abort> {
        let fields = self.form.get_input_elements().await?;
        let mut filled = 0usize;
        let mut unanswered = 0usize;
        for field in &fields {
            match self.form.fill_field(field, ctx).await? {
                FieldFill::Filled | FieldFill::Uploaded => filled += 1,
                FieldFill::NoAnswer => unanswered += 1,
                FieldFill::AlreadySet => {}
            }
        }
        debug!(
            target: "portal.form",
            step = ctx.step,
            fields = fields.len(),
            filled,
            unanswered,
            "step fields visited"
        );
        Ok(())
    }

    async fn resolve_errors(&mut self, ctx: &mut JobContext) -> Result<(), Abort> {
        let details = match self.form.check_for_errors().await {
            Ok(()) => return Ok(()),
            Err(PortalError::Validation(details)) => details,
            Err(other) => return Err(other.into()),
        };

        self.transition(FormState::ResolvingErrors);
        info!(target: "portal.form", step = ctx.step, errors = ?details, "resolving form errors");
        self.form.handle_errors(ctx).await?;
        self.ensure_not_cancelled()?;

        match self.form.check_for_errors().await {
            Ok(()) => {
                self.transition(FormState::AwaitingStep);
                Ok(())
            }
            Err(PortalError::Validation(remaining)) => Err(Abort::Recoverable(format!(
                "errors remain after resolution: {}",
                remaining.join("; ")
            ))),
            Err(other) => Err(other.into()),
        }
    }
}

//! Drives a portal binding through the configured searches.
//!
//! Every page operation runs sequentially against the one session the
//! binding shares. Failures are contained at the smallest scope that can
//! absorb them: a bad tile is skipped, a job that cannot be applied to is
//! recorded and left behind, and only losing the session (authentication,
//! repeated navigation failure) ends the run with an error.
use crate::application::{ApplicationAttempt, AttemptPolicy};
use crate::error::PortalError;
use crate::job::{AnsweredField, ApplicationOutcome, ApplyMethod, Job, JobContext, JobId};
use crate::registry::PortalBinding;
use hawk_common::retry::{retry_bounded, RetryError};
use hawk_config::{PolicyConfig, SearchConfig};
use serde::Serialize;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Disposition {
    Applied,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job: Job,
    pub disposition: Disposition,
    pub answers: Vec<AnsweredField>,
}

/// Result of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub records: Vec<JobRecord>,
    pub pages_visited: usize,
    pub pages_skipped: usize,
    pub tiles_skipped: usize,
    pub cancelled: bool,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&Disposition) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.disposition)).count()
    }

    pub fn applied(&self) -> usize {
        self.count(|d| matches!(d, Disposition::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|d| matches!(d, Disposition::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|d| matches!(d, Disposition::Failed(_)))
    }
}

enum PageLoad {
    Loaded,
    Failed(String),
    Cancelled,
}

pub struct Orchestrator<E: Send + Sync> {
    binding: PortalBinding<E>,
    search: SearchConfig,
    policy: PolicyConfig,
    cancel: CancellationToken,
}

impl<E: Send + Sync> Orchestrator<E> {
    pub fn new(
        binding: PortalBinding<E>,
        search: SearchConfig,
        policy: PolicyConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            binding,
            search,
            policy,
            cancel,
        }
    }

    /// Authenticate, then traverse every (position, location) search.
    pub async fn run(&self) -> Result<RunSummary, PortalError> {
        self.binding.authenticator.ensure_logged_in().await?;

        let mut summary = RunSummary::default();
        let mut seen: HashSet<JobId> = HashSet::new();
        let mut consecutive_failures = 0usize;

        'searches: for (position, location) in self.search.search_terms() {
            info!(target: "orchestrator", %position, %location, portal = %self.binding.portal, "starting search");

            for page in 0..self.search.max_pages {
                if self.cancel.is_cancelled() {
                    summary.cancelled = true;
                    break 'searches;
                }

                match self.load_page(&position, &location, page).await {
                    PageLoad::Loaded => consecutive_failures = 0,
                    PageLoad::Cancelled => {
                        summary.cancelled = true;
                        break 'searches;
                    }
                    PageLoad::Failed(reason) => {
                        summary.pages_skipped += 1;
                        consecutive_failures += 1;
                        warn!(target: "orchestrator", page, %reason, consecutive_failures, "skipping result page");
                        if consecutive_failures >= self.policy.max_consecutive_page_failures.max(1) {
                            return Err(PortalError::Navigation(format!(
                                "{consecutive_failures} result pages failed in a row; last: {reason}"
                            )));
                        }
                        continue;
                    }
                }
                summary.pages_visited += 1;

                let jobs = match self.collect_jobs(&mut summary).await {
                    Ok((0, _)) => {
                        debug!(target: "orchestrator", page, "no tiles on page; search exhausted");
                        break;
                    }
                    Ok((_, jobs)) => jobs,
                    Err(err) => {
                        warn!(target: "orchestrator", page, error = %err, "could not read result page");
                        summary.pages_skipped += 1;
                        break;
                    }
                };

                for job in jobs {
                    if self.cancel.is_cancelled() {
                        summary.cancelled = true;
                        break 'searches;
                    }
                    if !seen.insert(job.id.clone()) {
                        debug!(target: "orchestrator", job_id = %job.id, "already seen");
                        continue;
                    }
                    let record = match self.screen(&job) {
                        Some(reason) => JobRecord {
                            job,
                            disposition: Disposition::Skipped(reason),
                            answers: Vec::new(),
                        },
                        None => self.apply(job).await,
                    };
                    info!(
                        target: "orchestrator",
                        job_id = %record.job.id,
                        company = %record.job.company,
                        title = %record.job.title,
                        disposition = ?record.disposition,
                        "job done"
                    );
                    summary.records.push(record);
                }
            }
        }

        if self.cancel.is_cancelled() {
            summary.cancelled = true;
        }
        info!(
            target: "orchestrator",
            applied = summary.applied(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            pages = summary.pages_visited,
            cancelled = summary.cancelled,
            "run finished"
        );
        Ok(summary)
    }

    async fn load_page(&self, position: &str, location: &str, page: u32) -> PageLoad {
        let listing = self.binding.listing.as_ref();
        let result = retry_bounded(
            &self.policy.navigation,
            &self.cancel,
            PortalError::is_retryable,
            move |_| listing.next_job_page(position, location, page),
        )
        .await;
        match result {
            Ok(()) => PageLoad::Loaded,
            Err(RetryError::Cancelled) => PageLoad::Cancelled,
            Err(err) => PageLoad::Failed(err.to_string()),
        }
    }

    /// Convert every tile before touching any of them, so applying to one
    /// job cannot invalidate the handles of the others. Returns the raw tile
    /// count alongside the converted jobs.
    async fn collect_jobs(
        &self,
        summary: &mut RunSummary,
    ) -> Result<(usize, Vec<Job>), PortalError> {
        let listing = self.binding.listing.as_ref();
        let tiles = listing.get_jobs_from_page(self.search.scroll).await?;
        let mut jobs = Vec::with_capacity(tiles.len());
        for (index, tile) in tiles.iter().enumerate() {
            match listing.job_tile_to_job(tile).await {
                Ok(job) => jobs.push(job),
                Err(err) => {
                    summary.tiles_skipped += 1;
                    debug!(target: "orchestrator", index, error = %err, "skipping tile");
                }
            }
        }
        Ok((tiles.len(), jobs))
    }

    /// Reason to leave a job alone before opening it.
    fn screen(&self, job: &Job) -> Option<String> {
        let company = job.company.trim().to_lowercase();
        if self
            .search
            .company_blacklist
            .iter()
            .any(|c| c.trim().to_lowercase() == company)
        {
            return Some(format!("company `{}` is blacklisted", job.company));
        }
        let title = job.title.to_lowercase();
        if let Some(word) = self
            .search
            .title_blacklist
            .iter()
            .map(|w| w.trim().to_lowercase())
            .find(|w| !w.is_empty() && title.contains(w.as_str()))
        {
            return Some(format!("title matches blacklisted `{word}`"));
        }
        if job.apply_method == ApplyMethod::ExternalRedirect {
            return Some("applications are taken on an external site".to_string());
        }
        None
    }

    async fn apply(&self, job: Job) -> JobRecord {
        let detail = self.binding.detail.as_ref();

        let job_ref = &job;
        let opened = retry_bounded(
            &self.policy.navigation,
            &self.cancel,
            PortalError::is_retryable,
            move |_| detail.goto_job_page(job_ref),
        )
        .await;
        if let Err(err) = opened {
            let reason = match err {
                RetryError::Cancelled => "cancelled".to_string(),
                other => format!("posting unreachable: {other}"),
            };
            return record(job, Disposition::Failed(reason), Vec::new());
        }

        let description = match detail.get_job_description(&job).await {
            Ok(text) => text,
            Err(PortalError::Extraction(what)) => {
                warn!(target: "orchestrator", job_id = %job.id, %what, "no description");
                String::new()
            }
            Err(err) => return record(job, Disposition::Failed(err.to_string()), Vec::new()),
        };
        let recruiter = detail.get_recruiter_link(&job).await.unwrap_or_else(|err| {
            debug!(target: "orchestrator", job_id = %job.id, error = %err, "recruiter unreadable");
            None
        });
        let mut ctx = JobContext::new(job.enriched(description, recruiter));

        match detail.get_apply_button(&ctx).await {
            Ok(_) => {}
            Err(PortalError::NotFound(reason)) => {
                return record(ctx.into_job(), Disposition::Skipped(reason), Vec::new())
            }
            Err(err) => return record(ctx.into_job(), Disposition::Failed(err.to_string()), Vec::new()),
        }

        let span = info_span!(
            "application",
            job_id = %ctx.job().id,
            attempt_id = %ctx.attempt_id
        );
        let outcome = async {
            if let Err(err) = detail.click_apply_button(&mut ctx).await {
                return ApplicationOutcome::FatalFailure(err.to_string());
            }
            let policy = AttemptPolicy {
                max_steps: self.policy.max_form_steps,
            };
            ApplicationAttempt::new(self.binding.form.as_ref(), policy, self.cancel.clone())
                .run(&mut ctx)
                .await
        }
        .instrument(span)
        .await;

        if !outcome.is_submitted() {
            if let Err(err) = self.binding.form.discard_application().await {
                warn!(target: "orchestrator", job_id = %ctx.job().id, error = %err, "could not discard application");
            }
        }

        let disposition = match outcome {
            ApplicationOutcome::Submitted => Disposition::Applied,
            ApplicationOutcome::RecoverableFailure(reason) => Disposition::Skipped(reason),
            ApplicationOutcome::FatalFailure(reason) => Disposition::Failed(reason),
        };
        let answers = std::mem::take(&mut ctx.answers);
        record(ctx.into_job(), disposition, answers)
    }
}

fn record(job: Job, disposition: Disposition, answers: Vec<AnsweredField>) -> JobRecord {
    JobRecord {
        job,
        disposition,
        answers,
    }
}

//! Contracts between the orchestrator and a portal implementation.
//!
//! Each contract is implemented once per portal. Element handles are opaque
//! to the orchestrator; it only passes them back to the component that
//! produced them.
use crate::error::PortalError;
use crate::job::{Job, JobContext};
use async_trait::async_trait;

/// Listing traversal: search result pages and their tiles.
#[async_trait]
pub trait JobListingSource: Send + Sync {
    type Element: Send + Sync;

    /// Load the result page `page_number` (zero-based) for a search.
    async fn next_job_page(
        &self,
        position: &str,
        location: &str,
        page_number: u32,
    ) -> Result<(), PortalError>;

    /// Tiles currently rendered on the result page, in order. With `scroll`
    /// set, lazily loaded tiles are revealed first. Every call reads the live
    /// page.
    async fn get_jobs_from_page(&self, scroll: bool) -> Result<Vec<Self::Element>, PortalError>;

    /// Read a tile into a [`Job`] without changing the page. Tiles lacking a
    /// title or company fail with [`PortalError::Extraction`].
    async fn job_tile_to_job(&self, tile: &Self::Element) -> Result<Job, PortalError>;
}

/// The detail view of one posting.
#[async_trait]
pub trait JobDetailNavigator: Send + Sync {
    type Element: Send + Sync;

    async fn goto_job_page(&self, job: &Job) -> Result<(), PortalError>;

    /// Full description; an empty description is valid, a missing
    /// description region is [`PortalError::Extraction`].
    async fn get_job_description(&self, job: &Job) -> Result<String, PortalError>;

    /// `Ok(None)` when the posting lists no recruiter.
    async fn get_recruiter_link(&self, job: &Job) -> Result<Option<String>, PortalError>;

    /// [`PortalError::NotFound`] means the job cannot be applied to directly.
    async fn get_apply_button(&self, job_context: &JobContext)
        -> Result<Self::Element, PortalError>;

    /// Start the application; the form driver takes over from here.
    async fn click_apply_button(&self, job_context: &mut JobContext) -> Result<(), PortalError>;
}

/// What filling one field amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFill {
    AlreadySet,
    Filled,
    Uploaded,
    /// No answer is known; left for validation to flag if required.
    NoAnswer,
}

/// A multi-step application form.
#[async_trait]
pub trait ApplicationFormDriver: Send + Sync {
    type Element: Send + Sync;

    async fn has_next_button(&self) -> Result<bool, PortalError>;

    async fn click_next_button(&self) -> Result<(), PortalError>;

    async fn has_submit_button(&self) -> Result<bool, PortalError>;

    async fn click_submit_button(&self) -> Result<(), PortalError>;

    /// Fail with [`PortalError::Validation`] when the current step shows
    /// unresolved fields. Must not change the page.
    async fn check_for_errors(&self) -> Result<(), PortalError>;

    /// Fill flagged fields from the answer source. Fails with
    /// [`PortalError::Unresolvable`] naming the first field without an answer.
    async fn handle_errors(&self, job_context: &mut JobContext) -> Result<(), PortalError>;

    /// Fields of the current step in presentation order.
    async fn get_input_elements(&self) -> Result<Vec<Self::Element>, PortalError>;

    async fn is_upload_field(&self, element: &Self::Element) -> Result<bool, PortalError>;

    /// Answer one field if it is empty and an answer is known.
    async fn fill_field(
        &self,
        element: &Self::Element,
        job_context: &mut JobContext,
    ) -> Result<FieldFill, PortalError>;

    /// Close an unfinished application so the next job starts clean.
    async fn discard_application(&self) -> Result<(), PortalError>;
}

/// Confirms the session may use the portal. Called once before traversal.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn ensure_logged_in(&self) -> Result<(), PortalError>;
}

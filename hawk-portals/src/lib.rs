//! Job-application core: portal contracts, the application form state
//! machine, the portal registry, and the orchestrator that ties listing
//! traversal to per-job application attempts.
//!
//! Data flows one way:
//!
//! ```text
//! registry ─▶ JobListingSource ─▶ Job ─▶ JobDetailNavigator ─▶ ApplicationFormDriver ─▶ outcome
//! ```
//!
//! The [`orchestrator::Orchestrator`] only sees the traits in [`traits`];
//! portal specific page knowledge lives in the portal modules (currently
//! [`linkedin`]) and is selected in exactly one place, [`registry`].
pub mod answers;
pub mod application;
pub mod error;
pub mod job;
pub mod linkedin;
pub mod orchestrator;
pub mod registry;
pub mod traits;

pub use error::{PortalError, RegistryError};
pub use job::{ApplicationOutcome, ApplyMethod, Job, JobContext, JobId};
pub use registry::{get_authenticator, get_job_portal, Portal, PortalBinding, PortalSettings};

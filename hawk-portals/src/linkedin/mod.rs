//! LinkedIn binding: job search listing, posting detail, the Easy Apply
//! modal, and a logged-in session check.
mod application_page;
mod authenticator;
mod job_page;
mod jobs_page;
pub mod selectors;

pub use application_page::LinkedInApplicationPage;
pub use authenticator::LinkedInAuthenticator;
pub use job_page::LinkedInJobPage;
pub use jobs_page::{search_url, LinkedInJobsPage, RESULTS_PER_PAGE};

pub const BASE_URL: &str = "https://www.linkedin.com";

/// Turn a scraped href into an absolute URL without tracking parameters.
pub(crate) fn canonical_link(href: &str) -> Option<String> {
    let base = url::Url::parse(BASE_URL).ok()?;
    let mut url = base.join(href.trim()).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

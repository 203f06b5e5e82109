use super::selectors as sel;
use super::{canonical_link, BASE_URL};
use crate::error::{PortalError, SessionResultExt};
use crate::job::{ApplyMethod, Job, JobId};
use crate::registry::PortalSettings;
use crate::traits::JobListingSource;
use async_trait::async_trait;
use hawk_config::SearchConfig;
use hawk_drivers::behavioral::BehavioralEngine;
use hawk_drivers::scroll::{scroll_progressively, ScrollPlan};
use hawk_drivers::PageSession;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// LinkedIn pages its search results in fixed blocks.
pub const RESULTS_PER_PAGE: u32 = 25;

/// Search URL for one result page.
pub fn search_url(
    search: &SearchConfig,
    position: &str,
    location: &str,
    page_number: u32,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(BASE_URL)?.join("/jobs/search/")?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("keywords", position);
        if !location.is_empty() {
            query.append_pair("location", location);
        }
        if search.remote {
            query.append_pair("f_CF", "f_WRA");
        }
        let levels = search.experience_level.selected();
        if !levels.is_empty() {
            let joined: Vec<String> = levels.iter().map(u8::to_string).collect();
            query.append_pair("f_E", &joined.join(","));
        }
        query.append_pair("distance", &search.distance.to_string());
        let types = search.job_types.selected();
        if !types.is_empty() {
            let joined: Vec<String> = types.iter().map(char::to_string).collect();
            query.append_pair("f_JT", &joined.join(","));
        }
        if let Some(secs) = search.date.max_age_secs() {
            query.append_pair("f_TPR", &format!("r{secs}"));
        }
        query.append_pair("f_LF", "f_AL");
        query.append_pair("start", &(page_number * RESULTS_PER_PAGE).to_string());
    }
    Ok(url)
}

/// Numeric posting id from a `/jobs/view/<id>` or `/jobs/view/<slug>-<id>` link.
fn job_id_from_link(link: &str) -> Option<String> {
    let re = Regex::new(r"/jobs/view/(?:[^/?#]*-)?(\d+)").ok()?;
    re.captures(link)
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
}

/// The LinkedIn job search result list.
pub struct LinkedInJobsPage<S: PageSession> {
    session: Arc<S>,
    search: SearchConfig,
    timeout: Duration,
    scroll: ScrollPlan,
    behavior: BehavioralEngine,
}

impl<S: PageSession> LinkedInJobsPage<S> {
    pub fn new(session: Arc<S>, settings: &PortalSettings) -> Self {
        Self {
            session,
            search: settings.search.clone(),
            timeout: settings.element_timeout,
            scroll: settings.scroll,
            behavior: settings.behavior.clone(),
        }
    }

    async fn text_of(&self, tile: &S::Element, selector: &str) -> Result<Option<String>, PortalError> {
        let Some(el) = self.session.find_in(tile, selector).await.extraction(selector)? else {
            return Ok(None);
        };
        let text = self.session.text(&el).await.extraction(selector)?;
        Ok(Some(text))
    }

    async fn tile_id(&self, tile: &S::Element, link: Option<&str>) -> Result<Option<String>, PortalError> {
        for name in ["data-job-id", "data-occludable-job-id"] {
            if let Some(id) = self.session.attribute(tile, name).await.extraction(name)? {
                let id = id.trim();
                if !id.is_empty() {
                    return Ok(Some(id.to_string()));
                }
            }
        }
        Ok(link.and_then(job_id_from_link))
    }
}

#[async_trait]
impl<S: PageSession + 'static> JobListingSource for LinkedInJobsPage<S> {
    type Element = S::Element;

    async fn next_job_page(
        &self,
        position: &str,
        location: &str,
        page_number: u32,
    ) -> Result<(), PortalError> {
        let url = search_url(&self.search, position, location, page_number)
            .map_err(|e| PortalError::Navigation(format!("search url: {e}")))?;
        debug!(target: "portal.linkedin", %url, page_number, "opening result page");
        self.session
            .navigate(url.as_str())
            .await
            .navigation("result page")?;

        if self
            .session
            .wait_for(sel::RESULTS_LIST, self.timeout)
            .await
            .navigation("result list")?
            .is_some()
        {
            return Ok(());
        }
        if self.session.find(sel::NO_RESULTS).await.navigation("no-results banner")?.is_some() {
            return Ok(());
        }
        Err(PortalError::Navigation(format!(
            "result list did not render within {:?}",
            self.timeout
        )))
    }

    async fn get_jobs_from_page(&self, scroll: bool) -> Result<Vec<S::Element>, PortalError> {
        let Some(list) = self.session.find(sel::RESULTS_LIST).await.extraction("result list")? else {
            if self.session.find(sel::NO_RESULTS).await.extraction("no-results banner")?.is_some() {
                return Ok(Vec::new());
            }
            return Err(PortalError::Extraction("result list is missing".into()));
        };

        if scroll {
            // Down to trigger lazy loading, then back up so every tile has rendered.
            for plan in [self.scroll, self.scroll.reversed()] {
                if let Err(err) =
                    scroll_progressively(self.session.as_ref(), &list, &plan, &self.behavior).await
                {
                    warn!(target: "portal.linkedin", error = %err, "scrolling result list failed");
                    break;
                }
            }
        }

        let tiles = self
            .session
            .find_all_in(&list, sel::JOB_TILE)
            .await
            .extraction("job tiles")?;
        debug!(target: "portal.linkedin", tiles = tiles.len(), "collected job tiles");
        Ok(tiles)
    }

    async fn job_tile_to_job(&self, tile: &S::Element) -> Result<Job, PortalError> {
        let title_el = self
            .session
            .find_in(tile, sel::TILE_TITLE)
            .await
            .extraction("tile title")?
            .ok_or_else(|| PortalError::Extraction("tile has no title".into()))?;
        let title = self
            .session
            .text(&title_el)
            .await
            .extraction("tile title")?
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PortalError::Extraction("tile title is empty".into()))?;

        let company = self
            .text_of(tile, sel::TILE_COMPANY)
            .await?
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| PortalError::Extraction(format!("tile `{title}` has no company")))?;

        let link = self
            .session
            .attribute(&title_el, "href")
            .await
            .extraction("tile link")?
            .and_then(|href| canonical_link(&href));

        let id = self
            .tile_id(tile, link.as_deref())
            .await?
            .ok_or_else(|| PortalError::Extraction(format!("tile `{title}` has no job id")))?;

        let location = self
            .text_of(tile, sel::TILE_LOCATION)
            .await?
            .map(|l| l.trim().to_string())
            .unwrap_or_default();

        let apply_method = match self.text_of(tile, sel::TILE_FOOTER).await? {
            Some(footer) if footer.contains(sel::EASY_APPLY_TEXT) => ApplyMethod::Direct,
            _ => ApplyMethod::Unknown,
        };

        let mut job = Job::new(JobId::new(id), title, company)
            .with_location(location)
            .with_apply_method(apply_method);
        if let Some(link) = link {
            job = job.with_link(link);
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hawk_config::{DateWindow, ExperienceLevels};

    #[test]
    fn search_url_carries_filters_and_offset() {
        let search = SearchConfig {
            remote: true,
            distance: 50,
            experience_level: ExperienceLevels {
                entry: true,
                mid_senior_level: true,
                ..Default::default()
            },
            date: DateWindow::Week,
            ..Default::default()
        };
        let url = search_url(&search, "Rust Engineer", "Berlin", 2).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());

        assert_eq!(url.path(), "/jobs/search/");
        assert_eq!(get("keywords"), Some("Rust Engineer"));
        assert_eq!(get("location"), Some("Berlin"));
        assert_eq!(get("f_CF"), Some("f_WRA"));
        assert_eq!(get("f_E"), Some("2,4"));
        assert_eq!(get("distance"), Some("50"));
        assert_eq!(get("f_TPR"), Some("r604800"));
        assert_eq!(get("f_LF"), Some("f_AL"));
        assert_eq!(get("start"), Some("50"));
    }

    #[test]
    fn unfiltered_search_omits_optional_params() {
        let url = search_url(&SearchConfig::default(), "SRE", "", 0).unwrap();
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert!(!keys.contains(&"location".to_string()));
        assert!(!keys.contains(&"f_CF".to_string()));
        assert!(!keys.contains(&"f_TPR".to_string()));
        assert!(keys.contains(&"start".to_string()));
    }

    #[test]
    fn ids_parse_from_view_links() {
        assert_eq!(
            job_id_from_link("https://www.linkedin.com/jobs/view/3901234/").as_deref(),
            Some("3901234")
        );
        assert_eq!(
            job_id_from_link("https://www.linkedin.com/jobs/view/rust-engineer-at-ferris-3901235").as_deref(),
            Some("3901235")
        );
        assert_eq!(job_id_from_link("https://www.linkedin.com/company/ferris"), None);
    }
}

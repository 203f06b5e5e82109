mod common;

use common::{linkedin_session, settings, search, Tile, SEARCH_PREFIX};
use hawk_portals::linkedin::LinkedInJobsPage;
use hawk_portals::traits::JobListingSource;
use hawk_portals::{ApplyMethod, PortalError};

#[tokio::test]
async fn malformed_tile_is_skipped_without_corrupting_others() {
    let (session, _) = linkedin_session(&[
        Tile::new("101", "Rust Engineer", "Ferris GmbH"),
        Tile::untitled("102", "Crab Corp"),
        Tile::new("103", "Platform Engineer", "Oxide Ltd"),
    ]);
    let listing = LinkedInJobsPage::new(session.clone(), &settings(search(&["Rust"])));

    listing.next_job_page("Rust", "Berlin", 0).await.unwrap();
    let tiles = listing.get_jobs_from_page(true).await.unwrap();
    assert_eq!(tiles.len(), 3);

    let mut jobs = Vec::new();
    let mut skipped = 0;
    for tile in &tiles {
        match listing.job_tile_to_job(tile).await {
            Ok(job) => jobs.push(job),
            Err(PortalError::Extraction(_)) => skipped += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "103"]);
    assert_eq!(skipped, 1);

    let first = &jobs[0];
    assert_eq!(first.title, "Rust Engineer");
    assert_eq!(first.company, "Ferris GmbH");
    assert_eq!(first.location, "Berlin, Germany");
    assert_eq!(first.link.as_deref(), Some("https://www.linkedin.com/jobs/view/101/"));
    assert_eq!(first.apply_method, ApplyMethod::Direct);
    assert!(first.description.is_empty());
}

#[tokio::test]
async fn tile_extraction_is_idempotent() {
    let (session, tiles) = linkedin_session(&[Tile::new("201", "SRE", "Acme")]);
    session.show(common::LISTING);
    let listing = LinkedInJobsPage::new(session.clone(), &settings(search(&["SRE"])));

    let once = listing.job_tile_to_job(&tiles[0]).await.unwrap();
    let twice = listing.job_tile_to_job(&tiles[0]).await.unwrap();
    assert_eq!(once, twice);
    assert!(session.clicks().is_empty());
    assert!(session.navigations().is_empty());
}

#[tokio::test]
async fn result_page_url_carries_page_offset_and_scrolls_the_list() {
    let (session, _) = linkedin_session(&[Tile::new("301", "SRE", "Acme")]);
    let listing = LinkedInJobsPage::new(session.clone(), &settings(search(&["SRE"])));

    listing.next_job_page("SRE", "", 3).await.unwrap();
    let navigated = &session.navigations()[0];
    assert!(navigated.starts_with(SEARCH_PREFIX));
    assert!(navigated.contains("start=75"));

    listing.get_jobs_from_page(true).await.unwrap();
    let scrolls = session.scrolls();
    assert!(!scrolls.is_empty());
    assert_eq!(scrolls.last().map(|(_, offset)| *offset), Some(0));
}

#[tokio::test]
async fn no_results_banner_yields_an_empty_page() {
    let session = std::sync::Arc::new(hawk_drivers::fake::FakeSession::new("blank"));
    session.route(SEARCH_PREFIX, "empty");
    session.add(hawk_drivers::fake::FakeNode::new(
        "empty",
        hawk_portals::linkedin::selectors::NO_RESULTS,
    ));
    let listing = LinkedInJobsPage::new(session.clone(), &settings(search(&["Cobol"])));

    listing.next_job_page("Cobol", "", 0).await.unwrap();
    assert!(listing.get_jobs_from_page(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_result_page_is_a_navigation_error() {
    let (session, _) = linkedin_session(&[]);
    session.fail_navigation(SEARCH_PREFIX, 1);
    let listing = LinkedInJobsPage::new(session.clone(), &settings(search(&["SRE"])));

    assert!(matches!(
        listing.next_job_page("SRE", "", 0).await,
        Err(PortalError::Navigation(_))
    ));
}

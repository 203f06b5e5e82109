//! Scripted LinkedIn pages shared by the integration tests.
#![allow(dead_code)]

use hawk_config::SearchConfig;
use hawk_drivers::behavioral::BehavioralEngine;
use hawk_drivers::fake::{FakeElement, FakeNode, FakeSession};
use hawk_drivers::scroll::ScrollPlan;
use hawk_portals::answers::ProfileAnswers;
use hawk_portals::linkedin::selectors as sel;
use hawk_portals::PortalSettings;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const LISTING: &str = "listing";
pub const SEARCH_PREFIX: &str = "https://www.linkedin.com/jobs/search/";
pub const POSTING_PREFIX: &str = "https://www.linkedin.com/jobs/view/";

pub fn settings(search: SearchConfig) -> PortalSettings {
    let answers = BTreeMap::from([
        ("Mobile phone number".to_string(), "555-0100".to_string()),
        ("Years of experience".to_string(), "6".to_string()),
    ]);
    let documents = BTreeMap::from([("Resume".to_string(), PathBuf::from("/srv/cv.pdf"))]);
    PortalSettings {
        search,
        element_timeout: Duration::from_millis(10),
        scroll: ScrollPlan::default(),
        behavior: BehavioralEngine::instant(),
        answers: Arc::new(ProfileAnswers::new(&answers, &documents)),
    }
}

pub fn search(positions: &[&str]) -> SearchConfig {
    SearchConfig {
        positions: positions.iter().map(|p| p.to_string()).collect(),
        max_pages: 2,
        ..Default::default()
    }
}

/// One listing entry.
#[derive(Clone)]
pub struct Tile {
    pub id: &'static str,
    pub title: Option<&'static str>,
    pub company: &'static str,
    pub easy_apply: bool,
}

impl Tile {
    pub fn new(id: &'static str, title: &'static str, company: &'static str) -> Self {
        Self {
            id,
            title: Some(title),
            company,
            easy_apply: true,
        }
    }

    pub fn untitled(id: &'static str, company: &'static str) -> Self {
        Self {
            id,
            title: None,
            company,
            easy_apply: true,
        }
    }
}

/// A signed-in session whose search results show `tiles` on every page.
pub fn linkedin_session(tiles: &[Tile]) -> (Arc<FakeSession>, Vec<FakeElement>) {
    let session = Arc::new(FakeSession::new("blank"));
    session.route(sel::FEED_URL, "feed");
    session.add(FakeNode::new("feed", sel::GLOBAL_NAV));
    session.route(SEARCH_PREFIX, LISTING);

    let list = session.add(
        FakeNode::new(LISTING, sel::RESULTS_LIST)
            .prop("scrollHeight", "2400")
            .prop("clientHeight", "800")
            .prop("scrollTop", "0"),
    );
    let elements = tiles
        .iter()
        .map(|tile| add_tile(&session, &list, tile))
        .collect();
    (session, elements)
}

fn add_tile(session: &FakeSession, list: &FakeElement, tile: &Tile) -> FakeElement {
    let el = session.add(
        FakeNode::new(LISTING, sel::JOB_TILE)
            .child_of(list)
            .attr("data-occludable-job-id", tile.id),
    );
    if let Some(title) = tile.title {
        session.add(
            FakeNode::new(LISTING, sel::TILE_TITLE)
                .child_of(&el)
                .text(&format!("{title}\n{title} with verification"))
                .attr("href", &format!("/jobs/view/{}/?refId=r&trackingId=t", tile.id)),
        );
    }
    session.add(FakeNode::new(LISTING, sel::TILE_COMPANY).child_of(&el).text(tile.company));
    session.add(FakeNode::new(LISTING, sel::TILE_LOCATION).child_of(&el).text(" Berlin, Germany "));
    if tile.easy_apply {
        session.add(FakeNode::new(LISTING, sel::TILE_FOOTER).child_of(&el).text("Promoted · Easy Apply"));
    }
    el
}

/// Posting `id` with a description and an Easy Apply button that opens the
/// view `form_view`.
pub fn add_posting(session: &FakeSession, id: &str, recruiter: Option<&str>, form_view: &str) {
    let view = posting_view(id);
    session.route(&format!("{POSTING_PREFIX}{id}/"), &view);
    session.add(FakeNode::new(&view, sel::DESCRIPTION).text("We build crawlers in Rust."));
    if let Some(href) = recruiter {
        session.add(FakeNode::new(&view, sel::RECRUITER_LINK).attr("href", href));
    }
    session.add(
        FakeNode::new(&view, sel::APPLY_BUTTON)
            .text("Easy Apply")
            .named(&format!("apply {id}"))
            .navigates_to(form_view),
    );
}

pub fn posting_view(id: &str) -> String {
    format!("posting-{id}")
}

/// One form step: a modal with the given labelled text fields, each flagged
/// while empty, and the given controls.
pub struct StepBuilder<'a> {
    session: &'a FakeSession,
    view: String,
    modal: FakeElement,
}

impl<'a> StepBuilder<'a> {
    pub fn new(session: &'a FakeSession, view: &str) -> Self {
        let modal = session.add(FakeNode::new(view, sel::EASY_APPLY_MODAL));
        session.add(
            FakeNode::new(view, sel::DISMISS)
                .named("dismiss")
                .navigates_to(&format!("{view}-confirm")),
        );
        session.add(
            FakeNode::new(&format!("{view}-confirm"), sel::DISCARD_CONFIRM)
                .named("discard")
                .navigates_to("discarded"),
        );
        Self {
            session,
            view: view.to_string(),
            modal,
        }
    }

    pub fn required_text(self, label: &str) -> Self {
        let section = self
            .session
            .add(FakeNode::new(&self.view, sel::FORM_SECTION).child_of(&self.modal));
        self.session
            .add(FakeNode::new(&self.view, sel::FIELD_LABEL).child_of(&section).text(label));
        let input = self
            .session
            .add(FakeNode::new(&self.view, sel::FIELD_INPUT).child_of(&section));
        self.session.add(
            FakeNode::new(&self.view, sel::FIELD_ERROR)
                .child_of(&section)
                .text(&format!("{label} is required"))
                .shown_while_empty(&input),
        );
        self
    }

    pub fn next_to(self, view: &str) -> Self {
        self.session.add(
            FakeNode::new(&self.view, sel::NEXT_BUTTON)
                .named("next")
                .navigates_to(view),
        );
        self
    }

    /// A next control that is shown but cannot be clicked.
    pub fn stuck_next(self) -> Self {
        self.session.add(
            FakeNode::new(&self.view, sel::NEXT_BUTTON)
                .named("next")
                .failing_click(),
        );
        self
    }

    pub fn submit(self) -> Self {
        self.session.add(
            FakeNode::new(&self.view, sel::SUBMIT_BUTTON)
                .named("submit")
                .navigates_to("submitted"),
        );
        self
    }
}

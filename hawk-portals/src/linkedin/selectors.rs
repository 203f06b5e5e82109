//! CSS selectors for the LinkedIn pages this binding drives.

// Search results
pub const RESULTS_LIST: &str = "div.scaffold-layout__list";
pub const NO_RESULTS: &str = ".jobs-search-no-results-banner";
pub const JOB_TILE: &str = "li[data-occludable-job-id]";
pub const TILE_TITLE: &str = "a.job-card-list__title--link";
pub const TILE_COMPANY: &str = ".artdeco-entity-lockup__subtitle";
pub const TILE_LOCATION: &str = ".artdeco-entity-lockup__caption";
pub const TILE_FOOTER: &str = ".job-card-container__footer-wrapper";

// Posting detail
pub const DESCRIPTION: &str = "div.jobs-description-content__text";
pub const SEE_MORE: &str = "button.jobs-description__footer-button";
pub const RECRUITER_LINK: &str = ".hirer-card__hirer-information a";
pub const APPLY_BUTTON: &str = "button.jobs-apply-button";

// Easy Apply modal
pub const EASY_APPLY_MODAL: &str = "div.jobs-easy-apply-modal";
pub const FORM_SECTION: &str = "div.jobs-easy-apply-form-section__grouping";
pub const FIELD_LABEL: &str = "label";
pub const FIELD_INPUT: &str = "input, textarea, select";
pub const FILE_INPUT: &str = "input[type='file']";
pub const RADIO_INPUT: &str = "input[type='radio']";
pub const FIELD_ERROR: &str = ".artdeco-inline-feedback--error";
pub const NEXT_BUTTON: &str = "button[aria-label='Continue to next step']";
pub const REVIEW_BUTTON: &str = "button[aria-label='Review your application']";
pub const SUBMIT_BUTTON: &str = "button[aria-label='Submit application']";
pub const DISMISS: &str = "button.artdeco-modal__dismiss";
pub const DISCARD_CONFIRM: &str = "button[data-control-name='discard_application_confirm_btn']";

// Session
pub const GLOBAL_NAV: &str = "nav.global-nav";
pub const FEED_URL: &str = "https://www.linkedin.com/feed/";

/// Text marking a posting that accepts applications on LinkedIn itself.
pub const EASY_APPLY_TEXT: &str = "Easy Apply";

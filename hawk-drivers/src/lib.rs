//! Driver layer for browser automation.
//!
//! The portal code never talks to a browser directly; it goes through the
//! [`session::PageSession`] contract so the same portal logic runs against a
//! live WebDriver session or a scripted one in tests.
//!
//! - [`session::PageSession`]: element queries and interaction primitives
//! - [`webdriver::WebDriverSession`]: `fantoccini`-backed implementation
//! - [`scroll`]: bounded scroll-to-reveal for lazily loaded lists
//! - [`behavioral::BehavioralEngine`]: human-like timings and typing
//! - `fake::FakeSession` (feature `fake`): in-memory scripted session
pub mod behavioral;
pub mod scroll;
pub mod session;
pub mod webdriver;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use session::{PageSession, SessionError};

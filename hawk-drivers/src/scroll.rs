//! Scroll-to-reveal for lazily loaded result lists.
//!
//! Scrolling is a bounded loop: the plan fixes the number of steps up front
//! and every step is followed by a settle pause.
use crate::behavioral::BehavioralEngine;
use crate::session::{PageSession, SessionError};

/// Parameters for one progressive scroll pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPlan {
    pub start: i64,
    pub end: i64,
    /// Initial increment in pixels; it shrinks by 10px per step down to 10px.
    pub step: i64,
    /// Scroll from `end` back towards `start`.
    pub reverse: bool,
    /// Upper bound on intermediate positions.
    pub max_steps: usize,
}

impl Default for ScrollPlan {
    fn default() -> Self {
        Self {
            start: 0,
            end: 3600,
            step: 300,
            reverse: false,
            max_steps: 40,
        }
    }
}

impl ScrollPlan {
    pub fn reversed(self) -> Self {
        Self {
            reverse: true,
            ..self
        }
    }
}

/// Offsets visited by `plan`, ending exactly on the target offset.
///
/// An empty range or a zero step yields no positions.
///
/// ```
/// use hawk_drivers::scroll::{scroll_positions, ScrollPlan};
///
/// let plan = ScrollPlan { start: 0, end: 1000, step: 300, ..Default::default() };
/// assert_eq!(scroll_positions(&plan), vec![0, 300, 590, 870, 1000]);
/// ```
pub fn scroll_positions(plan: &ScrollPlan) -> Vec<i64> {
    let (from, to, sign) = if plan.reverse {
        (plan.end, plan.start, -1)
    } else {
        (plan.start, plan.end, 1)
    };
    let mut step = plan.step.abs() * sign;
    if step == 0 || from == to || (sign > 0) != (to > from) {
        return Vec::new();
    }

    let mut positions = Vec::new();
    let mut pos = from;
    while positions.len() < plan.max_steps && ((sign > 0 && pos < to) || (sign < 0 && pos > to)) {
        positions.push(pos);
        pos += step;
        step = (step.abs() - 10).max(10) * sign;
    }
    positions.push(to);
    positions
}

async fn read_px<S: PageSession + ?Sized>(
    session: &S,
    element: &S::Element,
    name: &str,
) -> Result<i64, SessionError> {
    Ok(session
        .property(element, name)
        .await?
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .map(|v| v as i64)
        .unwrap_or(0))
}

/// True when the element's content extends past its visible height.
pub async fn is_scrollable<S: PageSession + ?Sized>(
    session: &S,
    element: &S::Element,
) -> Result<bool, SessionError> {
    let scroll_height = read_px(session, element, "scrollHeight").await?;
    let client_height = read_px(session, element, "clientHeight").await?;
    Ok(scroll_height > client_height)
}

/// Scroll `element` through `plan`, pausing after each step.
///
/// Hidden or non-scrollable elements are left untouched. Returns the number
/// of scroll commands issued.
pub async fn scroll_progressively<S: PageSession + ?Sized>(
    session: &S,
    element: &S::Element,
    plan: &ScrollPlan,
    behavior: &BehavioralEngine,
) -> Result<usize, SessionError> {
    if !session.is_displayed(element).await? {
        tracing::debug!(target: "browser.scroll", "element hidden; skipping scroll");
        return Ok(0);
    }
    if !is_scrollable(session, element).await? {
        tracing::debug!(target: "browser.scroll", "element not scrollable; skipping scroll");
        return Ok(0);
    }

    let mut plan = *plan;
    if plan.reverse {
        let current = read_px(session, element, "scrollTop").await?;
        plan.end = plan.end.min(current);
    } else {
        let max_height = read_px(session, element, "scrollHeight").await?;
        plan.end = plan.end.min(max_height);
    }

    let positions = scroll_positions(&plan);
    for offset in &positions {
        session.scroll_to(element, *offset).await?;
        behavior.settle().await;
    }
    tracing::debug!(
        target: "browser.scroll",
        steps = positions.len(),
        reverse = plan.reverse,
        "scroll pass finished"
    );
    Ok(positions.len())
}

use hawk_drivers::SessionError;

/// Failures raised by portal components.
///
/// The variant decides what happens next: navigation is retried, missing
/// data skips the item, and anything that leaves a form in an unknown state
/// ends the application attempt.
#[derive(thiserror::Error, Debug)]
pub enum PortalError {
    /// A page failed to load or transition.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Expected data was absent from a loaded page.
    #[error("missing data: {0}")]
    Extraction(String),

    /// A click or input did not take effect.
    #[error("interaction failed: {0}")]
    Interaction(String),

    /// The current form step reports unresolved fields.
    #[error("form validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// No value is known for a flagged form field.
    #[error("cannot determine a value for `{0}`")]
    Unresolvable(String),

    /// The requested affordance does not exist for this job.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl PortalError {
    /// Only navigation is worth retrying; every other failure is stable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortalError::Navigation(_))
    }

    /// Whether the failure leaves an application attempt in an
    /// indeterminate state.
    pub fn is_fatal_for_attempt(&self) -> bool {
        matches!(
            self,
            PortalError::Interaction(_)
                | PortalError::Navigation(_)
                | PortalError::Auth(_)
                | PortalError::Cancelled
        )
    }
}

/// Errors raised when resolving a portal by name.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown job portal: {0}")]
    UnknownPortal(String),

    #[error("Platform {0} not implemented yet.")]
    NotImplemented(String),
}

/// Classify a session failure by the phase it happened in.
pub(crate) trait SessionResultExt<T> {
    fn navigation(self, what: &str) -> Result<T, PortalError>;
    fn extraction(self, what: &str) -> Result<T, PortalError>;
    fn interaction(self, what: &str) -> Result<T, PortalError>;
}

impl<T> SessionResultExt<T> for Result<T, SessionError> {
    fn navigation(self, what: &str) -> Result<T, PortalError> {
        self.map_err(|e| PortalError::Navigation(format!("{what}: {e}")))
    }

    fn extraction(self, what: &str) -> Result<T, PortalError> {
        self.map_err(|e| PortalError::Extraction(format!("{what}: {e}")))
    }

    fn interaction(self, what: &str) -> Result<T, PortalError> {
        self.map_err(|e| PortalError::Interaction(format!("{what}: {e}")))
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("All locator strategies failed: {0}")]
    LocatorExhausted(String),

    #[error("Mutation could not be verified: {0}")]
    VerificationFailed(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

use thiserror::Error;

/// Failures the handlers raise themselves, as opposed to transport or SDK
/// errors passed through from collaborators.
#[derive(Debug, Error)]
pub enum WeatherscopeError {
    #[error("Missing required configuration `{0}`")]
    MissingConfig(&'static str),

    #[error("Secret '{0}' has no string value")]
    EmptySecret(String),

    #[error("Unable to fetch city and country (geocoding status {status}, {results} results)")]
    Unresolved { status: String, results: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

mod auth;
mod models;
mod prepare;
#[cfg(feature = "cli")]
mod printer;
mod response;
mod runner;
mod transport;

pub use auth::{Authorization, PasswordGrant, BASIC, OAUTH2_BEARER, OAUTH2_PASSWORD};
pub use models::{
    ExecutorOptions, Preparation, PreparedRequest, RequestOutcome, RequestSummary, FORM_DATA,
};
#[cfg(feature = "cli")]
pub use printer::{print_outcome, print_response_error};
pub use runner::RequestExecutor;

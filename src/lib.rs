//! Templated HTTP datasource requests.
//!
//! A [`datasource::Datasource`] holds named endpoint templates and an
//! authorization scheme. [`executor::RequestExecutor::request`] renders one
//! endpoint against a data context, sends it, and maps the JSON response back
//! through the step's data mapping.

pub mod context;
pub mod datasource;
pub mod error;
pub mod executor;
pub mod template;

pub use context::DataContext;
pub use datasource::{Datasource, RequestConfig};
pub use error::{DatasourceError, DatasourceResult, HttpResponseError};
pub use executor::{RequestExecutor, RequestOutcome};

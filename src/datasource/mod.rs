mod loader;
mod model;

pub use loader::{load_definition, load_request_config, LoadedDefinition, DEFINITION_FILE};
pub use model::{
    DataMapping, Datasource, DatasourceDefinition, Endpoint, HeaderTemplate, OutboundMapping,
    RequestConfig,
};

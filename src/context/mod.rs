use serde_json::{Map, Value};

pub type DataContext = Map<String, Value>;

#[cfg(feature = "cli")]
mod loader;
mod path;

#[cfg(feature = "cli")]
pub use loader::{apply_assignment, load_data_file, load_env_file};
pub use path::{get_path, set_path};

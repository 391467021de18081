pub mod host;
pub mod paths;
pub mod settings;

pub use host::{Host, StandaloneHost};
pub use paths::LoaderPaths;
pub use settings::{default_settings_path, LoaderSettings};

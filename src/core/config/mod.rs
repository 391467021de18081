pub mod model;
pub mod reconciler;

pub use model::{PackageConfigEntry, StoredEntry};
pub use reconciler::ConfigReconciler;

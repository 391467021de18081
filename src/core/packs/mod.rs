pub mod registrar;
pub mod registry;

pub use registrar::{register_pack, RegisteredPack, ResourcePackManifest};
pub use registry::{PackRegistration, PackRegistry, OWNER_TAG_FIELD};

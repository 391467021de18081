pub mod layers;
pub mod overlay;

pub use layers::LayeredAssets;
pub use overlay::build_overlay;

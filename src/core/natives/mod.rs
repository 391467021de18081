pub mod search_path;
pub mod stager;

pub use search_path::NativeSearchPath;
pub use stager::stage_natives;

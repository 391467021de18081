pub mod context;
pub mod entry;
pub mod pipeline;

pub use context::ModuleContext;
pub use entry::{
    entry_library_path, CodeLoader, DylibCodeLoader, EntryContext, EntryFn, ENTRY_ABI_VERSION,
    ENTRY_SYMBOL,
};
pub use pipeline::{LoadOutcome, LoadReport, ModLoader};

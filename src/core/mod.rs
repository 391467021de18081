// ─── NCModloader Core ───
// Manifest-driven loader for mod packages.
//
// Architecture:
//   core/
//     archive/   : Package archive reading + overlay zipping
//     package/   : Package identity + manifest
//     natives/   : Native library staging + search path
//     assets/    : Asset overlay builder + layered resolver
//     packs/     : Resource pack registrar + global registry
//     loader/    : Code-loading context, entry ABI, load pipeline
//     config/    : External/internal reconciliation + persisted order
//     lifecycle  : Startup purge and teardown
//     state/     : Settings, resolved paths, host abstraction

pub mod archive;
pub mod assets;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod natives;
pub mod package;
pub mod packs;
pub mod state;

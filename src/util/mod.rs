//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod float_mode;

pub use config::Config;
pub use context::GlobalContext;
pub use diagnostic::Diagnostic;
pub use float_mode::FloatModeGuard;

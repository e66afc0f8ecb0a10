//! Syntax backends.

mod typescript;

pub use typescript::{BackendError, TreeSitterBackend};

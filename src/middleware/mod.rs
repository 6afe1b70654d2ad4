pub mod permission;

pub use permission::{require_authenticated, require_superuser, Caller, CurrentUser};

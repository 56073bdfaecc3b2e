//! Translation between abstract visibility labels and backend permissions.

pub mod acl;
pub mod unix;

pub use acl::AclVisibility;
pub use unix::{UnixVisibility, UnixVisibilityConfig};

/// Maps `"public"`/`"private"` onto a backend permission value and back.
///
/// Unrecognized labels map to the configured default permission; the inverse
/// direction matches permission values exactly and falls back to the default
/// label otherwise.
pub trait VisibilityConverter: Send + Sync {
    type Permission: PartialEq + Clone;

    fn for_file(&self, visibility: &str) -> Self::Permission;
    fn for_dir(&self, visibility: &str) -> Self::Permission;
    fn inverse_for_file(&self, permission: &Self::Permission) -> String;
    fn inverse_for_dir(&self, permission: &Self::Permission) -> String;
    fn default_for_file(&self) -> Self::Permission;
    fn default_for_dir(&self) -> Self::Permission;
}

pub(crate) fn is_known(visibility: &str) -> bool {
    visibility == crate::types::PUBLIC || visibility == crate::types::PRIVATE
}

//! Canned ACL strings, as used by S3-compatible object stores.

use serde::{Deserialize, Serialize};

use super::{VisibilityConverter, is_known};
use crate::types::{PRIVATE, PUBLIC};

pub const PUBLIC_GRANTEE_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
pub const AUTHENTICATED_GRANTEE_URI: &str =
    "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

pub const PUBLIC_READ: &str = "public-read";
pub const AUTHENTICATED_READ: &str = "authenticated-read";
pub const BUCKET_OWNER_READ: &str = "bucket-owner-read";
pub const PUBLIC_READ_WRITE: &str = "public-read-write";
pub const PRIVATE_ACL: &str = "private";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grantee {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub permission: String,
    pub grantee: Grantee,
}

#[derive(Debug, Clone)]
pub struct AclVisibility {
    public_acl: String,
    private_acl: String,
    dir_default: String,
    file_default: String,
}

impl Default for AclVisibility {
    fn default() -> Self {
        Self::new()
    }
}

impl AclVisibility {
    pub fn new() -> Self {
        Self {
            public_acl: PUBLIC_READ.to_string(),
            private_acl: PRIVATE_ACL.to_string(),
            dir_default: PUBLIC.to_string(),
            file_default: PUBLIC.to_string(),
        }
    }

    pub fn with_public_acl(mut self, acl: impl Into<String>) -> Self {
        self.public_acl = acl.into();
        self
    }

    pub fn set_dir_default_visibility(&mut self, visibility: &str) {
        if is_known(visibility) {
            self.dir_default = visibility.to_string();
        }
    }

    pub fn set_file_default_visibility(&mut self, visibility: &str) {
        if is_known(visibility) {
            self.file_default = visibility.to_string();
        }
    }

    fn to_acl(&self, visibility: &str, default: &str) -> String {
        let visibility = if is_known(visibility) {
            visibility
        } else {
            default
        };
        if visibility == PUBLIC {
            self.public_acl.clone()
        } else {
            self.private_acl.clone()
        }
    }

    fn to_label(&self, acl: &str, default: &str) -> String {
        if acl == self.public_acl {
            PUBLIC.to_string()
        } else if acl == self.private_acl {
            PRIVATE.to_string()
        } else {
            default.to_string()
        }
    }
}

impl VisibilityConverter for AclVisibility {
    type Permission = String;

    fn for_file(&self, visibility: &str) -> String {
        self.to_acl(visibility, &self.file_default)
    }

    fn for_dir(&self, visibility: &str) -> String {
        self.to_acl(visibility, &self.dir_default)
    }

    fn inverse_for_file(&self, acl: &String) -> String {
        self.to_label(acl, &self.file_default)
    }

    fn inverse_for_dir(&self, acl: &String) -> String {
        self.to_label(acl, &self.dir_default)
    }

    fn default_for_file(&self) -> String {
        self.to_acl(&self.file_default, &self.file_default)
    }

    fn default_for_dir(&self) -> String {
        self.to_acl(&self.dir_default, &self.dir_default)
    }
}

/// Recover the canned ACL an object store applied from its grant list.
pub fn acl_from_grants(owner_id: &str, grants: &[Grant]) -> Option<&'static str> {
    match grants.len() {
        1 => {
            let g = &grants[0];
            (g.grantee.uri.is_empty() && g.permission == "FULL_CONTROL").then_some(PRIVATE_ACL)
        }
        2 => grants.iter().find_map(|g| {
            if g.permission != "READ" {
                None
            } else if g.grantee.uri == PUBLIC_GRANTEE_URI {
                Some(PUBLIC_READ)
            } else if g.grantee.uri == AUTHENTICATED_GRANTEE_URI {
                Some(AUTHENTICATED_READ)
            } else if g.grantee.id == owner_id {
                Some(BUCKET_OWNER_READ)
            } else {
                None
            }
        }),
        3 => grants
            .iter()
            .any(|g| g.grantee.uri == PUBLIC_GRANTEE_URI && g.permission == "WRITE")
            .then_some(PUBLIC_READ_WRITE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(permission: &str, id: &str, uri: &str) -> Grant {
        Grant {
            permission: permission.into(),
            grantee: Grantee {
                id: id.into(),
                uri: uri.into(),
            },
        }
    }

    #[test]
    fn labels_round_trip() {
        let acl = AclVisibility::new();
        assert_eq!(acl.for_file(PUBLIC), PUBLIC_READ);
        assert_eq!(acl.for_dir(PRIVATE), PRIVATE_ACL);
        assert_eq!(acl.inverse_for_file(&PUBLIC_READ.to_string()), PUBLIC);
        assert_eq!(acl.inverse_for_file(&"public-read-write".to_string()), PUBLIC);
        assert_eq!(acl.default_for_dir(), PUBLIC_READ);
    }

    #[test]
    fn unknown_label_uses_default() {
        let mut acl = AclVisibility::new();
        acl.set_file_default_visibility(PRIVATE);
        assert_eq!(acl.for_file("whatever"), PRIVATE_ACL);
        assert_eq!(acl.default_for_file(), PRIVATE_ACL);
    }

    #[test]
    fn canned_acls_from_grants() {
        let owner = "owner";
        let full = grant("FULL_CONTROL", owner, "");
        assert_eq!(acl_from_grants(owner, std::slice::from_ref(&full)), Some(PRIVATE_ACL));
        assert_eq!(
            acl_from_grants(owner, &[full.clone(), grant("READ", "", PUBLIC_GRANTEE_URI)]),
            Some(PUBLIC_READ)
        );
        assert_eq!(
            acl_from_grants(owner, &[full.clone(), grant("READ", owner, "")]),
            Some(BUCKET_OWNER_READ)
        );
        assert_eq!(
            acl_from_grants(
                owner,
                &[
                    full.clone(),
                    grant("READ", "", PUBLIC_GRANTEE_URI),
                    grant("WRITE", "", PUBLIC_GRANTEE_URI)
                ]
            ),
            Some(PUBLIC_READ_WRITE)
        );
        assert_eq!(acl_from_grants(owner, &[]), None);
    }
}

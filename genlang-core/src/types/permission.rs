//! Types for the permission service.
use serde::{Deserialize, Serialize};

/// The role a [`Permission`] grants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "ROLE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "OWNER")]
    Owner,
    #[serde(rename = "WRITER")]
    Writer,
    #[serde(rename = "READER")]
    Reader,
}

/// Who a [`Permission`] is granted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GranteeType {
    #[default]
    #[serde(rename = "GRANTEE_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "GROUP")]
    Group,
    #[serde(rename = "EVERYONE")]
    Everyone,
}

/// An access grant on a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Absent until the permission is created.
    pub name: Option<String>,
    pub role: Role,
    pub grantee_type: GranteeType,
    /// Required unless `grantee_type` is [`GranteeType::Everyone`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

//! Decoder for permission-service records.
use super::{DecodeError, Record};
use crate::coerce::{to_grantee_type, to_role};
use crate::types::permission::{GranteeType, Permission, Role};
use serde_json::Value;

/// Decodes a raw permission record into a [`Permission`].
///
/// Role and grantee type are coerced strictly: an unmapped value fails.
pub fn decode_permission(value: Value) -> Result<Permission, DecodeError> {
    let mut record = Record::new("Permission", value)?;
    let role = match record.take("role") {
        None => Role::Unspecified,
        Some(value) => to_role(&value)?,
    };
    let grantee_type = match record.take("grantee_type") {
        None => GranteeType::Unspecified,
        Some(value) => to_grantee_type(&value)?,
    };
    Ok(Permission {
        name: record.take_string("name")?,
        role,
        grantee_type,
        email_address: record.take_string("email_address")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_roles_strictly() {
        let permission = decode_permission(json!({
            "name": "corpora/c1/permissions/p1",
            "role": "WRITER",
            "grantee_type": "USER",
            "email_address": "someone@example.com",
        }))
        .unwrap();
        assert_eq!(permission.role, Role::Writer);
        assert_eq!(permission.grantee_type, GranteeType::User);

        assert!(decode_permission(json!({ "role": "superuser" })).is_err());
    }
}

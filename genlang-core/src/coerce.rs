//! # Enum Coercion
//!
//! Wire records carry enum fields in heterogeneous shapes: the integer wire
//! code, the canonical screaming-snake name, or one of several lowercase or
//! symbolic aliases. Each enum family has a static bidirectional table here;
//! string input is lower-cased before lookup and nothing else (no trimming).
//!
//! The two lifecycle states ([`ChunkState`], [`TunedModelState`]) default to
//! their `Unspecified` variant on unknown or absent input. Every other
//! family has no default: an unmapped value is a [`CoerceError`].
use crate::types::model::TunedModelState;
use crate::types::permission::{GranteeType, Role};
use crate::types::retriever::{ChunkState, Operator};
use serde_json::Value;

/// A lookup miss in an enum family with no default value.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: '{value}'")]
pub struct CoerceError {
    pub kind: &'static str,
    pub value: String,
}

fn unknown(kind: &'static str, value: &Value) -> CoerceError {
    CoerceError {
        kind,
        value: value.to_string(),
    }
}

/// Coerces a wire value to an [`Operator`].
pub fn to_operator(value: &Value) -> Result<Operator, CoerceError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(operator_from_code)
            .ok_or_else(|| unknown("operator", value)),
        Value::String(s) => {
            operator_from_alias(&s.to_lowercase()).ok_or_else(|| unknown("operator", value))
        }
        _ => Err(unknown("operator", value)),
    }
}

fn operator_from_code(code: i64) -> Option<Operator> {
    match code {
        0 => Some(Operator::Unspecified),
        1 => Some(Operator::Less),
        2 => Some(Operator::LessEqual),
        3 => Some(Operator::Equal),
        4 => Some(Operator::GreaterEqual),
        5 => Some(Operator::NotEqual),
        6 => Some(Operator::Includes),
        7 => Some(Operator::Excludes),
        _ => None,
    }
}

fn operator_from_alias(alias: &str) -> Option<Operator> {
    match alias {
        "operator_unspecified" | "unspecified" => Some(Operator::Unspecified),
        "operator_less" | "less" | "<" => Some(Operator::Less),
        "operator_less_equal" | "less_equal" | "<=" => Some(Operator::LessEqual),
        "operator_equal" | "equal" | "==" => Some(Operator::Equal),
        "operator_greater_equal" | "greater_equal" => Some(Operator::GreaterEqual),
        "operator_not_equal" | "not_equal" | "!=" => Some(Operator::NotEqual),
        "operator_includes" | "includes" => Some(Operator::Includes),
        "operator_excludes" | "excludes" | "not in" => Some(Operator::Excludes),
        _ => None,
    }
}

/// Coerces a wire value to a [`ChunkState`], defaulting to `Unspecified`.
pub fn to_chunk_state(value: Option<&Value>) -> ChunkState {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => ChunkState::PendingProcessing,
            Some(2) => ChunkState::Active,
            Some(10) => ChunkState::Failed,
            _ => ChunkState::Unspecified,
        },
        Some(Value::String(s)) => match s.to_lowercase().as_str() {
            "state_pending_processing" | "pending_processing" | "pending" => {
                ChunkState::PendingProcessing
            }
            "state_active" | "active" => ChunkState::Active,
            "state_failed" | "failed" => ChunkState::Failed,
            _ => ChunkState::Unspecified,
        },
        _ => ChunkState::Unspecified,
    }
}

/// Coerces a wire value to a [`TunedModelState`], defaulting to
/// `Unspecified`.
pub fn to_tuned_model_state(value: Option<&Value>) -> TunedModelState {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => TunedModelState::Creating,
            Some(2) => TunedModelState::Active,
            Some(3) => TunedModelState::Failed,
            _ => TunedModelState::Unspecified,
        },
        Some(Value::String(s)) => match s.to_lowercase().as_str() {
            "creating" => TunedModelState::Creating,
            "active" => TunedModelState::Active,
            "failed" => TunedModelState::Failed,
            _ => TunedModelState::Unspecified,
        },
        _ => TunedModelState::Unspecified,
    }
}

/// Coerces a wire value to a [`Role`].
pub fn to_role(value: &Value) -> Result<Role, CoerceError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Role::Unspecified),
            Some(1) => Ok(Role::Owner),
            Some(2) => Ok(Role::Writer),
            Some(3) => Ok(Role::Reader),
            _ => Err(unknown("role", value)),
        },
        Value::String(s) => match s.to_lowercase().as_str() {
            "role_unspecified" | "unspecified" => Ok(Role::Unspecified),
            "owner" => Ok(Role::Owner),
            "writer" => Ok(Role::Writer),
            "reader" => Ok(Role::Reader),
            _ => Err(unknown("role", value)),
        },
        _ => Err(unknown("role", value)),
    }
}

/// Coerces a wire value to a [`GranteeType`].
pub fn to_grantee_type(value: &Value) -> Result<GranteeType, CoerceError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(GranteeType::Unspecified),
            Some(1) => Ok(GranteeType::User),
            Some(2) => Ok(GranteeType::Group),
            Some(3) => Ok(GranteeType::Everyone),
            _ => Err(unknown("grantee type", value)),
        },
        Value::String(s) => match s.to_lowercase().as_str() {
            "grantee_type_unspecified" | "unspecified" => Ok(GranteeType::Unspecified),
            "user" => Ok(GranteeType::User),
            "group" => Ok(GranteeType::Group),
            "everyone" => Ok(GranteeType::Everyone),
            _ => Err(unknown("grantee type", value)),
        },
        _ => Err(unknown("grantee type", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operator_aliases() {
        assert_eq!(to_operator(&json!("<")).unwrap(), Operator::Less);
        assert_eq!(to_operator(&json!("==")).unwrap(), Operator::Equal);
        assert_eq!(to_operator(&json!("not in")).unwrap(), Operator::Excludes);
        assert_eq!(to_operator(&json!("GREATER_EQUAL")).unwrap(), Operator::GreaterEqual);
        assert_eq!(to_operator(&json!(5)).unwrap(), Operator::NotEqual);
        assert_eq!(to_operator(&json!(6)).unwrap(), Operator::Includes);
        assert_eq!(to_operator(&json!(7)).unwrap(), Operator::Excludes);
    }

    #[test]
    fn operator_unknown_is_an_error() {
        assert!(to_operator(&json!(">")).is_err());
        assert!(to_operator(&json!(42)).is_err());
        assert!(to_operator(&Value::Null).is_err());
    }

    #[test]
    fn operator_coercion_is_idempotent() {
        // Re-coercing the canonical wire name of the result is a fixpoint
        // for every accepted representation.
        for input in [json!("<="), json!("OPERATOR_LESS_EQUAL"), json!(2)] {
            let op = to_operator(&input).unwrap();
            assert_eq!(op, Operator::LessEqual);
            let wire = serde_json::to_value(op).unwrap();
            assert_eq!(to_operator(&wire).unwrap(), op);
        }
    }

    #[test]
    fn chunk_states_default_to_unspecified() {
        assert_eq!(to_chunk_state(Some(&json!("pending"))), ChunkState::PendingProcessing);
        assert_eq!(to_chunk_state(Some(&json!("STATE_ACTIVE"))), ChunkState::Active);
        assert_eq!(to_chunk_state(Some(&json!(10))), ChunkState::Failed);
        assert_eq!(to_chunk_state(Some(&json!("bogus"))), ChunkState::Unspecified);
        assert_eq!(to_chunk_state(Some(&Value::Null)), ChunkState::Unspecified);
        assert_eq!(to_chunk_state(None), ChunkState::Unspecified);
    }

    #[test]
    fn tuned_model_states_default_to_unspecified() {
        assert_eq!(to_tuned_model_state(Some(&json!("Active"))), TunedModelState::Active);
        assert_eq!(to_tuned_model_state(Some(&json!(1))), TunedModelState::Creating);
        assert_eq!(to_tuned_model_state(Some(&json!(99))), TunedModelState::Unspecified);
        assert_eq!(to_tuned_model_state(None), TunedModelState::Unspecified);
    }

    #[test]
    fn role_and_grantee_type() {
        assert_eq!(to_role(&json!("OWNER")).unwrap(), Role::Owner);
        assert!(to_role(&json!("admin")).is_err());
        assert_eq!(to_grantee_type(&json!("everyone")).unwrap(), GranteeType::Everyone);
        assert!(to_grantee_type(&json!(9)).is_err());
    }
}

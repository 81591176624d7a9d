//! Operator attribution extractor.
//!
//! Mutating check-in routes must say who performed the action. Identity is
//! resolved by the deployment's admin frontend; this extractor only reads the
//! attribution headers it forwards. It does not authenticate anyone.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use domain::models::Operator;

/// Header carrying the acting admin's id (UUID, required on mutations).
pub const OPERATOR_ID_HEADER: &str = "x-operator-id";

/// Header carrying the acting admin's display name (optional).
pub const OPERATOR_NAME_HEADER: &str = "x-operator-name";

/// The operator a mutating request is attributed to.
#[derive(Debug, Clone)]
pub struct OperatorIdentity(pub Operator);

impl OperatorIdentity {
    /// Builds the operator from raw header values.
    fn parse(id: Option<&str>, name: Option<&str>) -> Result<Self, ApiError> {
        let id = id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ApiError::Validation("X-Operator-Id header is required".to_string())
            })?;

        let id = id.parse().map_err(|_| {
            ApiError::Validation("X-Operator-Id header must be a UUID".to_string())
        })?;

        let operator = match name.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => Operator::named(id, name),
            None => Operator::new(id),
        };

        Ok(OperatorIdentity(operator))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OperatorIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(OPERATOR_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        let name = parts
            .headers
            .get(OPERATOR_NAME_HEADER)
            .and_then(|value| value.to_str().ok());

        Self::parse(id, name)
    }
}

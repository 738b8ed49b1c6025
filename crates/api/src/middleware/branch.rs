//! Branch scoping read from the `X-Branch-Id` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use scoop_core::BranchId;

use crate::error::AppError;

/// The HTTP header carrying the branch a request is scoped to.
pub const BRANCH_HEADER: &str = "x-branch-id";

/// Optional branch scope of a request.
///
/// An absent or empty header means unscoped. Anything other than a positive
/// integer is rejected with 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Branch(pub Option<BranchId>);

impl Branch {
    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self(None));
        };

        raw.parse::<i32>()
            .ok()
            .and_then(BranchId::positive)
            .map(|id| Self(Some(id)))
            .ok_or_else(|| AppError::BadRequest(format!("Invalid X-Branch-Id header: {raw}")))
    }
}

impl<S> FromRequestParts<S> for Branch
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = match parts.headers.get(BRANCH_HEADER) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| AppError::BadRequest("Invalid X-Branch-Id header".to_string()))?,
            ),
            None => None,
        };

        let branch = Self::parse(raw)?;
        if let Some(id) = branch.0 {
            tracing::Span::current().record("branch_id", id.as_i32());
        }
        Ok(branch)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_or_empty_is_unscoped() {
        assert_eq!(Branch::parse(None).unwrap(), Branch(None));
        assert_eq!(Branch::parse(Some("")).unwrap(), Branch(None));
        assert_eq!(Branch::parse(Some("  ")).unwrap(), Branch(None));
    }

    #[test]
    fn test_positive_id() {
        assert_eq!(
            Branch::parse(Some("7")).unwrap(),
            Branch(Some(BranchId::new(7)))
        );
    }

    #[test]
    fn test_rejects_invalid() {
        for raw in ["0", "-3", "abc", "1.5"] {
            assert!(
                matches!(Branch::parse(Some(raw)), Err(AppError::BadRequest(_))),
                "{raw} should be rejected"
            );
        }
    }
}

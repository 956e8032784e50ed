use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::errors::ApiError;
use crate::core::state::AppState;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";
pub(crate) const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrincipalRole {
    Staff,
    Student,
}

/// Identity asserted by the gateway in front of this service. The gateway
/// authenticates the caller and forwards the verified id and role headers;
/// this service only parses them.
#[derive(Debug, Clone)]
pub(crate) struct Principal {
    pub(crate) id: String,
    pub(crate) role: PrincipalRole,
}

impl Principal {
    pub(crate) fn is_staff(&self) -> bool {
        self.role == PrincipalRole::Staff
    }
}

pub(crate) struct CurrentUser(pub(crate) Principal);
pub(crate) struct CurrentStaff(pub(crate) Principal);

fn principal_from_parts(parts: &Parts) -> Result<Principal, ApiError> {
    let id = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::Unauthorized("Missing identity headers"))?
        .to_string();

    let role = parts
        .headers
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized("Missing identity headers"))?;

    let role = match role {
        "staff" => PrincipalRole::Staff,
        "student" => PrincipalRole::Student,
        _ => return Err(ApiError::Unauthorized("Unknown role")),
    };

    Ok(Principal { id, role })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        principal_from_parts(parts).map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;

        if principal.is_staff() {
            Ok(CurrentStaff(principal))
        } else {
            Err(ApiError::Forbidden("Staff access required"))
        }
    }
}

//! Bearer-token authentication for API handlers.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use secrecy::SecretString;

use salon_core::{Email, UserId};

use crate::cache::{QueryKey, QueryRoot};
use crate::db::{StaffRepository, UserRoleRepository};
use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentStaff;
use crate::permissions::{Permissions, RoleResolver};
use crate::state::AppState;

/// Extractor that requires a valid hosted-auth access token.
///
/// The token is checked against the auth service, then the caller's role
/// and roster entry are looked up (through the query cache, so realtime
/// changes to `user_roles` or `staff` take effect on the next request).
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireStaff(staff): RequireStaff) -> impl IntoResponse {
///     format!("Hello, {}!", staff.user_id)
/// }
/// ```
pub struct RequireStaff(pub CurrentStaff);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let user = state.retry().run(|| state.auth().get_user(&token)).await?;
        let email = user.email.as_deref().and_then(|raw| Email::parse(raw).ok());

        let permissions = permissions_for(state, user.id).await?;
        let staff_id = staff_id_for(state, user.id).await?;

        set_sentry_user(user.id, email.as_ref().map(Email::as_str));
        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        Ok(Self(CurrentStaff {
            user_id: user.id,
            email,
            staff_id,
            permissions,
        }))
    }
}

async fn permissions_for(state: &AppState, user: UserId) -> Result<Permissions, AppError> {
    let source = UserRoleRepository::new(state.pool());
    let resolver = RoleResolver::new();
    let permissions = state
        .cache()
        .get_or_fetch(
            QueryKey::scoped(QueryRoot::UserRole, user),
            resolver.resolve(&source, user, state.retry()),
        )
        .await?;
    Ok(permissions)
}

async fn staff_id_for(
    state: &AppState,
    user: UserId,
) -> Result<Option<salon_core::StaffId>, AppError> {
    let repo = StaffRepository::new(state.pool());
    let staff = state
        .cache()
        .get_or_fetch(
            QueryKey::scoped(QueryRoot::Staff, user),
            state.retry().run(|| repo.find_by_user(user)),
        )
        .await?;
    Ok(staff.filter(|member| member.active).map(|member| member.id))
}

/// The token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<SecretString> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty())
        .then(|| SecretString::from(token.to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use secrecy::ExposeSecret;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static("")),
        );
        headers
    }

    #[test]
    fn test_bearer_token() {
        let token = bearer_token(&headers("Bearer abc.def"));
        assert_eq!(token.as_ref().map(|t| t.expose_secret()), Some("abc.def"));

        let token = bearer_token(&headers("bearer xyz"));
        assert_eq!(token.as_ref().map(|t| t.expose_secret()), Some("xyz"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_none());
        assert!(bearer_token(&headers("Bearer ")).is_none());
        assert!(bearer_token(&HeaderMap::new()).is_none());
    }
}

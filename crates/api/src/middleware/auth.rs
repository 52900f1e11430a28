//! Identity extraction.
//!
//! Authentication itself lives at the gateway in front of this service;
//! by the time a request arrives here the gateway has verified the
//! caller and attached identity headers:
//!
//! - `x-user-id` - numeric user ID (required)
//! - `x-user-role` - `customer` or `admin` (defaults to `customer`)
//! - `x-user-permissions` - optional comma-separated grants
//!
//! [`RequireAuth`] turns those headers into a [`Principal`] and rejects
//! requests without a usable identity.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

use atelier_core::{Principal, Role, UserId};

use crate::error::AppError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";
const USER_PERMISSIONS_HEADER: &str = "x-user-permissions";

/// Extractor that requires a verified caller identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(principal): RequireAuth) -> impl IntoResponse {
///     format!("hello, user {}", principal.id)
/// }
/// ```
pub struct RequireAuth(pub Principal);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers).map(Self)
    }
}

fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, AppError> {
    let id = headers
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing identity".to_owned()))?;
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::Unauthorized("malformed user ID".to_owned()))?;

    let role = match headers.get(USER_ROLE_HEADER).map(|h| h.to_str()) {
        None => Role::Customer,
        Some(Ok(raw)) => raw
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("unknown role: {raw}")))?,
        Some(Err(_)) => {
            return Err(AppError::Unauthorized("malformed role header".to_owned()));
        }
    };

    let mut principal = match role {
        Role::Customer => Principal::customer(UserId::from(id)),
        Role::Admin => Principal::admin(UserId::from(id)),
    };

    if let Some(Ok(raw)) = headers.get(USER_PERMISSIONS_HEADER).map(|h| h.to_str()) {
        principal.permissions.extend(
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned),
        );
    }

    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    use atelier_core::PERM_MANAGE_ORDERS;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn customer_is_the_default_role() {
        let principal = principal_from_headers(&headers(&[("x-user-id", "7")])).unwrap();
        assert_eq!(principal.id, UserId::from(7));
        assert_eq!(principal.role, Role::Customer);
        assert!(!principal.is_admin());
    }

    #[test]
    fn admin_role_and_permissions_are_parsed() {
        let principal = principal_from_headers(&headers(&[
            ("x-user-id", "1"),
            ("x-user-role", "admin"),
            ("x-user-permissions", "orders:manage, catalog:manage"),
        ]))
        .unwrap();
        assert!(principal.is_admin());
        assert!(principal.permissions.contains(PERM_MANAGE_ORDERS));
    }

    #[test]
    fn missing_or_malformed_identity_is_rejected() {
        assert!(matches!(
            principal_from_headers(&HeaderMap::new()).unwrap_err(),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            principal_from_headers(&headers(&[("x-user-id", "abc")])).unwrap_err(),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            principal_from_headers(&headers(&[("x-user-id", "1"), ("x-user-role", "root")]))
                .unwrap_err(),
            AppError::Unauthorized(_)
        ));
    }
}

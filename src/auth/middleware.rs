//! Bearer authentication and role gates.
//!
//! `require_auth` validates the `Authorization: Bearer <token>` header and stores
//! an [`Identity`] in the request extensions; any failure ends the request with
//! 401 before the handler runs. `require_roles` must be layered inside it and
//! answers 403 when the identity's role is not in the gate's allow-list.

use crate::{
    auth::{role::Role, token::{Claims, TokenService}},
    error::Error,
    store::TenantScope,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub const ADMINS: &[Role] = &[Role::Admin, Role::SuperAdmin];
pub const SUPERADMINS: &[Role] = &[Role::SuperAdmin];

/// Who is calling, valid for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub role: Role,
    /// Always `None` for superadmins.
    pub tenant_id: Option<Uuid>,
}

impl Identity {
    #[must_use]
    pub fn scope(&self) -> TenantScope {
        if !self.role.is_tenant_scoped() {
            return TenantScope::All;
        }
        self.tenant_id
            .map_or(TenantScope::Unbound, TenantScope::Tenant)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        ADMINS.contains(&self.role)
    }

    /// Builds the identity from validated claims.
    ///
    /// # Errors
    /// `Error::InvalidToken` if the subject is not a UUID, the role is missing or
    /// unknown, or a tenant claim is malformed.
    pub fn from_claims(claims: &Claims) -> Result<Self, Error> {
        let account_id = Uuid::parse_str(&claims.sub).map_err(|_| Error::InvalidToken)?;

        if claims.role.is_empty() {
            return Err(Error::InvalidToken);
        }
        let role: Role = claims.role.parse().map_err(|_| Error::InvalidToken)?;

        let tenant_id = claims
            .tenant_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| Error::InvalidToken)?
            .filter(|_| role.is_tenant_scoped());

        Ok(Self {
            account_id,
            role,
            tenant_id,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or(Error::InvalidToken)
    }
}

/// Token from an `Authorization: Bearer <token>` header: exactly two parts
/// separated by a single space.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// # Errors
/// `Error::InvalidToken` when the header is missing or the token does not validate.
pub async fn require_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let Some(token) = bearer_token(request.headers()) else {
        debug!("Missing or malformed Authorization header");
        return Err(Error::InvalidToken);
    };

    let claims = tokens.validate(token)?;
    let identity = Identity::from_claims(&claims)?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Fixed allow-list of roles for a group of routes.
#[derive(Clone, Copy, Debug)]
pub struct RoleGate {
    allowed: &'static [Role],
}

impl RoleGate {
    #[must_use]
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    #[must_use]
    pub fn permits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// # Errors
/// `Error::InvalidToken` without an identity, `Error::Forbidden` when the role is not allowed.
pub async fn require_roles(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .copied()
        .ok_or(Error::InvalidToken)?;

    if !gate.permits(identity.role) {
        debug!(role = %identity.role, "Role not permitted");
        return Err(Error::Forbidden);
    }

    Ok(next.run(request).await)
}

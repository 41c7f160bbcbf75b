//! Request-side authentication and the per-route permission guard.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use axum::routing::MethodRouter;

use vault_auth_types::bearer::bearer_token;

use crate::domain::rbac::Principal;
use crate::error::VaultError;
use crate::state::AppState;
use crate::usecase::auth::AuthenticateUseCase;

impl FromRequestParts<AppState> for Principal {
    type Rejection = VaultError;

    // Values are pulled out of `parts` synchronously so the returned future
    // owns everything it touches.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let cached = parts.extensions.get::<Principal>().cloned();
        let token = bearer_token(&parts.headers);
        let usecase = AuthenticateUseCase {
            users: state.user_repo(),
            jwt_secret: state.token.secret.clone(),
        };

        async move {
            if let Some(principal) = cached {
                return Ok(principal);
            }
            let token = token.ok_or(VaultError::InvalidToken)?;
            usecase.execute(&token).await
        }
    }
}

async fn guard(
    State((state, permission)): State<(AppState, &'static str)>,
    request: Request,
    next: Next,
) -> Result<Response, VaultError> {
    let (mut parts, body) = request.into_parts();
    let principal = Principal::from_request_parts(&mut parts, &state).await?;
    principal.require(permission)?;
    parts.extensions.insert(principal);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Reject requests to `route` whose principal lacks `permission`.
///
/// Missing or invalid credentials yield 401 and a missing permission 403,
/// both before the handler's own extractors run. The resolved principal is
/// stored in the request extensions for the handler to reuse.
pub fn require_permission(
    route: MethodRouter<AppState>,
    state: &AppState,
    permission: &'static str,
) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state((state.clone(), permission), guard))
}

//! Request-lifecycle stage wiring the gate into an `axum` handler chain.
//!
//! The middleware is the explicit "stage with a continue capability"
//! composition point: it runs the pipeline, and either continues to the
//! route-dispatch collaborator (with the identity written into a request
//! extension on success) or rejects with a uniform `401 Unauthorized`.

use crate::error::AuthError;
use crate::gate::{AuthGate, AuthOutcome};
use crate::identity::UserIdentity;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Authentication middleware.
///
/// Apply with `axum::middleware::from_fn_with_state(gate, require_auth)`.
///
/// # Response
///
/// - Excluded paths continue with no identity extension set.
/// - Authenticated requests continue with [`UserIdentity`] in extensions.
/// - Every pipeline failure becomes a 401 with a generic body; the failure
///   kind appears only in server-side logs.
#[instrument(skip_all, name = "jwt_gate.require_auth")]
pub async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Response {
    match gate.authenticate(req.uri().path(), req.headers()).await {
        Ok(AuthOutcome::Skipped) => next.run(req).await,
        Ok(AuthOutcome::Authenticated(identity)) => {
            info!(
                target: "jwt_gate::audit",
                username = %identity.username,
                path = %req.uri().path(),
                "request authenticated"
            );
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => reject(&err),
    }
}

/// Maps any pipeline failure to the uniform unauthorized response.
///
/// Transient infrastructure failures (an unreachable JWKS endpoint) are
/// deliberately indistinguishable from invalid credentials here; the
/// distinction lives in the log line.
fn reject(err: &AuthError) -> Response {
    let correlation_id = Uuid::new_v4();
    warn!(
        code = err.code().as_str(),
        %correlation_id,
        error = %err,
        "request rejected"
    );

    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Unauthorized",
            "correlation_id": correlation_id,
        })),
    )
        .into_response()
}

/// Extension trait for reading the per-request identity slot.
///
/// Downstream request-scoped collaborators (audit logging, handlers) use
/// this to observe who was authenticated. Returns `None` when the path was
/// excluded or the middleware was not applied.
pub trait IdentityExt {
    /// The authenticated identity, if one was established.
    fn identity(&self) -> Option<&UserIdentity>;
}

impl<B> IdentityExt for http::Request<B> {
    fn identity(&self) -> Option<&UserIdentity> {
        self.extensions().get::<UserIdentity>()
    }
}

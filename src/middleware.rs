use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::database::AppState;

/// Guards the admin console routes
///
/// When the state carries an admin token (from the `AUTHORIZATION`
/// environment variable), the request must send an `Authorization` header
/// with exactly that value. Without a configured token the check is skipped.
pub async fn admin_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if let Some(secret) = &state.admin_token {
        let authorized = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == secret);

        if !authorized {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request");
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "message": "Invalid or missing authorization header"
                })),
            )
                .into_response());
        }
    }

    Ok(next.run(request).await)
}

use super::{AppError, MessageResponse, SharedStorage};
use crate::models::{CreateSessionRequest, SessionResponse};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};

pub(super) fn routes() -> Router<SharedStorage> {
    Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/status", get(session_status))
        .route("/auth/signout", post(sign_out))
}

async fn sign_in(
    State(storage): State<SharedStorage>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(request) = payload?;
    if let Some(credentials) = request.password_credentials {
        let session = storage
            .write()
            .await
            .users
            .authenticate(&credentials.username, &credentials.password)
            .ok_or_else(|| {
                tracing::warn!(username = %credentials.username, "Rejected sign-in");
                AppError::Unauthorized("Invalid credentials")
            })?;
        tracing::info!(user = ?session.user.name, "Signed in");
        return Ok(Json(session));
    }
    if request.sso_credentials.is_some() {
        return Err(AppError::NotImplemented("SSO authentication not implemented"));
    }
    Err(AppError::BadRequest("No credentials provided".into()))
}

async fn session_status(
    State(storage): State<SharedStorage>,
) -> Result<Json<SessionResponse>, AppError> {
    storage
        .read()
        .await
        .users
        .current_session()
        .cloned()
        .map(Json)
        .ok_or(AppError::Unauthorized("Not authenticated"))
}

async fn sign_out(State(storage): State<SharedStorage>) -> Json<MessageResponse> {
    storage.write().await.users.clear_sessions();
    tracing::info!("Signed out");
    MessageResponse::new("Signed out successfully")
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, send};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn sign_in_status_sign_out() {
        let (app, _) = app();
        let (status, _) = send(&app, Method::GET, "/api/v1/auth/status", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let body = json!({ "password_credentials": { "username": "admin", "password": "password" } });
        let (status, session) =
            send(&app, Method::POST, "/api/v1/auth/signin", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["user"]["username"], "admin");
        assert!(session["last_accessed_at"].is_string());

        let (status, current) = send(&app, Method::GET, "/api/v1/auth/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(current["user"]["name"], "users/1");

        let (status, body) = send(&app, Method::POST, "/api/v1/auth/signout", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Signed out successfully");
        let (status, _) = send(&app, Method::GET, "/api/v1/auth/status", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let (app, _) = app();
        let body = json!({ "password_credentials": { "username": "admin", "password": "wrongpass" } });
        let (status, body) =
            send(&app, Method::POST, "/api/v1/auth/signin", Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid credentials");
    }

    #[tokio::test]
    async fn sso_is_not_implemented() {
        let (app, _) = app();
        let body = json!({
            "sso_credentials": { "idp_id": "github", "code": "abc", "redirect_uri": "http://localhost" }
        });
        let (status, _) = send(&app, Method::POST, "/api/v1/auth/signin", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn missing_credentials_is_400() {
        let (app, _) = app();
        let (status, body) =
            send(&app, Method::POST, "/api/v1/auth/signin", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "No credentials provided");
    }
}

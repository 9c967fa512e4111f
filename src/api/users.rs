use super::{AppError, MessageResponse, SharedStorage, check_page_size};
use crate::models::{
    CreateUserAccessTokenRequest, CreateUserRequest, ListAllUserStatsResponse,
    ListUserAccessTokensResponse, ListUsersResponse, SearchUsersResponse, UpdateUserRequest,
    User, UserAccessToken,
};
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{delete, get},
};
use serde::Deserialize;

pub(super) fn routes() -> Router<SharedStorage> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users:search", get(search_users))
        .route("/users:stats", get(list_user_stats))
        .route(
            "/users/{user_id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route(
            "/users/{user_id}/accessTokens",
            get(list_access_tokens).post(create_access_token),
        )
        .route(
            "/users/{user_id}/accessTokens/{token_id}",
            delete(delete_access_token),
        )
}

#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchUsersQuery {
    query: String,
    page_size: Option<u32>,
}

async fn list_users(
    State(storage): State<SharedStorage>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<ListUsersResponse>, AppError> {
    let Query(query) = query?;
    check_page_size(query.page_size)?;
    Ok(Json(ListUsersResponse {
        users: storage.read().await.users.list(),
        next_page_token: None,
    }))
}

async fn create_user(
    State(storage): State<SharedStorage>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(request) = payload?;
    if request.user.username.trim().is_empty() {
        return Err(AppError::BadRequest("Username must not be empty".into()));
    }
    let user = storage
        .write()
        .await
        .users
        .create(request.user, request.user_id);
    tracing::info!(user = ?user.name, username = %user.username, "Created user");
    Ok(Json(user))
}

async fn get_user(
    State(storage): State<SharedStorage>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, AppError> {
    storage
        .read()
        .await
        .users
        .get(&user_id)
        .cloned()
        .map(Json)
        .ok_or(AppError::NotFound("User"))
}

async fn update_user(
    State(storage): State<SharedStorage>,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(request) = payload?;
    let user = storage
        .write()
        .await
        .users
        .update(&user_id, request.user)
        .ok_or(AppError::NotFound("User"))?;
    tracing::info!(user = ?user.name, "Updated user");
    Ok(Json(user))
}

async fn delete_user(
    State(storage): State<SharedStorage>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !storage.write().await.users.delete(&user_id) {
        return Err(AppError::NotFound("User"));
    }
    tracing::info!(user_id, "Deleted user");
    Ok(MessageResponse::new("User deleted successfully"))
}

async fn search_users(
    State(storage): State<SharedStorage>,
    query: Result<Query<SearchUsersQuery>, QueryRejection>,
) -> Result<Json<SearchUsersResponse>, AppError> {
    let Query(query) = query?;
    check_page_size(query.page_size)?;
    Ok(Json(SearchUsersResponse {
        users: storage.read().await.users.search(&query.query),
        next_page_token: None,
    }))
}

async fn list_user_stats(State(storage): State<SharedStorage>) -> Json<ListAllUserStatsResponse> {
    let storage = storage.read().await;
    Json(ListAllUserStatsResponse {
        stats: storage.users.stats(&storage.memos),
    })
}

async fn list_access_tokens(
    State(storage): State<SharedStorage>,
    Path(user_id): Path<String>,
) -> Result<Json<ListUserAccessTokensResponse>, AppError> {
    let storage = storage.read().await;
    if storage.users.get(&user_id).is_none() {
        return Err(AppError::NotFound("User"));
    }
    Ok(Json(ListUserAccessTokensResponse {
        access_tokens: storage.users.list_access_tokens(&user_id),
    }))
}

async fn create_access_token(
    State(storage): State<SharedStorage>,
    Path(user_id): Path<String>,
    payload: Result<Json<CreateUserAccessTokenRequest>, JsonRejection>,
) -> Result<Json<UserAccessToken>, AppError> {
    let Json(request) = payload?;
    let mut storage = storage.write().await;
    if storage.users.get(&user_id).is_none() {
        return Err(AppError::NotFound("User"));
    }
    let token =
        storage
            .users
            .create_access_token(&user_id, request.access_token, request.access_token_id);
    tracing::info!(token = ?token.name, "Issued access token");
    Ok(Json(token))
}

async fn delete_access_token(
    State(storage): State<SharedStorage>,
    Path((user_id, token_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    if !storage.write().await.users.delete_access_token(&token_id) {
        return Err(AppError::NotFound("Access token"));
    }
    tracing::info!(user_id, token_id, "Revoked access token");
    Ok(MessageResponse::new("Access token deleted successfully"))
}

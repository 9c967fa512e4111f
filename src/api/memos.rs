use super::{AppError, MessageResponse, SharedStorage, check_page_size};
use crate::models::{
    Activity, CreateMemoRequest, ListMemosResponse, Memo, UpdateMemoRequest,
};
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::get,
};
use serde::Deserialize;

/// Creator recorded on comment activities when the memo names none.
const DEFAULT_ACTIVITY_CREATOR: &str = "users/1";

pub(super) fn routes() -> Router<SharedStorage> {
    Router::new()
        .route("/memos", get(list_memos).post(create_memo))
        .route(
            "/memos/{memo_id}",
            get(get_memo).patch(update_memo).delete(delete_memo),
        )
}

#[derive(Debug, Deserialize)]
struct ListMemosQuery {
    filter: Option<String>,
    page_size: Option<u32>,
}

async fn list_memos(
    State(storage): State<SharedStorage>,
    query: Result<Query<ListMemosQuery>, QueryRejection>,
) -> Result<Json<ListMemosResponse>, AppError> {
    let Query(query) = query?;
    check_page_size(query.page_size)?;
    let memos = storage.read().await.memos.list(query.filter.as_deref());
    tracing::debug!(count = memos.len(), filter = ?query.filter, "Listed memos");
    Ok(Json(ListMemosResponse {
        memos,
        next_page_token: None,
    }))
}

async fn create_memo(
    State(storage): State<SharedStorage>,
    payload: Result<Json<CreateMemoRequest>, JsonRejection>,
) -> Result<Json<Memo>, AppError> {
    let Json(request) = payload?;
    let mut storage = storage.write().await;
    let memo = storage.memos.create(request.memo, request.memo_id);

    if let (Some(name), Some(relation)) = (memo.name.clone(), memo.comment_relation()) {
        let creator = memo
            .creator
            .clone()
            .unwrap_or_else(|| DEFAULT_ACTIVITY_CREATOR.to_string());
        let activity = storage.activities.create(Activity::memo_comment(
            creator,
            name,
            relation.related_memo.clone(),
        ));
        tracing::debug!(activity = ?activity.name, "Recorded comment activity");
    }

    tracing::info!(memo = ?memo.name, "Created memo");
    Ok(Json(memo))
}

async fn get_memo(
    State(storage): State<SharedStorage>,
    Path(memo_id): Path<String>,
) -> Result<Json<Memo>, AppError> {
    storage
        .read()
        .await
        .memos
        .get(&memo_id)
        .cloned()
        .map(Json)
        .ok_or(AppError::NotFound("Memo"))
}

async fn update_memo(
    State(storage): State<SharedStorage>,
    Path(memo_id): Path<String>,
    payload: Result<Json<UpdateMemoRequest>, JsonRejection>,
) -> Result<Json<Memo>, AppError> {
    let Json(request) = payload?;
    let memo = storage
        .write()
        .await
        .memos
        .update(&memo_id, request.memo)
        .ok_or(AppError::NotFound("Memo"))?;
    tracing::info!(memo = ?memo.name, "Updated memo");
    Ok(Json(memo))
}

async fn delete_memo(
    State(storage): State<SharedStorage>,
    Path(memo_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !storage.write().await.memos.delete(&memo_id) {
        return Err(AppError::NotFound("Memo"));
    }
    tracing::info!(memo_id, "Deleted memo");
    Ok(MessageResponse::new("Memo deleted successfully"))
}

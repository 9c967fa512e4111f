use super::{AppError, SharedStorage, check_page_size};
use crate::models::ListActivitiesResponse;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::Deserialize;

pub(super) fn routes() -> Router<SharedStorage> {
    Router::new().route("/activities", get(list_activities))
}

#[derive(Debug, Deserialize)]
struct ListActivitiesQuery {
    page_size: Option<u32>,
}

async fn list_activities(
    State(storage): State<SharedStorage>,
    query: Result<Query<ListActivitiesQuery>, QueryRejection>,
) -> Result<Json<ListActivitiesResponse>, AppError> {
    let Query(query) = query?;
    check_page_size(query.page_size)?;
    Ok(Json(ListActivitiesResponse {
        activities: storage.read().await.activities.list(),
        next_page_token: None,
    }))
}

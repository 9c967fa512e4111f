use super::{AppError, MessageResponse, SharedStorage, check_page_size};
use crate::models::{Attachment, CreateAttachmentRequest, ListAttachmentsResponse};
use axum::{
    Json, Router,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{get, post},
};
use serde::Deserialize;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

pub(super) fn routes() -> Router<SharedStorage> {
    Router::new()
        .route("/attachments", get(list_attachments).post(create_attachment))
        .route("/attachments/upload", post(upload_attachment))
        .route(
            "/attachments/{attachment_id}",
            get(get_attachment).delete(delete_attachment),
        )
}

#[derive(Debug, Deserialize)]
struct ListAttachmentsQuery {
    filter: Option<String>,
    page_size: Option<u32>,
}

async fn list_attachments(
    State(storage): State<SharedStorage>,
    query: Result<Query<ListAttachmentsQuery>, QueryRejection>,
) -> Result<Json<ListAttachmentsResponse>, AppError> {
    let Query(query) = query?;
    check_page_size(query.page_size)?;
    Ok(Json(ListAttachmentsResponse {
        attachments: storage
            .read()
            .await
            .attachments
            .list(query.filter.as_deref()),
        next_page_token: None,
    }))
}

async fn create_attachment(
    State(storage): State<SharedStorage>,
    payload: Result<Json<CreateAttachmentRequest>, JsonRejection>,
) -> Result<Json<Attachment>, AppError> {
    let Json(request) = payload?;
    let mut attachment = request.attachment;
    if let Some(content) = &attachment.content {
        attachment.size = content.len() as u64;
    }
    let attachment = storage.write().await.attachments.create(attachment);
    tracing::info!(attachment = ?attachment.name, filename = %attachment.filename, "Created attachment");
    Ok(Json(attachment))
}

async fn upload_attachment(
    State(storage): State<SharedStorage>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Attachment>, AppError> {
    let mut multipart = multipart.map_err(|err| AppError::Unprocessable(err.body_text()))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Unprocessable(err.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::Unprocessable(err.body_text()))?;

        let attachment = storage.write().await.attachments.create(Attachment {
            name: None,
            filename,
            mime_type,
            size: bytes.len() as u64,
            content: Some(bytes.to_vec()),
            external_link: None,
            memo: None,
            create_time: None,
        });
        tracing::info!(
            attachment = ?attachment.name,
            size = attachment.size,
            "Uploaded attachment"
        );
        return Ok(Json(attachment));
    }
    Err(AppError::Unprocessable(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

async fn get_attachment(
    State(storage): State<SharedStorage>,
    Path(attachment_id): Path<String>,
) -> Result<Json<Attachment>, AppError> {
    storage
        .read()
        .await
        .attachments
        .get(&attachment_id)
        .cloned()
        .map(Json)
        .ok_or(AppError::NotFound("Attachment"))
}

async fn delete_attachment(
    State(storage): State<SharedStorage>,
    Path(attachment_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !storage.write().await.attachments.delete(&attachment_id) {
        return Err(AppError::NotFound("Attachment"));
    }
    tracing::info!(attachment_id, "Deleted attachment");
    Ok(MessageResponse::new("Attachment deleted successfully"))
}

//! Email handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::render::{preview_of, render, RenderOptions};
use crate::web::dto::{
    ApiResponse, DeleteResponse, EmailDetailResponse, EmailSummaryResponse, PaginatedResponse,
    PaginationQuery, RenderQuery, RenderedEmailResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/mailboxes/{address}/emails - List emails, newest first.
#[utoipa::path(
    get,
    path = "/api/mailboxes/{address}/emails",
    tag = "emails",
    params(
        ("address" = String, Path, description = "Mailbox address"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of emails", body = Vec<EmailSummaryResponse>),
        (status = 404, description = "Mailbox unknown or expired")
    )
)]
pub async fn list_emails(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<EmailSummaryResponse>>, ApiError> {
    let (page, per_page) = pagination.normalized();
    let (offset, limit) = pagination.to_offset_limit();

    let emails = state.service.list_emails(&address).await?;
    let total = emails.len() as u64;
    let preview_length = state.preview_length();

    let items = emails
        .iter()
        .skip(offset)
        .take(limit)
        .map(|e| EmailSummaryResponse::from_email(e, preview_length))
        .collect();

    Ok(Json(PaginatedResponse::new(items, page, per_page, total)))
}

/// DELETE /api/mailboxes/{address}/emails - Delete every email.
#[utoipa::path(
    delete,
    path = "/api/mailboxes/{address}/emails",
    tag = "emails",
    params(("address" = String, Path, description = "Mailbox address")),
    responses(
        (status = 200, description = "Deletion result", body = DeleteResponse),
        (status = 404, description = "Mailbox unknown or expired")
    )
)]
pub async fn delete_all_emails(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let deleted = state.service.delete_all_emails(&address).await?;
    Ok(Json(ApiResponse::new(DeleteResponse { deleted })))
}

/// GET /api/mailboxes/{address}/emails/{id} - Get one email.
#[utoipa::path(
    get,
    path = "/api/mailboxes/{address}/emails/{id}",
    tag = "emails",
    params(
        ("address" = String, Path, description = "Mailbox address"),
        ("id" = String, Path, description = "Email ID")
    ),
    responses(
        (status = 200, description = "Email", body = EmailDetailResponse),
        (status = 404, description = "Mailbox or email not found")
    )
)]
pub async fn get_email(
    State(state): State<Arc<AppState>>,
    Path((address, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<EmailDetailResponse>>, ApiError> {
    let email = state.service.get_email(&address, &id).await?;
    Ok(Json(ApiResponse::new(EmailDetailResponse::from_email(
        &email,
        state.preview_length(),
    ))))
}

/// GET /api/mailboxes/{address}/emails/{id}/rendered - Get display-ready content.
///
/// HTML is sanitized and images are replaced with placeholders unless
/// `show_images=true`.
#[utoipa::path(
    get,
    path = "/api/mailboxes/{address}/emails/{id}/rendered",
    tag = "emails",
    params(
        ("address" = String, Path, description = "Mailbox address"),
        ("id" = String, Path, description = "Email ID"),
        ("show_images" = Option<bool>, Query, description = "Show images")
    ),
    responses(
        (status = 200, description = "Rendered email", body = RenderedEmailResponse),
        (status = 404, description = "Mailbox or email not found")
    )
)]
pub async fn get_rendered_email(
    State(state): State<Arc<AppState>>,
    Path((address, id)): Path<(String, String)>,
    Query(query): Query<RenderQuery>,
) -> Result<Json<ApiResponse<RenderedEmailResponse>>, ApiError> {
    let email = state.service.get_email(&address, &id).await?;

    let preview = preview_of(&email.content, state.preview_length());
    let content = render(
        &email.content,
        &preview,
        RenderOptions {
            show_images: query.show_images,
        },
    );

    Ok(Json(ApiResponse::new(RenderedEmailResponse {
        id: email.id,
        subject: email.subject,
        show_images: query.show_images,
        html: content.to_html(),
        content,
    })))
}

/// DELETE /api/mailboxes/{address}/emails/{id} - Delete one email.
#[utoipa::path(
    delete,
    path = "/api/mailboxes/{address}/emails/{id}",
    tag = "emails",
    params(
        ("address" = String, Path, description = "Mailbox address"),
        ("id" = String, Path, description = "Email ID")
    ),
    responses(
        (status = 200, description = "Deletion result", body = DeleteResponse),
        (status = 404, description = "Mailbox unknown or expired")
    )
)]
pub async fn delete_email(
    State(state): State<Arc<AppState>>,
    Path((address, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let deleted = state.service.delete_email(&address, &id).await?;
    Ok(Json(ApiResponse::new(DeleteResponse { deleted })))
}

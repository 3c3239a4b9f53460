//! Mailbox handlers for Web API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{
    ApiResponse, CreateMailboxRequest, DeleteResponse, MailboxResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/mailboxes - Create a mailbox.
///
/// Registers the given address, or generates a random one. Registering an
/// address that is already live refreshes it.
#[utoipa::path(
    post,
    path = "/api/mailboxes",
    tag = "mailboxes",
    request_body = CreateMailboxRequest,
    responses(
        (status = 201, description = "Mailbox created", body = MailboxResponse),
        (status = 409, description = "No free generated address under the domain"),
        (status = 422, description = "Invalid address or domain"),
        (status = 429, description = "Too many requests"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn create_mailbox(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateMailboxRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MailboxResponse>>), ApiError> {
    let mailbox = match req.address.as_deref() {
        Some(address) => state.service.register_mailbox(address).await?,
        None => state.service.generate_mailbox(req.domain.as_deref()).await?,
    };

    let now = state.service.store().now();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(MailboxResponse::from_mailbox(&mailbox, now))),
    ))
}

/// GET /api/mailboxes/{address} - Get a live mailbox.
#[utoipa::path(
    get,
    path = "/api/mailboxes/{address}",
    tag = "mailboxes",
    params(("address" = String, Path, description = "Mailbox address")),
    responses(
        (status = 200, description = "Mailbox", body = MailboxResponse),
        (status = 404, description = "Mailbox unknown or expired")
    )
)]
pub async fn get_mailbox(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<MailboxResponse>>, ApiError> {
    let mailbox = state.service.mailbox(&address).await?;
    let now = state.service.store().now();
    Ok(Json(ApiResponse::new(MailboxResponse::from_mailbox(
        &mailbox, now,
    ))))
}

/// POST /api/mailboxes/{address}/refresh - Extend a mailbox's lifetime.
#[utoipa::path(
    post,
    path = "/api/mailboxes/{address}/refresh",
    tag = "mailboxes",
    params(("address" = String, Path, description = "Mailbox address")),
    responses(
        (status = 200, description = "Mailbox refreshed", body = MailboxResponse),
        (status = 404, description = "Mailbox unknown or expired")
    )
)]
pub async fn refresh_mailbox(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<MailboxResponse>>, ApiError> {
    let mailbox = state.service.refresh_mailbox(&address).await?;
    let now = state.service.store().now();
    Ok(Json(ApiResponse::new(MailboxResponse::from_mailbox(
        &mailbox, now,
    ))))
}

/// DELETE /api/mailboxes/{address} - Deactivate a mailbox and delete its emails.
#[utoipa::path(
    delete,
    path = "/api/mailboxes/{address}",
    tag = "mailboxes",
    params(("address" = String, Path, description = "Mailbox address")),
    responses(
        (status = 200, description = "Deactivation result", body = DeleteResponse)
    )
)]
pub async fn delete_mailbox(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let deleted = state.service.deactivate_mailbox(&address).await?;
    Ok(Json(ApiResponse::new(DeleteResponse { deleted })))
}

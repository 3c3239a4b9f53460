//! Configuration handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::{ApiResponse, DomainListResponse, PublicConfigResponse};
use crate::web::error::ApiError;

/// GET /api/config/public - Public service configuration.
///
/// Returns the domains and lifetimes a client needs to present mailboxes.
#[utoipa::path(
    get,
    path = "/api/config/public",
    tag = "config",
    responses(
        (status = 200, description = "Service configuration", body = PublicConfigResponse),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn get_public_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PublicConfigResponse>>, ApiError> {
    let config = PublicConfigResponse {
        domains: state.service.domains().await?,
        expiration_secs: state.mail_config.expiration_secs,
        extension_secs: state.mail_config.extension_secs,
        preview_length: state.mail_config.preview_length,
    };
    Ok(Json(ApiResponse::new(config)))
}

/// GET /api/domains - List configured domains.
#[utoipa::path(
    get,
    path = "/api/domains",
    tag = "config",
    responses(
        (status = 200, description = "Configured domains", body = DomainListResponse),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn list_domains(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DomainListResponse>>, ApiError> {
    let domains = state.service.domains().await?;
    Ok(Json(ApiResponse::new(DomainListResponse { domains })))
}

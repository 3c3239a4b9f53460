//! OpenAPI document for the web API.

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use super::dto::{
    AttachmentResponse, CreateMailboxRequest, DeleteResponse, DeliveredRecipient,
    DomainListResponse, EmailDetailResponse, EmailSummaryResponse, InboundAttachment,
    InboundEmailRequest, InboundResponse, MailboxResponse, PaginationMeta, PublicConfigResponse,
    RejectedRecipient, RenderedEmailResponse,
};
use super::handlers;

/// OpenAPI description of every API route.
///
/// Responses are wrapped in `{"data": ...}`; errors use
/// `{"error": {"code", "message", "details"}}`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "tempmail API",
        description = "Disposable mailboxes with expiring addresses"
    ),
    paths(
        handlers::config::get_public_config,
        handlers::config::list_domains,
        handlers::mailbox::create_mailbox,
        handlers::mailbox::get_mailbox,
        handlers::mailbox::refresh_mailbox,
        handlers::mailbox::delete_mailbox,
        handlers::email::list_emails,
        handlers::email::delete_all_emails,
        handlers::email::get_email,
        handlers::email::get_rendered_email,
        handlers::email::delete_email,
        handlers::inbound::deliver_inbound,
    ),
    components(schemas(
        CreateMailboxRequest,
        InboundEmailRequest,
        InboundAttachment,
        MailboxResponse,
        DomainListResponse,
        DeleteResponse,
        EmailSummaryResponse,
        EmailDetailResponse,
        AttachmentResponse,
        RenderedEmailResponse,
        DeliveredRecipient,
        RejectedRecipient,
        InboundResponse,
        PublicConfigResponse,
        PaginationMeta,
    )),
    tags(
        (name = "config", description = "Service configuration"),
        (name = "mailboxes", description = "Mailbox lifecycle"),
        (name = "emails", description = "Emails of a mailbox"),
        (name = "inbound", description = "Delivery from the mail receiver")
    )
)]
pub struct ApiDoc;

/// Create the router serving the OpenAPI JSON.
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

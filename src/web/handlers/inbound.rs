//! Inbound delivery handler.
//!
//! The SMTP receiver posts each parsed message here once; the message is
//! stored separately for every recipient that names a live mailbox.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::datetime::parse_message_date;
use crate::mail::{MessageContent, NewEmail};
use crate::web::dto::{
    ApiResponse, DeliveredRecipient, InboundEmailRequest, InboundResponse, RejectedRecipient,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::TempMailError;

/// POST /api/inbound - Deliver an inbound message.
///
/// Recipients without a live mailbox are reported as rejected. A store
/// outage fails the whole request so the receiver can retry.
#[utoipa::path(
    post,
    path = "/api/inbound",
    tag = "inbound",
    request_body = InboundEmailRequest,
    responses(
        (status = 200, description = "Delivery result", body = InboundResponse),
        (status = 422, description = "Invalid message"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn deliver_inbound(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<InboundEmailRequest>,
) -> Result<Json<ApiResponse<InboundResponse>>, ApiError> {
    let date = req.date.as_deref().and_then(|d| {
        let parsed = parse_message_date(d);
        if parsed.is_none() {
            tracing::debug!(date = %d, "Ignoring unparsable message date");
        }
        parsed
    });
    let content = MessageContent::from_parts(req.html, req.text, req.body);

    let mut template = NewEmail::new(req.from, String::new(), req.subject, content);
    template.date = date;
    for attachment in req.attachments {
        template = template.with_attachment(attachment.filename, attachment.size);
    }

    let mut response = InboundResponse {
        delivered: Vec::new(),
        rejected: Vec::new(),
    };

    for recipient in req.to {
        let mut email = template.clone();
        email.to = recipient.clone();

        match state.service.deliver(email).await {
            Ok(id) => response.delivered.push(DeliveredRecipient { recipient, id }),
            Err(TempMailError::UnknownMailbox(_)) => {
                tracing::info!(recipient = %recipient, "Rejected mail for unknown mailbox");
                response.rejected.push(RejectedRecipient {
                    recipient,
                    reason: "unknown mailbox".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Json(ApiResponse::new(response)))
}

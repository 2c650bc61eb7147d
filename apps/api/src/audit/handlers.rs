use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

use crate::audit::models::{AuditResponse, UploadedDocument};
use crate::audit::pipeline::run_audit;
use crate::errors::{AppError, AuditError};
use crate::prompt::AuditContext;
use crate::state::AppState;

/// POST /audit
///
/// Multipart fields: `file` (required), `business_context`, `client_location`.
pub async fn handle_audit(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AuditResponse>, AuditError> {
    let audit_id = Uuid::new_v4();
    let span = info_span!("audit", %audit_id, filename = tracing::field::Empty);

    serve_audit(state, multipart, audit_id)
        .instrument(span)
        .await
        .map(Json)
        .map_err(|error| AuditError { audit_id, error })
}

async fn serve_audit(
    state: AppState,
    multipart: Result<Multipart, MultipartRejection>,
    audit_id: Uuid,
) -> Result<AuditResponse, AppError> {
    let multipart = multipart.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let (upload, context) = read_form(multipart).await?;

    Span::current().record("filename", upload.filename.as_str());
    info!("Audit requested ({} bytes)", upload.bytes.len());

    let audit = run_audit(state.gateway.as_ref(), &state.settings, upload, context).await?;

    info!("Audit completed");
    Ok(AuditResponse::success(
        audit_id,
        state.gateway.model().to_string(),
        audit,
    ))
}

async fn read_form(mut multipart: Multipart) -> Result<(UploadedDocument, AuditContext), AppError> {
    let mut upload: Option<UploadedDocument> = None;
    let mut business_context: Option<String> = None;
    let mut client_location: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(UploadedDocument {
                    filename,
                    content_type,
                    bytes,
                });
            }
            "business_context" => {
                business_context = Some(field.text().await.map_err(multipart_error)?);
            }
            "client_location" => {
                client_location = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let upload = upload
        .ok_or_else(|| AppError::Validation("Missing required multipart field 'file'".to_string()))?;

    Ok((upload, AuditContext::new(business_context, client_location)))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Failed to parse multipart data: {}", e.body_text()))
    }
}

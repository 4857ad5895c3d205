pub mod admin;
pub mod auth;
pub mod favorite;
pub mod message;
pub mod notification;
pub mod payment;
pub mod profile;
pub mod property;
pub mod seo;
pub mod sponsor;
pub mod subscription;

use axum::extract::Multipart;
use inmo_core::error::CoreError;
use inmo_core::types::DbId;

use crate::error::AppError;

/// Shorthand for the 404 every lookup-by-id handler returns.
pub(crate) fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

/// An image pulled out of a multipart form.
pub(crate) struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Read the required `file` field of a multipart form. Other fields are
/// ignored.
pub(crate) async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok(UploadedFile {
            filename,
            data: data.to_vec(),
        });
    }
    Err(AppError::BadRequest("Missing required 'file' field".into()))
}

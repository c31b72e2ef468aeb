//! Multipart encoding of upload payloads.

use curry_core::{Attachment, MigrationError, MigrationResult, UploadPayload};
use reqwest::multipart::{Form, Part};

const TORRENT_FIELD: &str = "file_input";
const LOG_FIELD: &str = "logfiles[]";

/// Build the multipart form shared by session and API uploads.
///
/// # Errors
///
/// Returns `Protocol` when an attachment carries an unusable MIME type.
pub fn upload_form(payload: UploadPayload) -> MigrationResult<Form> {
    let mut form = Form::new();
    for (name, value) in payload.text_fields() {
        form = form.text(name, value);
    }
    form = form.part(TORRENT_FIELD, file_part(payload.torrent)?);
    for log in payload.logs {
        form = form.part(LOG_FIELD, file_part(log)?);
    }
    Ok(form)
}

fn file_part(attachment: Attachment) -> MigrationResult<Part> {
    Part::bytes(attachment.bytes)
        .file_name(attachment.file_name)
        .mime_str(attachment.mime)
        .map_err(|err| MigrationError::protocol("invalid attachment type").with_source(err))
}

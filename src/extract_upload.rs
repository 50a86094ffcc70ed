// Pulls the uploaded file out of a multipart form body.

use axum::extract::Multipart;
use tracing::{debug, warn};

use crate::error::ApiError;

// One uploaded file: the declared filename plus its bytes. The filename is
// whatever the client declared; validation happens in the handler.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

// Walks the multipart fields looking for "file", ignoring everything else.
// A missing "file" field is the caller's first validation error.
pub async fn extract_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload: Option<Upload> = None;
    let mut ignored_fields = 0;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            if upload.is_some() {
                warn!("Multiple 'file' fields found in multipart request, using the last one");
            }

            let filename = field.file_name().unwrap_or_default().to_string();
            debug!("Received file field with declared name: {:?}", filename);

            let data = field.bytes().await?.to_vec();

            upload = Some(Upload { filename, data });
        } else {
            debug!(
                "Ignoring multipart field: {}",
                field.name().unwrap_or("unnamed")
            );
            ignored_fields += 1;
        }
    }

    if ignored_fields > 0 {
        debug!("Ignored {} non-file multipart fields", ignored_fields);
    }

    upload.ok_or(ApiError::MissingFilePart)
}

//! Uploaded job-description PDFs: text extraction and the S3 archive.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;

/// Key under which an uploaded job PDF is archived.
pub fn job_document_key(profile_id: &str, document_id: Uuid) -> String {
    format!("jobs/{profile_id}/{document_id}.pdf")
}

/// Extracts the text layer of a PDF. A file without extractable text is rejected.
pub async fn extract_pdf_text(pdf: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Stores the original upload and returns its key.
pub async fn archive_job_pdf(
    s3: &S3Client,
    bucket: &str,
    profile_id: &str,
    pdf: Bytes,
) -> Result<String, AppError> {
    let key = job_document_key(profile_id, Uuid::new_v4());
    let size = pdf.len();

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(pdf))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("PDF upload failed: {e}")))?;

    info!("Archived job PDF to s3://{bucket}/{key} ({size} bytes)");
    Ok(key)
}

/// Best-effort removal of an archived PDF whose job was never created.
pub async fn discard_job_pdf(s3: &S3Client, bucket: &str, key: &str) {
    if let Err(e) = s3.delete_object().bucket(bucket).key(key).send().await {
        warn!("Failed to remove orphaned job PDF s3://{bucket}/{key}: {e}");
    }
}

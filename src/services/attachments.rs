use std::time::Duration;

use crate::core::config::Settings;
use crate::core::redis::RedisHandle;
use crate::db::models::Question;
use crate::db::types::AnswerPayload;
use crate::services::answer_validation::extension_allowed;
use crate::services::storage::StorageService;

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("file exceeds the {limit_mb} MB limit for this question")]
    TooLarge { limit_mb: i64 },
    #[error("file type .{extension} is not accepted for this question")]
    TypeNotAllowed { extension: String },
    #[error("another upload or delete for this question is still in flight")]
    UploadInProgress,
    #[error("file storage is not configured")]
    StorageUnavailable,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum DeleteError {
    #[error("another upload or delete for this question is still in flight")]
    DeleteInProgress,
    #[error("file storage is not configured")]
    StorageUnavailable,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FileRef {
    pub(crate) key: String,
    pub(crate) file_name: String,
    pub(crate) size_bytes: i64,
}

/// Per-question attachment slot. A slot is `Uploading` while an upload or
/// delete lease is held for it, which is what rejects the second concurrent
/// request instead of racing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AttachmentSlot {
    Idle,
    Uploading,
    Attached(FileRef),
}

pub(crate) fn slot_for(payload: Option<&AnswerPayload>, in_flight: bool) -> AttachmentSlot {
    if in_flight {
        return AttachmentSlot::Uploading;
    }
    match payload {
        Some(AnswerPayload::File { file_url, file_name, size_bytes }) => {
            AttachmentSlot::Attached(FileRef {
                key: file_url.clone(),
                file_name: file_name.clone(),
                size_bytes: *size_bytes,
            })
        }
        _ => AttachmentSlot::Idle,
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
            Some(extension.to_ascii_lowercase())
        }
        _ => None,
    }
}

pub(crate) fn sanitized_filename(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Size and extension checks that run before any network call. The
/// question's own limits win; the platform-wide defaults apply when the
/// question leaves them unset.
pub(crate) fn validate_upload(
    question: &Question,
    file_name: &str,
    size_bytes: i64,
    default_limit_mb: i64,
    default_extensions: &str,
) -> Result<(), UploadError> {
    let limit_mb = question.max_file_size_mb.map(i64::from).unwrap_or(default_limit_mb);
    if size_bytes > limit_mb * 1024 * 1024 {
        return Err(UploadError::TooLarge { limit_mb });
    }

    let extension = file_extension(file_name)
        .ok_or_else(|| UploadError::TypeNotAllowed { extension: String::new() })?;
    let allowed = question.allowed_file_types.as_deref().unwrap_or(default_extensions);
    if !extension_allowed(file_name, allowed) {
        return Err(UploadError::TypeNotAllowed { extension });
    }

    Ok(())
}

pub(crate) struct AttachmentManager {
    redis: RedisHandle,
    storage: Option<StorageService>,
    lock_ttl_seconds: u64,
    default_limit_mb: i64,
    default_extensions: String,
    download_url_ttl: Duration,
}

impl AttachmentManager {
    pub(crate) fn new(
        redis: RedisHandle,
        storage: Option<StorageService>,
        settings: &Settings,
    ) -> Self {
        Self {
            redis,
            storage,
            lock_ttl_seconds: settings.storage().attachment_lock_ttl_seconds,
            default_limit_mb: settings.storage().max_upload_size_mb as i64,
            default_extensions: settings.storage().allowed_file_extensions.join(","),
            download_url_ttl: Duration::from_secs(
                settings.storage().presigned_url_expire_minutes * 60,
            ),
        }
    }

    fn lease_key(submission_id: &str, question_id: &str) -> String {
        format!("attachment-lock:{submission_id}:{question_id}")
    }

    async fn release_lease(&self, key: &str) {
        if let Err(err) = self.redis.release(key).await {
            tracing::warn!(error = %err, key, "failed to release attachment lease");
        }
    }

    /// Uploads a new file for (submission, question), replacing any prior
    /// attachment. Validation runs before the lease and before any byte
    /// leaves the process. The prior object is removed only after the new
    /// one is stored.
    pub(crate) async fn upload(
        &self,
        submission_id: &str,
        question_id: &str,
        question: &Question,
        previous: Option<&AnswerPayload>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileRef, UploadError> {
        validate_upload(
            question,
            file_name,
            bytes.len() as i64,
            self.default_limit_mb,
            &self.default_extensions,
        )?;

        let storage = self.storage.as_ref().ok_or(UploadError::StorageUnavailable)?;

        let lease = Self::lease_key(submission_id, question_id);
        let acquired = self
            .redis
            .try_acquire(&lease, self.lock_ttl_seconds)
            .await
            .map_err(anyhow::Error::from)?;
        if !acquired {
            return Err(UploadError::UploadInProgress);
        }

        let result = self
            .upload_locked(storage, submission_id, question_id, previous, file_name, bytes)
            .await;
        self.release_lease(&lease).await;
        result
    }

    async fn upload_locked(
        &self,
        storage: &StorageService,
        submission_id: &str,
        question_id: &str,
        previous: Option<&AnswerPayload>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileRef, UploadError> {
        let safe_name = sanitized_filename(file_name);
        let key = format!("submissions/{submission_id}/{question_id}/{safe_name}");
        let extension = file_extension(&safe_name).unwrap_or_default();

        let (size_bytes, _checksum) = storage
            .upload_bytes(&key, content_type_for(&extension), bytes)
            .await?;

        if let AttachmentSlot::Attached(prior) = slot_for(previous, false) {
            if prior.key != key {
                if let Err(err) = storage.delete_object(&prior.key).await {
                    tracing::warn!(error = %err, key = %prior.key, "failed to remove replaced attachment");
                }
            }
        }

        Ok(FileRef { key, file_name: safe_name, size_bytes })
    }

    /// Deletes the stored object. The caller clears the answer payload only
    /// after this returns Ok, never optimistically.
    pub(crate) async fn delete(
        &self,
        submission_id: &str,
        question_id: &str,
        key: &str,
    ) -> Result<(), DeleteError> {
        let storage = self.storage.as_ref().ok_or(DeleteError::StorageUnavailable)?;

        let lease = Self::lease_key(submission_id, question_id);
        let acquired = self
            .redis
            .try_acquire(&lease, self.lock_ttl_seconds)
            .await
            .map_err(anyhow::Error::from)?;
        if !acquired {
            return Err(DeleteError::DeleteInProgress);
        }

        let result = storage.delete_object(key).await.map_err(DeleteError::Storage);
        self.release_lease(&lease).await;
        result
    }

    pub(crate) async fn download_url(&self, key: &str) -> Result<String, anyhow::Error> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            anyhow::anyhow!("file storage is not configured")
        })?;
        storage.presign_get(key, self.download_url_ttl).await
    }
}

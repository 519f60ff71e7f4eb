//! Attachment intake for locally supplied files.
//!
//! Builds [`Attachment`] metadata for the store. The lifecycle core only ever
//! sees this metadata; reading bytes (for the digest) happens here.
//!
//! The policy rejects:
//! - Files larger than the configured limit
//! - Names matching a denylist pattern (to avoid uploading secrets)

use std::path::Path;

use chrono::Utc;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;

use crate::domain::Attachment;

/// Limits applied to every attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentPolicy {
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Glob patterns to reject
    #[serde(default = "default_denylist")]
    pub denylist_patterns: Vec<String>,
}

fn default_max_size_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_denylist() -> Vec<String> {
    vec![
        "**/.env*".to_string(),
        "**/secrets*".to_string(),
        "**/*credential*".to_string(),
        "**/*.pem".to_string(),
        "**/*.key".to_string(),
    ]
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            denylist_patterns: default_denylist(),
        }
    }
}

impl AttachmentPolicy {
    /// Check if a path matches any denylist pattern
    pub fn is_denylisted(&self, path: &str) -> bool {
        self.denylist_patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|pattern| pattern.matches(path))
    }

    /// Check a file against the size limit and denylist
    pub fn check(&self, path: &Path, size_bytes: u64) -> Result<(), IntakeError> {
        let path_str = path.to_string_lossy();
        if self.is_denylisted(&path_str) {
            return Err(IntakeError::Denylisted {
                path: path_str.to_string(),
            });
        }

        if size_bytes > self.max_size_bytes {
            return Err(IntakeError::TooLarge {
                actual: size_bytes,
                limit: self.max_size_bytes,
            });
        }

        Ok(())
    }
}

/// Reasons an attachment is refused
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Attachment too large: {actual} > {limit} bytes")]
    TooLarge { actual: u64, limit: u64 },

    #[error("Path matches denylist pattern: {path}")]
    Denylisted { path: String },

    #[error("Not a regular file: {0}")]
    NotAFile(String),
}

/// Read a local file's metadata and digest into an [`Attachment`]
pub async fn collect_attachment(
    path: &Path,
    uploaded_by: &str,
    policy: &AttachmentPolicy,
) -> Result<Attachment, IntakeError> {
    let metadata = fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(IntakeError::NotAFile(path.display().to_string()));
    }

    policy.check(path, metadata.len())?;

    let bytes = fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = hex::encode(hasher.finalize());

    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(Attachment {
        mime_type: mime_type_for(path).to_string(),
        name,
        size_bytes: metadata.len(),
        url: path.display().to_string(),
        uploaded_by: uploaded_by.to_string(),
        uploaded_at: Utc::now(),
        sha256: Some(sha256),
    })
}

/// Best-effort MIME type from the file extension
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_denylist_matching() {
        let policy = AttachmentPolicy::default();

        assert!(policy.is_denylisted(".env"));
        assert!(policy.is_denylisted("config/secrets.json"));
        assert!(policy.is_denylisted("keys/server.key"));
        assert!(policy.is_denylisted("certs/server.pem"));
        assert!(policy.is_denylisted("exports/aws_credentials.csv"));

        assert!(!policy.is_denylisted("policies/security-policy.pdf"));
        assert!(!policy.is_denylisted("screenshot.png"));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("a/report.PDF")), "application/pdf");
        assert_eq!(mime_type_for(Path::new("shot.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_collect_attachment() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("policy.txt");
        std::fs::write(&path, "hello").unwrap();

        let attachment = collect_attachment(&path, "alice", &AttachmentPolicy::default())
            .await
            .unwrap();

        assert_eq!(attachment.name, "policy.txt");
        assert_eq!(attachment.size_bytes, 5);
        assert_eq!(attachment.mime_type, "text/plain");
        assert_eq!(attachment.uploaded_by, "alice");
        assert_eq!(
            attachment.sha256.as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
    }

    #[tokio::test]
    async fn test_collect_rejects_oversize_and_denylisted() {
        let temp = TempDir::new().unwrap();
        let big = temp.path().join("dump.txt");
        std::fs::write(&big, "x".repeat(200)).unwrap();
        let secret = temp.path().join("server.key");
        std::fs::write(&secret, "-----BEGIN").unwrap();

        let policy = AttachmentPolicy {
            max_size_bytes: 100,
            ..Default::default()
        };

        match collect_attachment(&big, "alice", &policy).await {
            Err(IntakeError::TooLarge { actual, limit }) => {
                assert_eq!(actual, 200);
                assert_eq!(limit, 100);
            }
            other => panic!("Expected TooLarge, got {:?}", other),
        }

        assert!(matches!(
            collect_attachment(&secret, "alice", &policy).await,
            Err(IntakeError::Denylisted { .. })
        ));

        assert!(matches!(
            collect_attachment(temp.path(), "alice", &policy).await,
            Err(IntakeError::NotAFile(_))
        ));
    }
}

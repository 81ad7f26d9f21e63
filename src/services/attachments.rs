use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

pub const ATTACHMENT_SUBDIR: &str = "complaint_attachments";

/// Writes uploads under `<media root>/complaint_attachments/`. File names get
/// a UUID prefix so identical uploads never clobber each other.
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persists upload bytes and returns the path relative to the media root,
    /// which is what gets stored on the complaint row.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let dir = self.root.join(ATTACHMENT_SUBDIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        Ok(format!("{ATTACHMENT_SUBDIR}/{file_name}"))
    }
}

/// Strips any directory components and reduces the rest to a safe character
/// set. Uploads only ever land directly inside the attachment directory.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| matches!(c, '.' | '_')) {
        "attachment".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("/var/log/app.log"), "app.log");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_file_name("weird name!.png"), "weird_name_.png");
    }

    #[test]
    fn sanitize_falls_back_for_degenerate_names() {
        assert_eq!(sanitize_file_name(""), "attachment");
        assert_eq!(sanitize_file_name("..."), "attachment");
    }

    #[tokio::test]
    async fn save_writes_bytes_and_returns_relative_path() {
        let root = std::env::temp_dir().join(format!("compdesk-attachments-{}", Uuid::new_v4()));
        let store = AttachmentStore::new(&root);

        let path = store.save("photo.jpg", b"jpeg bytes").await.unwrap();
        assert!(path.starts_with("complaint_attachments/"));
        assert!(path.ends_with("-photo.jpg"));

        let written = tokio::fs::read(root.join(&path)).await.unwrap();
        assert_eq!(written, b"jpeg bytes");

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn identical_names_do_not_collide() {
        let root = std::env::temp_dir().join(format!("compdesk-attachments-{}", Uuid::new_v4()));
        let store = AttachmentStore::new(&root);

        let first = store.save("report.pdf", b"one").await.unwrap();
        let second = store.save("report.pdf", b"two").await.unwrap();
        assert_ne!(first, second);

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::PathBuf;
use tourdesk_core::storage::{ReceiptStorage, Upload};
use tourdesk_core::{CoreError, CoreResult};
use tracing::info;
use uuid::Uuid;

use crate::app_config::StorageConfig;

/// Stores uploads under `{root}/uploads/{category}/{images|pdfs}/` and hands
/// back the public path of the file.
pub struct LocalReceiptStorage {
    root: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

impl LocalReceiptStorage {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
            max_bytes,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.root, &config.public_prefix, config.max_upload_bytes)
    }
}

fn check_category(category: &str) -> CoreResult<()> {
    let valid = !category.is_empty()
        && category
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(CoreError::ValidationError(format!(
            "invalid storage category: {:?}",
            category
        )));
    }
    Ok(())
}

fn unique_name(extension: &str) -> String {
    let prefix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("{}_{}.{}", prefix, Uuid::new_v4(), extension)
}

#[async_trait]
impl ReceiptStorage for LocalReceiptStorage {
    async fn store(&self, upload: &Upload, category: &str) -> CoreResult<String> {
        let kind = upload.validate(self.max_bytes)?;
        check_category(category)?;

        let relative = format!(
            "uploads/{}/{}/{}",
            category,
            kind.folder(),
            unique_name(&upload.extension(kind))
        );
        let path = self.root.join(&relative);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(CoreError::internal)?;
        }
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(CoreError::internal)?;

        info!(path = %path.display(), bytes = upload.bytes.len(), "Upload stored");
        Ok(format!("{}/{}", self.public_prefix.trim_end_matches('/'), relative))
    }
}

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Where finished archives end up.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;
    async fn exists(&self, path: &str) -> Result<bool>;
}

pub struct NativeStorage;

impl NativeStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for NativeStorage {
    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("nested").join("mission.zip");
        let target = target.to_string_lossy().to_string();

        let storage = NativeStorage::new();
        storage.write(&target, b"PK").await?;

        assert!(storage.exists(&target).await?);
        assert_eq!(tokio::fs::read(&target).await?, b"PK");
        assert!(!storage.exists(&format!("{}.bak", target)).await?);
        Ok(())
    }
}

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use url::Url;

use crate::application::ports::blob_storage::{BlobStorage, BlobStorageError, StoredBlob};

/// Blobs as plain files under `root`, publicly readable through the server's
/// `/blobs` route.
pub struct LocalBlobStorage {
    root: PathBuf,
    public_base: Url,
    url_path_prefix: String,
}

impl LocalBlobStorage {
    pub fn new(root: PathBuf, public_base_url: &str) -> Result<Self, BlobStorageError> {
        let public_base = Url::parse(public_base_url)
            .map_err(|e| BlobStorageError::InvalidUrl(format!("{}: {}", public_base_url, e)))?;
        let url_path_prefix = format!("{}/blobs/", public_base.path().trim_end_matches('/'));

        Ok(Self {
            root,
            public_base,
            url_path_prefix,
        })
    }

    pub async fn ensure_directory_exists(&self) -> Result<(), BlobStorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BlobStorageError::IoError(e.to_string()))
    }

    fn resolve(&self, pathname: &str) -> Result<PathBuf, BlobStorageError> {
        validate_pathname(pathname)?;
        Ok(pathname.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    fn stored(&self, pathname: String, size: u64) -> StoredBlob {
        StoredBlob {
            url: self.url_for(&pathname),
            pathname,
            size,
        }
    }
}

fn validate_pathname(pathname: &str) -> Result<(), BlobStorageError> {
    if pathname.is_empty() {
        return Err(BlobStorageError::InvalidPath("empty pathname".to_string()));
    }

    for segment in pathname.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains(['\\', '\0'])
        {
            return Err(BlobStorageError::InvalidPath(pathname.to_string()));
        }
    }
    Ok(())
}

fn io_error(e: std::io::Error) -> BlobStorageError {
    BlobStorageError::IoError(e.to_string())
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn put(&self, pathname: &str, data: &[u8]) -> Result<StoredBlob, BlobStorageError> {
        let path = self.resolve(pathname)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        fs::write(&path, data).await.map_err(io_error)?;

        tracing::debug!("Stored blob {} ({} bytes)", pathname, data.len());
        Ok(self.stored(pathname.to_string(), data.len() as u64))
    }

    async fn delete(&self, pathname: &str) -> Result<bool, BlobStorageError> {
        let path = self.resolve(pathname)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredBlob>, BlobStorageError> {
        let mut blobs = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir, relative)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(e)),
            };

            while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
                let name = entry.file_name().to_string_lossy().to_string();
                let pathname = if relative.is_empty() {
                    name
                } else {
                    format!("{}/{}", relative, name)
                };
                let file_type = entry.file_type().await.map_err(io_error)?;

                if file_type.is_dir() {
                    pending.push((entry.path(), pathname));
                } else if file_type.is_file() && pathname.starts_with(prefix) {
                    let size = entry.metadata().await.map_err(io_error)?.len();
                    blobs.push(self.stored(pathname, size));
                }
            }
        }

        blobs.sort_by(|a, b| a.pathname.cmp(&b.pathname));
        Ok(blobs)
    }

    fn url_for(&self, pathname: &str) -> String {
        let encoded: Vec<String> = pathname
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        format!(
            "{}{}",
            self.public_base.origin().ascii_serialization(),
            self.url_path_prefix
        ) + &encoded.join("/")
    }

    fn pathname_from_url(&self, url: &str) -> Result<String, BlobStorageError> {
        let parsed =
            Url::parse(url).map_err(|e| BlobStorageError::InvalidUrl(format!("{}: {}", url, e)))?;

        if parsed.origin() != self.public_base.origin() {
            return Err(BlobStorageError::InvalidUrl(format!(
                "{} is not served by this blob store",
                url
            )));
        }

        let encoded = parsed
            .path()
            .strip_prefix(&self.url_path_prefix)
            .ok_or_else(|| BlobStorageError::InvalidUrl(format!("{} is not a blob URL", url)))?;
        let pathname = urlencoding::decode(encoded)
            .map_err(|e| BlobStorageError::InvalidUrl(e.to_string()))?
            .into_owned();

        validate_pathname(&pathname)?;
        Ok(pathname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn storage(root: &Path) -> LocalBlobStorage {
        LocalBlobStorage::new(root.to_path_buf(), "http://localhost:3000").unwrap()
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());

        let stored = storage.put("ann@x.io/rota.pdf", b"%PDF-1.5").await.unwrap();
        assert_eq!(stored.size, 8);
        assert_eq!(stored.url, "http://localhost:3000/blobs/ann%40x.io/rota.pdf");
        let on_disk = dir.path().join("ann@x.io").join("rota.pdf");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"%PDF-1.5");

        assert!(storage.delete("ann@x.io/rota.pdf").await.unwrap());
        assert!(!on_disk.exists());
        assert!(!storage.delete("ann@x.io/rota.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());

        storage.put("a@b.c/x.txt", b"one").await.unwrap();
        storage.put("a@b.c/x.txt", b"two").await.unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("a@b.c").join("x.txt")).unwrap(),
            b"two"
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());

        storage.put("ann@x.io/b.txt", b"1").await.unwrap();
        storage.put("ann@x.io/a.txt", b"22").await.unwrap();
        storage.put("bob@x.io/c.txt", b"3").await.unwrap();

        let listed = storage.list("ann@x.io/").await.unwrap();
        let names: Vec<&str> = listed.iter().map(|b| b.pathname.as_str()).collect();

        assert_eq!(names, vec!["ann@x.io/a.txt", "ann@x.io/b.txt"]);
        assert_eq!(listed[0].size, 2);
    }

    #[tokio::test]
    async fn test_list_on_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir.path().join("not-created"));

        assert!(storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());

        for bad in ["../etc/passwd", "a@b.c/../../x", "/abs", "a@b.c//x", ""] {
            assert!(
                matches!(storage.put(bad, b"x").await, Err(BlobStorageError::InvalidPath(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_url_round_trip() {
        let storage =
            LocalBlobStorage::new(PathBuf::from("/tmp/unused"), "https://files.example.com/app/")
                .unwrap();

        let url = storage.url_for("ann@x.io/shift rota.pdf");
        assert_eq!(
            url,
            "https://files.example.com/app/blobs/ann%40x.io/shift%20rota.pdf"
        );
        assert_eq!(
            storage.pathname_from_url(&url).unwrap(),
            "ann@x.io/shift rota.pdf"
        );
    }

    #[test]
    fn test_foreign_urls_are_rejected() {
        let storage = LocalBlobStorage::new(PathBuf::from("/tmp/unused"), "http://localhost:3000")
            .unwrap();

        for bad in [
            "not a url",
            "http://evil.example/blobs/ann%40x.io/a.pdf",
            "http://localhost:3000/other/ann%40x.io/a.pdf",
            "http://localhost:3000/blobs/ann%40x.io/..%2F..%2Fsecret",
        ] {
            assert!(storage.pathname_from_url(bad).is_err(), "{} should be rejected", bad);
        }
    }
}

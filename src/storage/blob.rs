use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use crate::foundation::error::{VersecastError, VersecastResult};

/// Content type used for progress records.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type used for finished videos.
pub const MP4_CONTENT_TYPE: &str = "video/mp4";

/// Remote object storage capability: get/put whole objects by key.
pub trait BlobStore {
    /// Fetch an object. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> VersecastResult<Option<Vec<u8>>>;
    /// Store an object, replacing any previous value.
    fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> VersecastResult<()>;
    /// Short human-readable location for logs.
    fn describe(&self) -> String;
}

/// Normalize an object key to forward slashes, rejecting absolute keys and `..` segments.
pub fn normalize_key(key: &str) -> VersecastResult<String> {
    let s = key.replace('\\', "/");
    if s.starts_with('/') {
        return Err(VersecastError::store(format!(
            "object key must be relative: {key:?}"
        )));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(VersecastError::store(format!(
                "object key must not contain '..': {key:?}"
            )));
        }
        out.push(part);
    }
    if out.is_empty() {
        return Err(VersecastError::store("object key must be non-empty"));
    }
    Ok(out.join("/"))
}

/// Blob store backed by a local directory; keys map to relative file paths.
#[derive(Clone, Debug)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    /// Store objects under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> VersecastResult<PathBuf> {
        Ok(self.root.join(normalize_key(key)?))
    }
}

impl BlobStore for DirBlobStore {
    fn get(&self, key: &str) -> VersecastResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VersecastError::store(format!(
                "read '{}': {e}",
                path.display()
            ))),
        }
    }

    fn put(&self, key: &str, body: Vec<u8>, _content_type: &str) -> VersecastResult<()> {
        let path = self.path_for(key)?;
        crate::media::ffmpeg::ensure_parent_dir(&path)?;
        std::fs::write(&path, body)
            .map_err(|e| VersecastError::store(format!("write '{}': {e}", path.display())))
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}

/// Blob store speaking plain HTTP: `GET`/`PUT {base_url}/{key}`.
///
/// Works against any object gateway that accepts unsigned or bearer-authenticated requests
/// (MinIO/S3 buckets with a write policy, nginx WebDAV, a signing proxy).
pub struct HttpBlobStore {
    client: reqwest::blocking::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl std::fmt::Debug for HttpBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBlobStore")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpBlobStore {
    /// Talk to `base_url` with the given request timeout.
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> VersecastResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(VersecastError::validation(format!(
                "store url must start with http:// or https://: {base_url:?}"
            )));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VersecastError::store(format!("build http client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            bearer_token,
        })
    }

    fn url_for(&self, key: &str) -> VersecastResult<String> {
        Ok(format!("{}/{}", self.base_url, normalize_key(key)?))
    }

    fn authorize(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

impl BlobStore for HttpBlobStore {
    fn get(&self, key: &str) -> VersecastResult<Option<Vec<u8>>> {
        let url = self.url_for(key)?;
        let resp = self
            .authorize(self.client.get(&url))
            .send()
            .map_err(|e| VersecastError::store(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(VersecastError::store(format!("GET {url}: status {status}")));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| VersecastError::store(format!("GET {url}: read body: {e}")))?;
        Ok(Some(bytes.to_vec()))
    }

    fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> VersecastResult<()> {
        let url = self.url_for(key)?;
        let resp = self
            .authorize(self.client.put(&url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .map_err(|e| VersecastError::store(format!("PUT {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VersecastError::store(format!("PUT {url}: status {status}")));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// In-memory blob store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, in order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Content type recorded for `key`, if present.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(|(_, ct)| ct.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, (Vec<u8>, String)>> {
        // A panic while holding the lock leaves the map itself intact.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> VersecastResult<Option<Vec<u8>>> {
        let key = normalize_key(key)?;
        Ok(self.lock().get(&key).map(|(bytes, _)| bytes.clone()))
    }

    fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> VersecastResult<()> {
        let key = normalize_key(key)?;
        self.lock().insert(key, (body, content_type.to_owned()));
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    fn get(&self, key: &str) -> VersecastResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> VersecastResult<()> {
        (**self).put(key, body, content_type)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/blob.rs"]
mod tests;

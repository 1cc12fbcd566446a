use crate::config::StorageDir;
use crate::fetch::{derive_filename, AudioResource, FetchError, ResourceFetcher};
use crate::util::error_chain;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

const LOG_TARGET: &str = "fetch::http";

/// Streams remote audio into the storage directory.
///
/// The target file is opened with truncation and written chunk by chunk with
/// no lock and no temp-file rename. A failed or timed-out transfer leaves the
/// partial file in place, and a concurrent decode of the same name may observe
/// it half written.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    storage: StorageDir,
}

impl HttpFetcher {
    pub fn new(storage: StorageDir, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, storage })
    }

    pub fn storage(&self) -> &StorageDir {
        &self.storage
    }

    async fn download(&self, url: Url) -> Result<AudioResource, FetchError> {
        let filename = derive_filename(&url);
        let path = self.storage.path().join(&filename);
        tracing::info!(target: LOG_TARGET, url = %url, target = %path.display(), "downloading audio");

        tokio::fs::create_dir_all(self.storage.path()).await?;

        let mut response = self.client.get(url.clone()).send().await.map_err(|e| {
            tracing::warn!(
                target: LOG_TARGET,
                url = %url,
                error = %error_chain(&e),
                "audio request failed"
            );
            FetchError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::info!(target: LOG_TARGET, filename = %filename, bytes = written, "audio downloaded");
        Ok(AudioResource {
            url,
            filename,
            path,
        })
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, url: Url) -> BoxFuture<'_, Result<AudioResource, FetchError>> {
        self.download(url).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve_once, serve_stalled, unreachable_url};
    use std::error::Error as _;

    fn fetcher(dir: &tempfile::TempDir) -> HttpFetcher {
        let storage = StorageDir::new(dir.path().join("audio")).unwrap();
        HttpFetcher::new(storage, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn writes_body_under_derived_name_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let body = vec![7u8; 20_000];
        let base = serve_once(200, body.clone()).await;
        let url = base.join("clip.wav?tok=1").unwrap();

        let resource = fetcher(&dir).fetch(url).await.unwrap();

        assert_eq!(resource.filename, "clip.wav");
        assert_eq!(resource.path, dir.path().join("audio").join("clip.wav"));
        assert_eq!(std::fs::read(&resource.path).unwrap(), body);
    }

    #[tokio::test]
    async fn overwrites_existing_file_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let f = fetcher(&dir);
        std::fs::create_dir_all(f.storage().path()).unwrap();
        std::fs::write(f.storage().path().join("take.mp3"), b"old contents that are longer").unwrap();

        let base = serve_once(200, b"new".to_vec()).await;
        let resource = f.fetch(base.join("take.mp3").unwrap()).await.unwrap();

        assert_eq!(std::fs::read(&resource.path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn unrecognized_name_is_stored_as_generated_wav() {
        let dir = tempfile::tempdir().unwrap();
        let base = serve_once(200, b"bytes".to_vec()).await;
        let resource = fetcher(&dir)
            .fetch(base.join("stream?id=7").unwrap())
            .await
            .unwrap();

        assert!(resource.filename.ends_with(".wav"));
        assert_ne!(resource.filename, "stream");
        assert!(resource.path.exists());
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = serve_once(404, b"missing".to_vec()).await;
        let err = fetcher(&dir)
            .fetch(base.join("gone.wav").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }));
        assert!(!dir.path().join("audio").join("gone.wav").exists());
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = fetcher(&dir).fetch(unreachable_url().await).await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
        let message = err.to_string().to_lowercase();
        assert!(message.contains("connect"), "cause missing from {message}");
    }

    #[tokio::test]
    async fn stalled_body_times_out_and_leaves_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageDir::new(dir.path().join("audio")).unwrap();
        let f = HttpFetcher::new(storage, Duration::from_millis(300)).unwrap();
        let partial = vec![3u8; 512];
        let (base, server) = serve_stalled(64 * 1024, partial.clone()).await;

        let err = f.fetch(base.join("slow.wav").unwrap()).await.unwrap_err();
        server.abort();

        match &err {
            FetchError::Http(e) => {
                assert!(e.is_timeout(), "not a timeout: {e:?} ({:?})", e.source())
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("timed out"), "cause missing from {message}");

        let path = dir.path().join("audio").join("slow.wav");
        let written = std::fs::read(&path).expect("partial file remains");
        assert!(written.len() <= partial.len());
        assert!(partial.starts_with(&written));
    }
}

use futures::future::BoxFuture;
use std::path::PathBuf;
use url::Url;

mod http;
mod naming;

pub use http::HttpFetcher;
pub use naming::{derive_filename, generated_filename, FALLBACK_EXTENSION, SUPPORTED_EXTENSIONS};

/// A downloaded audio file in shared storage.
///
/// Files are never cleaned up or reused. Two fetches that derive the same
/// filename write to the same path and the last writer wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioResource {
    pub url: Url,
    pub filename: String,
    pub path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("http error: {}", crate::util::error_chain(.0))]
    Http(#[from] reqwest::Error),

    #[error("http status {status} for url {url}")]
    HttpStatus { status: u16, url: String },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub trait ResourceFetcher: Send + Sync {
    fn fetch(&self, url: Url) -> BoxFuture<'_, Result<AudioResource, FetchError>>;
}

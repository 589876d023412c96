use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use super::error::FetchError;
use crate::config::types::FetchSettings;

/// 内容获取接口
///
/// 给定 URL 返回原始字节；任何非成功状态或传输错误都归为一个 `FetchError`。
pub trait ContentFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher with a bounded timeout.
///
/// `file://` URLs and bare filesystem paths are read from disk so local
/// rule configs and subscription dumps work without a server.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let mut builder =
            reqwest::blocking::Client::builder().timeout(Duration::from_secs(settings.timeout_secs));
        if let Some(ref ua) = settings.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let client = builder.build().map_err(|e| FetchError::Http {
            url: String::new(),
            source: e,
        })?;
        Ok(Self { client })
    }

    fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;
        debug!(url = url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_http(url);
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        read_local(path)
    }
}

fn read_local(path: &str) -> Result<Vec<u8>, FetchError> {
    std::fs::read(Path::new(path)).map_err(|e| FetchError::Io {
        path: path.to_string(),
        source: e,
    })
}

/// In-memory fetcher keyed by exact URL. Unknown URLs answer 404.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    entries: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.entries.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }
}

impl ContentFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.entries
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

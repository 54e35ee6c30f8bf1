use std::path::PathBuf;

use chardetng::EncodingDetector;
use duesync_logging::ds_debug;
use encoding_rs::Encoding;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::transport::HttpSettings;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("page too large (max {max_bytes}, actual {actual})")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error("unsupported content type {0}")]
    UnsupportedContentType(String),
    #[error("failed to decode page as {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(String),
}

/// The schedule page as seen from outside: something that can be nudged
/// into showing the schedule and then read.
#[async_trait::async_trait]
pub trait PageSession: Send + Sync {
    /// Simulated interaction that makes the page render its schedule table.
    async fn reveal(&self) -> Result<(), PageError>;

    /// Current page HTML.
    async fn snapshot(&self) -> Result<String, PageError>;
}

#[derive(Debug, Clone)]
pub struct PageSettings {
    pub page_url: String,
    /// Optional endpoint hit once before reading, e.g. the schedule tab link.
    pub reveal_url: Option<String>,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl PageSettings {
    pub fn for_url(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            reveal_url: None,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpPageSession {
    client: reqwest::Client,
    settings: PageSettings,
}

impl HttpPageSession {
    pub fn new(settings: PageSettings, http: &HttpSettings) -> Result<Self, PageError> {
        let client = reqwest::Client::builder()
            .connect_timeout(http.connect_timeout)
            .timeout(http.request_timeout)
            .build()
            .map_err(|err| PageError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, PageError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|err| PageError::InvalidUrl(err.to_string()))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PageError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl PageSession for HttpPageSession {
    async fn reveal(&self) -> Result<(), PageError> {
        if let Some(url) = self.settings.reveal_url.as_deref() {
            self.get(url).await?;
            ds_debug!("Reveal request to {} succeeded", url);
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<String, PageError> {
        let max_bytes = self.settings.max_bytes;
        let response = self.get(&self.settings.page_url).await?;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(PageError::TooLarge {
                    max_bytes,
                    actual: content_len,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(PageError::UnsupportedContentType(ct.to_string()));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(PageError::TooLarge {
                    max_bytes,
                    actual: next_len,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        decode_html(&bytes, content_type.as_deref())
    }
}

/// Reads a saved copy of the schedule page.
#[derive(Debug, Clone)]
pub struct FilePageSession {
    path: PathBuf,
}

impl FilePageSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl PageSession for FilePageSession {
    async fn reveal(&self) -> Result<(), PageError> {
        Ok(())
    }

    async fn snapshot(&self) -> Result<String, PageError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|err| PageError::Io(format!("{}: {err}", self.path.display())))?;
        decode_html(&bytes, None)
    }
}

/// Decode page bytes to UTF-8: BOM, then Content-Type charset, then chardetng.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> Result<String, PageError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(enc) = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, enc);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> Result<String, PageError> {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(PageError::Decode(enc.name().to_string()));
    }
    Ok(text.into_owned())
}

fn map_reqwest_error(err: reqwest::Error) -> PageError {
    if err.is_timeout() {
        return PageError::Timeout;
    }
    PageError::Network(err.to_string())
}

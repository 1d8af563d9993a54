use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::{BibleProvider, ProviderError, VerseRequest, format_verses};

pub const DEFAULT_BASE_URL: &str = "https://bible-api.com";

/// Translations served by bible-api.com.
const TRANSLATIONS: &[&str] = &["KJV", "WEB", "ASV", "BBE", "DARBY", "YLT", "OEB-US", "WEBBE"];

/// HTTP provider for bible-api.com and compatible endpoints.
pub struct BibleApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl BibleApi {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder().user_agent("lectern/0.1 (citation lookup)");
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// `<base>/<book>+<chapter>:<start>-<end>?translation=<code>`
    pub fn url_for(&self, request: &VerseRequest) -> String {
        let passage = if request.verse_start == request.verse_end {
            format!("{}:{}", request.chapter, request.verse_start)
        } else {
            format!(
                "{}:{}-{}",
                request.chapter, request.verse_start, request.verse_end
            )
        };
        format!(
            "{}/{}+{}?translation={}",
            self.base_url,
            urlencoding::encode(&request.book),
            passage,
            urlencoding::encode(&request.translation.to_lowercase())
        )
    }
}

/// Pull numbered verses out of a bible-api.com JSON body.
pub fn parse_response(
    data: &serde_json::Value,
    request: &VerseRequest,
) -> Result<String, ProviderError> {
    if let Some(error) = data["error"].as_str() {
        return Err(ProviderError::VerseNotFound(format!(
            "{} ({error})",
            request.label()
        )));
    }

    let verses = data["verses"]
        .as_array()
        .ok_or_else(|| ProviderError::Malformed("missing \"verses\" array".to_string()))?;

    let mut out = Vec::with_capacity(verses.len());
    for verse in verses {
        let number = verse["verse"]
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| ProviderError::Malformed("verse without a number".to_string()))?;
        let text = verse["text"]
            .as_str()
            .ok_or_else(|| ProviderError::Malformed(format!("verse {number} without text")))?;
        out.push((number, text));
    }

    if out.is_empty() {
        return Err(ProviderError::VerseNotFound(request.label()));
    }
    Ok(format_verses(out))
}

impl BibleProvider for BibleApi {
    fn name(&self) -> &str {
        "bible-api"
    }

    fn supports(&self, translation: &str) -> bool {
        TRANSLATIONS.iter().any(|t| t.eq_ignore_ascii_case(translation))
    }

    fn fetch_verses<'a>(
        &'a self,
        request: &'a VerseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.supports(&request.translation) {
                return Err(ProviderError::UnsupportedTranslation(
                    request.translation.clone(),
                ));
            }

            let url = self.url_for(request);
            tracing::debug!(url = %url, "fetching verses");

            let resp = self.client.get(&url).send().await.map_err(|e| {
                match self.timeout {
                    Some(t) if e.is_timeout() => ProviderError::Timeout(t),
                    _ => ProviderError::Unavailable(e.to_string()),
                }
            })?;

            let status = resp.status();
            if status.as_u16() == 404 {
                return Err(ProviderError::VerseNotFound(request.label()));
            }
            if !status.is_success() {
                return Err(ProviderError::Http(format!("HTTP {status}")));
            }

            let data: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| ProviderError::Malformed(e.to_string()))?;
            parse_response(&data, request)
        })
    }
}

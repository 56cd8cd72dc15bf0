//! Review store
//!
//! Holds the review texts loaded once at startup from a tab-separated dataset
//! with a header row. Only the `text` column is kept; blank entries are
//! dropped and source order is preserved.

use rand::seq::SliceRandom;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Column holding the review body
pub const TEXT_COLUMN: &str = "text";

/// Dataset loading errors
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch dataset {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Dataset has no header row")]
    MissingHeader,

    #[error("Dataset header has no '{0}' column")]
    MissingColumn(&'static str),
}

/// A single review. The text is always non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    text: String,
}

impl Review {
    /// Build a review from raw text, rejecting blank input
    pub fn new(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self {
                text: text.to_string(),
            })
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Where the dataset comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Url(String),
}

impl DatasetSource {
    /// `http://` and `https://` locations are fetched, anything else is a path
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    /// Read the raw dataset body
    pub async fn fetch(&self, client: &Client) -> Result<String, DatasetError> {
        match self {
            Self::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| DatasetError::Read {
                        path: path.clone(),
                        source,
                    })
            }
            Self::Url(url) => {
                let fetch_error = |message: String| DatasetError::Fetch {
                    url: url.clone(),
                    message,
                };

                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| fetch_error(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(fetch_error(format!("HTTP {}", response.status())));
                }

                response.text().await.map_err(|e| fetch_error(e.to_string()))
            }
        }
    }
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Split tab-separated input into records
///
/// A field that starts with `"` is quoted: it may contain tabs and line
/// breaks, and `""` inside it stands for one quote. Line endings may be `\n`,
/// `\r\n` or `\r`. Blank lines produce no record. An unterminated quote runs
/// to the end of input.
pub fn parse_tsv_records(input: &str) -> Vec<Vec<String>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut at_field_start = true;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' if at_field_start => {
                in_quotes = true;
                at_field_start = false;
            }
            '\t' => {
                record.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
                at_field_start = true;
            }
            _ => {
                field.push(c);
                at_field_start = false;
            }
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

/// Extract reviews from a TSV body with a header row
pub fn parse_reviews(input: &str) -> Result<Vec<Review>, DatasetError> {
    let mut records = parse_tsv_records(input).into_iter();
    let header = records.next().ok_or(DatasetError::MissingHeader)?;

    let column = header
        .iter()
        .position(|name| name.trim() == TEXT_COLUMN)
        .ok_or(DatasetError::MissingColumn(TEXT_COLUMN))?;

    let reviews: Vec<Review> = records
        .filter_map(|record| record.get(column).and_then(|text| Review::new(text)))
        .collect();

    debug!(
        columns = header.len(),
        reviews = reviews.len(),
        "Parsed review dataset"
    );

    Ok(reviews)
}

/// Load progress of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug)]
struct Inner {
    reviews: Vec<Review>,
    state: LoadState,
}

/// In-memory review collection, filled once at startup
#[derive(Debug, Clone)]
pub struct ReviewStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for ReviewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                reviews: Vec::new(),
                state: LoadState::Pending,
            })),
        }
    }

    /// Store pre-parsed reviews (already loaded)
    pub fn from_reviews(reviews: Vec<Review>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                reviews,
                state: LoadState::Loaded,
            })),
        }
    }

    /// Fetch and parse the dataset
    ///
    /// On failure the store stays empty and is marked failed. Nothing retries.
    pub async fn load(&self, source: &DatasetSource, client: &Client) -> Result<usize, DatasetError> {
        let parsed = match source.fetch(client).await {
            Ok(body) => parse_reviews(&body),
            Err(e) => Err(e),
        };

        let mut inner = self.inner.write().await;
        match parsed {
            Ok(reviews) => {
                let count = reviews.len();
                inner.reviews = reviews;
                inner.state = LoadState::Loaded;
                Ok(count)
            }
            Err(e) => {
                inner.reviews.clear();
                inner.state = LoadState::Failed;
                Err(e)
            }
        }
    }

    /// Uniformly random review, or None when the store is empty
    pub async fn pick_random(&self) -> Option<Review> {
        let inner = self.inner.read().await;
        inner.reviews.choose(&mut rand::thread_rng()).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.reviews.len()
    }

    pub async fn state(&self) -> LoadState {
        self.inner.read().await.state
    }
}

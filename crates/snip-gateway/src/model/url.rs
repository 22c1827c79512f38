use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// One entry of a batch shorten request.
#[derive(Debug, Deserialize)]
pub struct BatchShortenItem {
    pub original_url: String,
    #[serde(default)]
    pub correlation_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

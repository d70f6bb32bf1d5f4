use std::time::Duration;

use serde::{Deserialize, Serialize};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

pub struct Client {
    api_key: String,
    http: reqwest::Client,
}

#[derive(Debug, Clone, Copy)]
pub enum Model {
    Haiku,
}

impl Model {
    fn as_str(&self) -> &'static str {
        match self {
            Model::Haiku => "claude-haiku-4-5-20251001",
        }
    }
}

/// Sampling settings for a single completion.
#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'static str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl Client {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self { api_key, http })
    }

    /// Send a single user prompt and return the first content block's text.
    pub async fn complete(&self, model: Model, prompt: &str, sampling: Sampling) -> Result<String, Error> {
        let request = ApiRequest {
            model: model.as_str(),
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        first_text(api_response)
    }
}

fn first_text(response: ApiResponse) -> Result<String, Error> {
    response
        .content
        .into_iter()
        .next()
        .map(|c| c.text)
        .ok_or(Error::Empty)
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
    Empty,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
            Error::Empty => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ApiRequest {
            model: Model::Haiku.as_str(),
            max_tokens: 60,
            temperature: 0.5,
            messages: vec![ApiMessage { role: "user", content: "hi" }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 60);
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_first_text() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Yellow by Coldplay"},{"type":"text","text":"ignored"}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(response).unwrap(), "Yellow by Coldplay");
    }

    #[test]
    fn test_no_content_is_empty_error() {
        let response: ApiResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(matches!(first_text(response), Err(Error::Empty)));
    }
}

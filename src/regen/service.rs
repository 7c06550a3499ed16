use crate::error::GenerationError;
use crate::manifest::GeneratePayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// The manifest flavor the generation service is asked to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManifestDialect {
    #[default]
    DockerCompose,
    Kubernetes,
}

impl ManifestDialect {
    pub fn path(&self) -> &'static str {
        match self {
            ManifestDialect::DockerCompose => "generate/docker-compose",
            ManifestDialect::Kubernetes => "generate/kubernetes",
        }
    }

    pub fn parse_str(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "DOCKER_COMPOSE" | "COMPOSE" => Some(ManifestDialect::DockerCompose),
            "KUBERNETES" | "K8S" => Some(ManifestDialect::Kubernetes),
            _ => None,
        }
    }
}

impl fmt::Display for ManifestDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestDialect::DockerCompose => write!(f, "DOCKER_COMPOSE"),
            ManifestDialect::Kubernetes => write!(f, "KUBERNETES"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub dialect: ManifestDialect,
    pub payload: GeneratePayload,
}

/// Turns a [`GeneratePayload`] into manifest text.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct RequestBody<'a> {
    data: &'a GeneratePayload,
}

#[derive(Deserialize)]
struct ResponseBody {
    code: String,
    #[serde(default)]
    error: Option<String>,
}

/// Generation over HTTP. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpGenerationService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGenerationService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, dialect: ManifestDialect) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), dialect.path())
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    #[instrument(level = "debug", skip_all, fields(dialect = %request.dialect))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = self.endpoint(request.dialect);
        debug!(%url, "Requesting manifest");
        let response = self
            .client
            .post(&url)
            .json(&RequestBody {
                data: &request.payload,
            })
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !matches!(status, 200 | 201 | 202) {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let body: ResponseBody = response
            .json()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        match body.error {
            Some(error) if !error.is_empty() => Err(GenerationError::Service(error)),
            _ => Ok(body.code),
        }
    }
}

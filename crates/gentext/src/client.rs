use reqwest::Client;

use crate::error::GentextError;
use crate::models::{GenerationRequest, GenerationResponse};

pub(crate) const USER_AGENT: &str = "ani-enrich/0.1";

/// Client for the two-tier character text-generation service.
///
/// `comprehensive` is the richer primary tier, `detailed` the simpler
/// fallback. Both accept the same request shape.
pub struct GentextClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GentextClient {
    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Call the primary (richer) generation tier.
    pub async fn generate_comprehensive(
        &self,
        request: &GenerationRequest,
    ) -> crate::Result<GenerationResponse> {
        self.generate("/v1/character/comprehensive", request).await
    }

    /// Call the fallback (simpler) generation tier.
    pub async fn generate_detailed(
        &self,
        request: &GenerationRequest,
    ) -> crate::Result<GenerationResponse> {
        self.generate("/v1/character/detailed", request).await
    }

    async fn generate(
        &self,
        path: &str,
        request: &GenerationRequest,
    ) -> crate::Result<GenerationResponse> {
        let response = self
            .client
            .post(self.url(path))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GentextError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let payload: GenerationResponse = response.json().await?;
        if !payload.is_usable() {
            return Err(GentextError::UnusablePayload(
                "empty personality analysis".to_string(),
            ));
        }

        Ok(payload)
    }
}

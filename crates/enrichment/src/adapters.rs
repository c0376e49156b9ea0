//! Adapter bridging the external generation client to the pipeline's
//! backend seam.

use async_trait::async_trait;

use domain::CharacterProfile;
use gentext::{GenerationRequest, GenerationResponse, GentextClient};

use crate::error::EnrichmentError;
use crate::traits::{ProfileBackend, ProfileRequest};

/// [`ProfileBackend`] backed by the HTTP generation service.
pub struct GentextBackend {
    client: GentextClient,
}

impl GentextBackend {
    pub fn new(client: GentextClient) -> Self {
        Self { client }
    }

    fn to_wire(request: &ProfileRequest) -> GenerationRequest {
        GenerationRequest {
            character_name: request.character_name.clone(),
            anime_title: request.anime_title.clone(),
            known_fields: request.known_fields.clone(),
            idempotency_token: request.idempotency_token.clone(),
        }
    }

    fn to_profile(response: GenerationResponse) -> CharacterProfile {
        CharacterProfile {
            personality_analysis: response.personality_analysis,
            abilities: response.abilities,
            relationships: response.relationships,
            background: response.background,
            notable_quotes: response.notable_quotes,
        }
    }
}

#[async_trait]
impl ProfileBackend for GentextBackend {
    async fn comprehensive(
        &self,
        request: &ProfileRequest,
    ) -> Result<CharacterProfile, EnrichmentError> {
        let response = self
            .client
            .generate_comprehensive(&Self::to_wire(request))
            .await
            .map_err(|e| EnrichmentError::Backend(format!("comprehensive: {}", e)))?;
        Ok(Self::to_profile(response))
    }

    async fn detailed(
        &self,
        request: &ProfileRequest,
    ) -> Result<CharacterProfile, EnrichmentError> {
        let response = self
            .client
            .generate_detailed(&Self::to_wire(request))
            .await
            .map_err(|e| EnrichmentError::Backend(format!("detailed: {}", e)))?;
        Ok(Self::to_profile(response))
    }
}

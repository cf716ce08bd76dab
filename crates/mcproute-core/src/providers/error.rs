//! Errors raised while talking to a model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// No key in the secret chain and no custom base URL
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// The request reached the provider (or failed on the way) and came back as an error
    #[error("{provider} API error: {message}")]
    ApiError { provider: String, message: String },

    /// A reply we cannot turn into a `ModelTurn`
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl ProviderError {
    pub fn api_error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Provider id the error came from
    pub fn provider(&self) -> &str {
        match self {
            Self::MissingApiKey { provider }
            | Self::ApiError { provider, .. }
            | Self::InvalidResponse { provider, .. } => provider,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_provider() {
        let missing = ProviderError::missing_api_key("groq");
        assert_eq!(missing.to_string(), "API key is required for groq");
        assert_eq!(missing.provider(), "groq");

        let api = ProviderError::api_error("openai", "429 Too Many Requests");
        assert_eq!(api.to_string(), "openai API error: 429 Too Many Requests");
        assert_eq!(api.provider(), "openai");
    }
}

//! Envelope manager configuration.

use coffre_crypto::{KdfParams, KdfProfile};
use serde::{Deserialize, Serialize};

/// Configuration for the default engines.
///
/// Deserializable so a host application can embed it in its own config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Argon2id cost used when protecting a newly provisioned private key.
    ///
    /// Loading always uses the parameters stored with the key.
    #[serde(default)]
    pub kdf: KdfParams,
}

impl EnvelopeConfig {
    /// Creates a config with the interactive KDF profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config from a named KDF profile.
    pub fn with_profile(profile: KdfProfile) -> Self {
        Self {
            kdf: profile.params(),
        }
    }

    /// Overrides the KDF parameters.
    pub fn kdf(mut self, params: KdfParams) -> Self {
        self.kdf = params;
        self
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_interactive() {
        assert_eq!(EnvelopeConfig::new().kdf, KdfParams::interactive());
    }

    #[test]
    fn test_with_profile() {
        let config = EnvelopeConfig::with_profile(KdfProfile::LowCost);
        assert_eq!(config.kdf, KdfParams::low_cost());
    }

    #[test]
    fn test_kdf_override() {
        let params = KdfParams {
            memory_cost: 4096,
            time_cost: 2,
            parallelism: 1,
        };
        let config = EnvelopeConfig::with_profile(KdfProfile::Sensitive).kdf(params);
        assert_eq!(config.kdf, params);
        assert_ne!(config, EnvelopeConfig::with_profile(KdfProfile::Sensitive));
    }

    #[test]
    fn test_deserialize_missing_kdf_uses_default() {
        let config: EnvelopeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EnvelopeConfig::default());

        let config: EnvelopeConfig = serde_json::from_str(
            r#"{"kdf":{"memory_cost":2048,"time_cost":2,"parallelism":1}}"#,
        )
        .unwrap();
        assert_eq!(config.kdf.memory_cost, 2048);
    }
}

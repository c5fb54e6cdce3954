//! Configuration for the Decoder

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DecodeError;

/// What happens when leaf text cannot be read as the field's type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Keep the field's default value
    #[default]
    Lenient,
    /// Fail the decode with [`DecodeError::Coercion`]
    Strict,
}

/// How text content is cleaned before coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Whitespace {
    /// Trim and collapse inner runs to a single space
    #[default]
    Normalize,
    /// Trim both ends only
    Trim,
    /// Keep text exactly as found
    Preserve,
}

impl Whitespace {
    /// Join text fragments and clean them up
    pub fn apply<'a>(self, parts: impl Iterator<Item = &'a str>) -> String {
        let joined = parts.collect::<String>();
        match self {
            Whitespace::Normalize => joined.split_whitespace().collect::<Vec<_>>().join(" "),
            Whitespace::Trim => joined.trim().to_string(),
            Whitespace::Preserve => joined,
        }
    }
}

/// Configuration for the Decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Policy for malformed numeric and boolean text
    pub coercion: CoercionPolicy,

    /// Text cleanup applied to element content (not attributes)
    pub whitespace: Whitespace,

    /// Maximum nesting of object and list-of-object fields
    pub max_depth: usize,

    /// Base URL for `abs:` attribute reads
    pub base_url: Option<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            coercion: CoercionPolicy::Lenient,
            whitespace: Whitespace::Normalize,
            max_depth: 64,
            base_url: None,
        }
    }
}

impl DecoderConfig {
    /// Strict preset: malformed leaf data fails the decode
    pub fn strict() -> Self {
        Self {
            coercion: CoercionPolicy::Strict,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let config: DecoderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.max_depth == 0 {
            return Err(DecodeError::Config(
                "max_depth must be greater than 0".to_string(),
            ));
        }
        self.parsed_base_url()?;
        Ok(())
    }

    pub(crate) fn parsed_base_url(&self) -> Result<Option<Url>, DecodeError> {
        self.base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw)
                    .map_err(|e| DecodeError::Config(format!("invalid base_url `{}`: {}", raw, e)))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.coercion, CoercionPolicy::Lenient);
        assert_eq!(config.whitespace, Whitespace::Normalize);
        assert_eq!(config.max_depth, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = DecoderConfig::from_json(r#"{"coercion": "strict"}"#).unwrap();
        assert_eq!(config.coercion, CoercionPolicy::Strict);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_validation_failures() {
        let zero_depth = DecoderConfig {
            max_depth: 0,
            ..DecoderConfig::default()
        };
        assert!(matches!(zero_depth.validate(), Err(DecodeError::Config(_))));

        let bad_url = DecoderConfig::from_json(r#"{"base_url": "not a url"}"#);
        assert!(matches!(bad_url, Err(DecodeError::Config(_))));

        let bad_json = DecoderConfig::from_json(r#"{"coercion": "sometimes"}"#);
        assert!(matches!(bad_json, Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_whitespace_modes() {
        let parts = ["  Hello\n", "   world  "];
        assert_eq!(Whitespace::Normalize.apply(parts.into_iter()), "Hello world");
        assert_eq!(Whitespace::Trim.apply(parts.into_iter()), "Hello\n   world");
        assert_eq!(Whitespace::Preserve.apply(parts.into_iter()), "  Hello\n   world  ");
    }
}

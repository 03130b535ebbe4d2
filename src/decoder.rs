//! Pluggable request body decoders, keyed by media type.

use crate::types::ValueMode;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{media_type} body could not be decoded: {reason}")]
pub struct DecodeError {
    pub media_type: String,
    pub reason: String,
}

/// Turns raw body bytes into a structured value.
pub trait BodyDecoder: Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError>;

    /// Whether decoded scalars keep their type or arrive as text.
    fn mode(&self) -> ValueMode {
        ValueMode::Typed
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl BodyDecoder for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        serde_json::from_slice(body).map_err(|e| DecodeError {
            media_type: "application/json".into(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl BodyDecoder for YamlDecoder {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        serde_yaml::from_slice(body).map_err(|e| DecodeError {
            media_type: "application/yaml".into(),
            reason: e.to_string(),
        })
    }
}

/// `application/x-www-form-urlencoded`. Every field is a string; repeated
/// fields become arrays of strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormDecoder;

impl BodyDecoder for FormDecoder {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        let mut fields = Map::new();
        for (k, v) in url::form_urlencoded::parse(body) {
            let v = Value::String(v.into_owned());
            match fields.get_mut(k.as_ref()) {
                Some(Value::Array(items)) => items.push(v),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, v]);
                }
                None => {
                    fields.insert(k.into_owned(), v);
                }
            }
        }
        Ok(Value::Object(fields))
    }

    fn mode(&self) -> ValueMode {
        ValueMode::Textual
    }
}

/// Decoder registry. Exact media types are tried first, then structured
/// syntax suffixes (`application/vnd.api+json` falls back to `+json`).
#[derive(Clone)]
pub struct Decoders {
    by_media_type: HashMap<String, Arc<dyn BodyDecoder>>,
}

impl fmt::Debug for Decoders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.by_media_type.keys().collect();
        keys.sort();
        f.debug_struct("Decoders").field("media_types", &keys).finish()
    }
}

impl Default for Decoders {
    fn default() -> Self {
        let mut decoders = Self::empty();
        decoders.register("application/json", JsonDecoder);
        decoders.register("+json", JsonDecoder);
        decoders.register("application/x-www-form-urlencoded", FormDecoder);
        decoders.register("application/yaml", YamlDecoder);
        decoders.register("application/x-yaml", YamlDecoder);
        decoders.register("text/yaml", YamlDecoder);
        decoders.register("+yaml", YamlDecoder);
        decoders
    }
}

impl Decoders {
    /// A registry with no decoders at all.
    pub fn empty() -> Self {
        Self {
            by_media_type: HashMap::new(),
        }
    }

    /// Register (or replace) the decoder for a media type or a `+suffix`.
    pub fn register(&mut self, media_type: &str, decoder: impl BodyDecoder + 'static) {
        self.by_media_type
            .insert(media_type.to_ascii_lowercase(), Arc::new(decoder));
    }

    pub fn get(&self, media_type: &str) -> Option<&dyn BodyDecoder> {
        let media_type = media_type.to_ascii_lowercase();
        if let Some(d) = self.by_media_type.get(&media_type) {
            return Some(d.as_ref());
        }
        let suffix = media_type.rfind('+').map(|i| &media_type[i..])?;
        self.by_media_type.get(suffix).map(|d| d.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_and_suffix_lookup() {
        let decoders = Decoders::default();
        let d = decoders.get("application/vnd.api+json").unwrap();
        assert_eq!(d.decode(br#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(d.mode(), ValueMode::Typed);
        assert!(d.decode(b"{").is_err());
        assert!(decoders.get("application/xml").is_none());
    }

    #[test]
    fn form_fields_are_textual() {
        let decoders = Decoders::default();
        let d = decoders.get("application/x-www-form-urlencoded").unwrap();
        assert_eq!(d.mode(), ValueMode::Textual);
        assert_eq!(
            d.decode(b"name=a+b&n=1&n=2&n=3").unwrap(),
            json!({"name": "a b", "n": ["1", "2", "3"]})
        );
    }

    #[test]
    fn yaml_decodes_to_json_values() {
        let decoders = Decoders::default();
        let d = decoders.get("text/yaml").unwrap();
        assert_eq!(d.decode(b"a: 1\nb: [x]\n").unwrap(), json!({"a": 1, "b": ["x"]}));
    }

    #[test]
    fn custom_decoder_overrides_default() {
        struct Fixed;
        impl BodyDecoder for Fixed {
            fn decode(&self, _: &[u8]) -> Result<Value, DecodeError> {
                Ok(json!("fixed"))
            }
        }
        let mut decoders = Decoders::default();
        decoders.register("application/json", Fixed);
        assert_eq!(decoders.get("application/json").unwrap().decode(b"").unwrap(), json!("fixed"));
    }
}

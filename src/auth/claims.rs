use serde::{Deserialize, Deserializer, Serialize};

/// JWT payload. The subject is the only thing a token grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub: Option<String>, // user ID
    #[serde(default)]
    pub iat: i64,            // issued at (unix timestamp)
    pub exp: i64,            // expires at (unix timestamp)
}

/// A non-string subject is treated as absent, so a signed token with a wrong-typed
/// `sub` is reported as malformed rather than as a bad signature.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

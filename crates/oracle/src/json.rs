use serde::de::DeserializeOwned;

use crate::errors::OracleError;

/// Parses an oracle reply that must consist of JSON only.
///
/// Surrounding whitespace is tolerated; prose, code fences or trailing text
/// are not.
pub fn parse_json<T: DeserializeOwned>(stage: &str, raw: &str) -> Result<T, OracleError> {
    serde_json::from_str(raw.trim()).map_err(|err| OracleError::malformed(stage, err.to_string()))
}

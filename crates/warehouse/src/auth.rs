use crate::error::WarehouseError;
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the credentials file token, so token
/// rotation does not require rewriting the file.
pub const TOKEN_ENV: &str = "LAKESYNC_TOKEN";

/// Contents of the credentials file needed by the REST client.
///
/// Token minting and refresh are an external concern; the loader only reads
/// the project identifier and a pre-issued bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub project_id: String,
    #[serde(default)]
    token: Option<String>,
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Self, WarehouseError> {
        let raw = std::fs::read_to_string(path).map_err(|err| WarehouseError::Credentials {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|err| WarehouseError::Credentials {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    /// Bearer token for REST calls; the environment override wins.
    pub fn bearer_token(&self) -> Result<String, WarehouseError> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            return Ok(token);
        }
        self.token
            .clone()
            .ok_or_else(|| WarehouseError::Credentials {
                path: "<credentials>".to_string(),
                reason: format!("no token in file and {TOKEN_ENV} is not set"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_parse() {
        let creds: Credentials =
            serde_json::from_str(r#"{"project_id": "lens-public-data", "token": "t0k3n"}"#)
                .unwrap();
        assert_eq!(creds.project_id, "lens-public-data");
        assert_eq!(creds.token.as_deref(), Some("t0k3n"));
    }

    #[test]
    fn test_credentials_token_is_optional_in_file() {
        let creds: Credentials = serde_json::from_str(r#"{"project_id": "p"}"#).unwrap();
        assert!(creds.token.is_none());
    }
}

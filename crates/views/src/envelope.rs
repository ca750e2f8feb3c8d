use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// `{success, data, message}` wrapper around every REST read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        self.data.ok_or(ApiError::MissingData)
    }
}

/// Parse a response body and unwrap its envelope.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;
    envelope.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_data() {
        let env: ApiEnvelope<Vec<u32>> = serde_json::from_str(r#"{"success":true,"data":[1,2]}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), vec![1, 2]);
    }

    #[test]
    fn failure_carries_server_message() {
        let env: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":false,"error":"player not found"}"#).unwrap();
        let err = env.into_result().unwrap_err();
        assert_eq!(err.to_string(), "request rejected: player not found");
    }

    #[test]
    fn success_without_data_is_an_error() {
        let env: ApiEnvelope<Vec<u32>> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(env.into_result(), Err(ApiError::MissingData)));
    }

    /// Payload types need not implement `Default`.
    #[derive(Debug, PartialEq, Deserialize)]
    struct Totals {
        kills: u32,
    }

    #[test]
    fn decodes_payload_without_default() {
        let totals: Totals = decode(r#"{"success":true,"data":{"kills":7}}"#).unwrap();
        assert_eq!(totals, Totals { kills: 7 });
        assert!(matches!(decode::<Totals>(r#"{"success":true}"#), Err(ApiError::MissingData)));
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error half of the response envelope. `code` is a stable machine-readable
/// identifier; `detail` carries structured context for errors clients act on
/// (current balance, retryability).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_omitted_when_absent() {
        let err = ApiError {
            code: "BUSY".to_string(),
            message: "Resource busy, retry later".to_string(),
            detail: None,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "BUSY");
        assert!(json.get("detail").is_none());
    }
}

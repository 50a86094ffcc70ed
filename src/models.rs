// Response body structures, serialized with Serde.

use serde::{Deserialize, Serialize};

// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "rembg-api";

// Body of GET /health.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
        }
    }
}

// Body of every error response. Deserialize is used by the endpoint tests.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_serializes_to_reference_shape() {
        let json = serde_json::to_value(HealthStatus::healthy()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "healthy", "service": "rembg-api" })
        );
    }
}

//! Analysis trigger message.

use serde::{Deserialize, Serialize};

/// The unit of work that triggers one analysis run.
///
/// Delivered as JSON by the upstream trigger; field names follow the wire
/// shape. Both fields default to empty so a malformed message still
/// deserializes and can be rejected with a proper validation error instead
/// of a serde failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Family whose receipts should be analyzed.
    #[serde(rename = "FamilyId", default)]
    pub family_id: String,
    /// Email of the user to notify.
    #[serde(rename = "UserEmail", default)]
    pub user_email: String,
}

impl AnalysisRequest {
    pub fn new(family_id: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self {
            family_id: family_id.into(),
            user_email: user_email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_shape() {
        let req: AnalysisRequest =
            serde_json::from_str(r#"{"FamilyId":"fam-1","UserEmail":"a@b.c"}"#).unwrap();
        assert_eq!(req.family_id, "fam-1");
        assert_eq!(req.user_email, "a@b.c");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let req: AnalysisRequest = serde_json::from_str("{}").unwrap();
        assert!(req.family_id.is_empty());
        assert!(req.user_email.is_empty());
    }
}

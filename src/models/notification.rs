//! Push notification payloads produced after a successful run.

use serde::{Deserialize, Serialize};

/// Event type tag for shopping list updates.
pub const LIST_UPDATE_TYPE: &str = "shopping_list_update";

/// Structured payload carried alongside the notification text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Event discriminator for the receiving client.
    #[serde(rename = "type")]
    pub kind: String,
    /// Shopping list the event refers to.
    pub list_id: String,
}

/// A notification ready for delivery to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Target user.
    pub user_email: String,
    /// Short title, conventionally the store name.
    pub title: String,
    /// Human-readable summary of what changed.
    pub body: String,
    /// Structured payload.
    pub data: NotificationData,
}

impl NotificationEvent {
    /// Build a shopping-list-update event.
    pub fn list_update(
        user_email: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        list_id: impl Into<String>,
    ) -> Self {
        Self {
            user_email: user_email.into(),
            title: title.into(),
            body: body.into(),
            data: NotificationData {
                kind: LIST_UPDATE_TYPE.to_string(),
                list_id: list_id.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_wire_shape() {
        let event = NotificationEvent::list_update("a@b.c", "Kroger", "Added 3 items", "fam-1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["userEmail"], "a@b.c");
        assert_eq!(json["data"]["type"], "shopping_list_update");
        assert_eq!(json["data"]["listId"], "fam-1");
    }
}

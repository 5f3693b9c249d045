//! Inbound webhook event model and classifier.
//!
//! The upstream platform pushes several callback shapes at a single endpoint:
//! user messages, suggestion (button) responses, delivery/read status updates,
//! and file attachments. Classification is derived from the structure of the
//! body, never supplied by the sender. Unrecognized shapes classify as
//! `Unknown` and are logged by the caller — never dropped silently.

use serde_json::Value;

/// Delivery states that mark a status-update callback.
const TERMINAL_STATUSES: [&str; 3] = ["DELIVERED", "READ", "FAILED"];

/// Derived classification of an inbound webhook body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    UserMessage,
    SuggestionResponse,
    StatusUpdate,
    FileAttachment,
    Unknown,
}

impl WebhookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookKind::UserMessage => "user_message",
            WebhookKind::SuggestionResponse => "suggestion_response",
            WebhookKind::StatusUpdate => "status_update",
            WebhookKind::FileAttachment => "file_attachment",
            WebhookKind::Unknown => "unknown",
        }
    }
}

/// A classified inbound event. Ephemeral: constructed per HTTP call,
/// dispatched once, discarded. Durability is the handler's concern.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub kind: WebhookKind,
    pub sender: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: Option<String>,
    /// The full raw body, so handlers can reach shape-specific fields.
    pub payload: Value,
}

/// Classify a raw inbound JSON body.
///
/// Priority order:
///   1. `contentMessage` present → user message (or file attachment when the
///      content message carries a file payload).
///   2. `eventType` is a terminal delivery state → status update.
///   3. `suggestionResponse` present → suggestion response.
///   4. anything else → unknown.
pub fn classify(body: &Value) -> WebhookEvent {
    let kind = if let Some(content) = body.get("contentMessage") {
        if has_file_payload(content) {
            WebhookKind::FileAttachment
        } else {
            WebhookKind::UserMessage
        }
    } else if is_terminal_status(body.get("eventType")) {
        WebhookKind::StatusUpdate
    } else if body.get("suggestionResponse").is_some() {
        WebhookKind::SuggestionResponse
    } else {
        WebhookKind::Unknown
    };

    WebhookEvent {
        kind,
        sender: str_field(body, "senderPhoneNumber").or_else(|| str_field(body, "msisdn")),
        message_id: str_field(body, "messageId"),
        timestamp: str_field(body, "sendTime").or_else(|| str_field(body, "timestamp")),
        payload: body.clone(),
    }
}

fn is_terminal_status(event_type: Option<&Value>) -> bool {
    event_type
        .and_then(Value::as_str)
        .map(|s| TERMINAL_STATUSES.contains(&s))
        .unwrap_or(false)
}

/// A content message carrying an inbound file rather than text.
fn has_file_payload(content: &Value) -> bool {
    content.get("userFile").is_some()
        || content.get("fileName").is_some()
        || content.get("contentFileUrl").is_some()
}

fn str_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification_table() {
        let cases = [
            (json!({"contentMessage": {"text": "hi"}}), WebhookKind::UserMessage),
            (json!({"eventType": "DELIVERED", "messageId": "m1"}), WebhookKind::StatusUpdate),
            (json!({"eventType": "READ", "messageId": "m2"}), WebhookKind::StatusUpdate),
            (json!({"eventType": "FAILED", "messageId": "m3"}), WebhookKind::StatusUpdate),
            (
                json!({"suggestionResponse": {"postbackData": "BTN1"}}),
                WebhookKind::SuggestionResponse,
            ),
            (json!({"foo": "bar"}), WebhookKind::Unknown),
        ];

        for (body, expected) in cases {
            let event = classify(&body);
            assert_eq!(event.kind, expected, "body: {body}");
        }
    }

    #[test]
    fn content_message_with_file_is_an_attachment() {
        let body = json!({
            "senderPhoneNumber": "+15551230000",
            "contentMessage": {
                "userFile": {"payload": {"fileName": "receipt.pdf", "fileUri": "https://files/abc"}}
            }
        });
        let event = classify(&body);
        assert_eq!(event.kind, WebhookKind::FileAttachment);
        assert_eq!(event.sender.as_deref(), Some("+15551230000"));
    }

    #[test]
    fn content_message_wins_over_suggestion_response() {
        // Priority order: contentMessage is checked before suggestionResponse.
        let body = json!({
            "contentMessage": {"text": "hello"},
            "suggestionResponse": {"postbackData": "BTN1"}
        });
        assert_eq!(classify(&body).kind, WebhookKind::UserMessage);
    }

    #[test]
    fn non_terminal_event_type_is_unknown() {
        let body = json!({"eventType": "TYPING", "messageId": "m9"});
        assert_eq!(classify(&body).kind, WebhookKind::Unknown);
    }

    #[test]
    fn metadata_fields_are_extracted() {
        let body = json!({
            "senderPhoneNumber": "+15551234567",
            "messageId": "msg-42",
            "sendTime": "2024-03-01T10:00:00Z",
            "contentMessage": {"text": "hi"}
        });
        let event = classify(&body);
        assert_eq!(event.sender.as_deref(), Some("+15551234567"));
        assert_eq!(event.message_id.as_deref(), Some("msg-42"));
        assert_eq!(event.timestamp.as_deref(), Some("2024-03-01T10:00:00Z"));
    }

    #[test]
    fn payload_is_preserved_verbatim() {
        let body = json!({"foo": "bar", "nested": {"x": 1}});
        let event = classify(&body);
        assert_eq!(event.payload, body);
        assert!(event.sender.is_none());
        assert!(event.message_id.is_none());
    }
}

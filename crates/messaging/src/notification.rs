use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload published for each accepted message.
///
/// Deliberately excludes the message id and origin address to limit what is
/// exposed on the channel. `received_at` is optional on decode; older
/// publishers omitted it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PrintNotification {
    /// Submitter-provided email address.
    pub email: String,

    /// Free-text message body.
    pub message: String,

    /// Ingestion timestamp, if the publisher supplied one.
    #[serde(rename = "receivedAt", skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
}

impl TryFrom<Bytes> for PrintNotification {
    type Error = serde_json::Error;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        serde_json::from_slice(&bytes)
    }
}

impl TryInto<Bytes> for PrintNotification {
    type Error = serde_json::Error;

    fn try_into(self) -> Result<Bytes, Self::Error> {
        let json = serde_json::to_vec(&self)?;
        Ok(Bytes::from(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let notification = PrintNotification {
            email: "test@example.com".to_string(),
            message: "hello\nworld".to_string(),
            received_at: Some(Utc::now()),
        };

        let bytes: Bytes = notification.clone().try_into().unwrap();
        let decoded = PrintNotification::try_from(bytes).unwrap();

        assert_eq!(decoded, notification);
    }

    #[test]
    fn test_decode_tolerates_missing_received_at() {
        let bytes = Bytes::from_static(br#"{"email":"a@b.c","message":"hi"}"#);
        let decoded = PrintNotification::try_from(bytes).unwrap();

        assert_eq!(decoded.email, "a@b.c");
        assert_eq!(decoded.message, "hi");
        assert!(decoded.received_at.is_none());
    }

    #[test]
    fn test_decode_rejects_missing_message() {
        let bytes = Bytes::from_static(br#"{"email":"a@b.c"}"#);
        assert!(PrintNotification::try_from(bytes).is_err());
    }
}

//! Classification of inbound change notifications.
//!
//! The transport delivers notifications at least once, unordered and possibly
//! duplicated. Only a few categories carry sequencers that are comparable
//! within a key; everything else is ignored rather than risk ordering
//! decisions on tokens that mean nothing.

use serde::{Deserialize, Serialize};

use crate::coordination::Sequencer;

/// Category of a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    /// A resource or resource version was written.
    Created,
    /// A resource or resource version was deleted.
    Removed,
    /// Lifecycle expiration removed the resource.
    Expired,
    /// Any other category; their sequencer values are not comparable.
    #[serde(other)]
    Other,
}

impl EventCategory {
    /// Whether events of this category participate in per-key ordering.
    pub fn is_ordering_eligible(self) -> bool {
        matches!(self, Self::Created | Self::Removed | Self::Expired)
    }
}

/// A raw change notification as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// What happened.
    pub category: EventCategory,
    /// The containing scope (bucket, container, account).
    pub scope: String,
    /// The resource key, if the transport supplied one.
    #[serde(default)]
    pub key: Option<String>,
    /// The resource version, for versioned scopes.
    #[serde(default)]
    pub version: Option<String>,
    /// Ordering token; present on ordering-eligible categories.
    #[serde(default)]
    pub sequencer: Option<String>,
}

impl Notification {
    /// The lock key for this notification: scope, key, and version combined,
    /// so that sequencers are only ever compared within one version of one
    /// resource.
    fn lock_key(&self, key: &str) -> String {
        format!(
            "{}/{}#{}",
            self.scope,
            key,
            self.version.as_deref().unwrap_or("")
        )
    }
}

/// Why a notification was rejected outright. Rejections are not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No resource key in the payload.
    MissingKey,
    /// Ordering-eligible category without a sequencer.
    MissingSequencer,
}

/// Result of classifying one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Ordering-eligible; carries the scoped lock key and its sequencer.
    Eligible {
        lock_key: String,
        sequencer: Sequencer,
    },
    /// Category outside the ordering-eligible set; dropped without error.
    Ignored,
    /// Malformed; dropped without retry.
    Rejected(RejectReason),
}

/// Classify a notification, extracting the lock key and sequencer when the
/// event participates in ordering.
pub fn classify(notification: &Notification) -> Classification {
    if !notification.category.is_ordering_eligible() {
        return Classification::Ignored;
    }
    let key = match notification.key.as_deref() {
        Some(key) if !key.is_empty() => key,
        _ => return Classification::Rejected(RejectReason::MissingKey),
    };
    match notification.sequencer.as_deref() {
        Some(token) if !token.is_empty() => Classification::Eligible {
            lock_key: notification.lock_key(key),
            sequencer: Sequencer::new(token),
        },
        _ => Classification::Rejected(RejectReason::MissingSequencer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(category: EventCategory) -> Notification {
        Notification {
            category,
            scope: "bucket".to_string(),
            key: Some("cat.jpg".to_string()),
            version: None,
            sequencer: Some("0055".to_string()),
        }
    }

    #[test]
    fn test_eligible_builds_scoped_lock_key() {
        let classification = classify(&notification(EventCategory::Created));
        assert_eq!(
            classification,
            Classification::Eligible {
                lock_key: "bucket/cat.jpg#".to_string(),
                sequencer: Sequencer::new("0055"),
            }
        );
    }

    #[test]
    fn test_version_is_part_of_the_lock_key() {
        let mut n = notification(EventCategory::Removed);
        n.version = Some("v3".to_string());
        match classify(&n) {
            Classification::Eligible { lock_key, .. } => {
                assert_eq!(lock_key, "bucket/cat.jpg#v3");
            }
            other => panic!("expected Eligible, got {other:?}"),
        }
    }

    #[test]
    fn test_ineligible_category_is_ignored() {
        let n = notification(EventCategory::Other);
        assert_eq!(classify(&n), Classification::Ignored);
        // Ignored wins over validation: a malformed ineligible event is
        // still just ignored.
        let mut n = notification(EventCategory::Other);
        n.key = None;
        assert_eq!(classify(&n), Classification::Ignored);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let mut n = notification(EventCategory::Created);
        n.key = None;
        assert_eq!(
            classify(&n),
            Classification::Rejected(RejectReason::MissingKey)
        );

        let mut n = notification(EventCategory::Created);
        n.key = Some(String::new());
        assert_eq!(
            classify(&n),
            Classification::Rejected(RejectReason::MissingKey)
        );
    }

    #[test]
    fn test_missing_sequencer_is_rejected() {
        let mut n = notification(EventCategory::Expired);
        n.sequencer = None;
        assert_eq!(
            classify(&n),
            Classification::Rejected(RejectReason::MissingSequencer)
        );
    }

    #[test]
    fn test_wire_format_parses() {
        let payload = r#"{
            "category": "created",
            "scope": "photos",
            "key": "cat.jpg",
            "version": "v1",
            "sequencer": "0055aa"
        }"#;
        let n: Notification = serde_json::from_str(payload).unwrap();
        assert_eq!(n.category, EventCategory::Created);
        match classify(&n) {
            Classification::Eligible { lock_key, sequencer } => {
                assert_eq!(lock_key, "photos/cat.jpg#v1");
                assert_eq!(sequencer, Sequencer::new("0055aa"));
            }
            other => panic!("expected Eligible, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_category_parses_as_other() {
        let payload = r#"{
            "category": "access-tier-changed",
            "scope": "photos",
            "key": "cat.jpg",
            "sequencer": "0055"
        }"#;
        let n: Notification = serde_json::from_str(payload).unwrap();
        assert_eq!(n.category, EventCategory::Other);
        assert_eq!(classify(&n), Classification::Ignored);
    }
}

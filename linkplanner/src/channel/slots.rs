//! One active request per kind.
//!
//! Each [`RequestKind`] owns a slot holding the identifier of its most recent
//! request and the correlation token responses to it will carry. Issuing a
//! new request or cancelling overwrites the slot, which is what makes older
//! responses stale.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::protocol::{RequestId, RequestKind};

#[derive(Debug, Clone)]
struct Slot {
    request_id: RequestId,
    /// `None` after a cancel: the fresh identifier is never on the wire.
    correlation: Option<String>,
    issued_at: Instant,
}

/// Slot table with optional expiry.
#[derive(Debug, Default)]
pub(crate) struct SlotTable {
    slots: HashMap<RequestKind, Slot>,
    timeout: Option<Duration>,
}

impl SlotTable {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self {
            slots: HashMap::new(),
            timeout,
        }
    }

    /// Makes `request_id` the only live request of `kind`.
    pub(crate) fn activate(
        &mut self,
        kind: RequestKind,
        request_id: RequestId,
        correlation: String,
        now: Instant,
    ) {
        self.slots.insert(
            kind,
            Slot {
                request_id,
                correlation: Some(correlation),
                issued_at: now,
            },
        );
    }

    /// Replaces the slot's identifier with a fresh one nobody will echo.
    pub(crate) fn cancel(&mut self, kind: RequestKind, now: Instant) -> Option<RequestId> {
        let previous = self.active(kind, now);
        self.slots.insert(
            kind,
            Slot {
                request_id: RequestId::new(),
                correlation: None,
                issued_at: now,
            },
        );
        previous
    }

    /// Live request of `kind`, if any.
    pub(crate) fn active(&self, kind: RequestKind, now: Instant) -> Option<RequestId> {
        self.slots
            .get(&kind)
            .filter(|slot| slot.correlation.is_some() && !self.expired(slot, now))
            .map(|slot| slot.request_id)
    }

    /// Finds the live slot whose token equals `token`.
    pub(crate) fn match_token(&self, token: &str, now: Instant) -> Option<(RequestKind, RequestId)> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.correlation.as_deref() == Some(token))
            .find(|(_, slot)| !self.expired(slot, now))
            .map(|(kind, slot)| (*kind, slot.request_id))
    }

    fn expired(&self, slot: &Slot, now: Instant) -> bool {
        match self.timeout {
            Some(timeout) => now.saturating_duration_since(slot.issued_at) > timeout,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_invalidates_previous() {
        let now = Instant::now();
        let mut table = SlotTable::new(None);
        let first = RequestId::new();
        let second = RequestId::new();

        table.activate(RequestKind::Link, first, "a:1".into(), now);
        table.activate(RequestKind::Link, second, "a:2".into(), now);

        assert_eq!(table.match_token("a:1", now), None, "old token must be stale");
        assert_eq!(table.match_token("a:2", now), Some((RequestKind::Link, second)));
        assert_eq!(table.active(RequestKind::Link, now), Some(second));
    }

    #[test]
    fn test_cancel_drops_everything_for_the_kind() {
        let now = Instant::now();
        let mut table = SlotTable::new(None);
        let id = RequestId::new();
        table.activate(RequestKind::AccessPoint, id, "ap-1".into(), now);

        assert_eq!(table.cancel(RequestKind::AccessPoint, now), Some(id));
        assert_eq!(table.match_token("ap-1", now), None);
        assert_eq!(table.active(RequestKind::AccessPoint, now), None);
    }

    #[test]
    fn test_slots_are_independent() {
        let now = Instant::now();
        let mut table = SlotTable::new(None);
        let link = RequestId::new();
        let zip = RequestId::new();
        table.activate(RequestKind::Link, link, "k:1".into(), now);
        table.activate(RequestKind::ZipGeography, zip, "z".into(), now);
        table.cancel(RequestKind::Link, now);

        assert_eq!(table.match_token("z", now), Some((RequestKind::ZipGeography, zip)));
    }

    #[test]
    fn test_no_timeout_never_expires() {
        let now = Instant::now();
        let mut table = SlotTable::new(None);
        let id = RequestId::new();
        table.activate(RequestKind::Link, id, "k".into(), now);

        let much_later = now + Duration::from_secs(24 * 3600);
        assert_eq!(table.match_token("k", much_later), Some((RequestKind::Link, id)));
    }

    #[test]
    fn test_timeout_expires_slot() {
        let now = Instant::now();
        let mut table = SlotTable::new(Some(Duration::from_secs(30)));
        let id = RequestId::new();
        table.activate(RequestKind::Polygon, id, "p".into(), now);

        assert!(table.match_token("p", now + Duration::from_secs(29)).is_some());
        assert!(table.match_token("p", now + Duration::from_secs(31)).is_none());
        assert!(table.active(RequestKind::Polygon, now + Duration::from_secs(31)).is_none());
    }
}

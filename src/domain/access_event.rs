//! Access event model for asynchronous log appends.

/// Which resource kind an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Link,
    Share,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Link => "link",
            ResourceKind::Share => "share",
        }
    }
}

/// An in-memory access event passed from handlers to the background worker
/// over a bounded channel.
///
/// Decouples the HTTP response from the log write: the counter increment has
/// already committed by the time this event exists, and losing the event (full
/// queue, worker crash) loses only a log row, never an increment.
#[derive(Debug, Clone)]
pub struct AccessEvent {
    pub kind: ResourceKind,
    pub resource_id: i64,
    pub short_key: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl AccessEvent {
    pub fn new(
        kind: ResourceKind,
        resource_id: i64,
        short_key: String,
        ip: Option<String>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            kind,
            resource_id,
            short_key,
            ip,
            user_agent: user_agent.map(|s| s.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_event_creation() {
        let event = AccessEvent::new(
            ResourceKind::Link,
            42,
            "abc1234".to_string(),
            Some("192.168.1.1".to_string()),
            Some("Mozilla/5.0"),
        );

        assert_eq!(event.kind, ResourceKind::Link);
        assert_eq!(event.resource_id, 42);
        assert_eq!(event.short_key, "abc1234");
        assert_eq!(event.ip, Some("192.168.1.1".to_string()));
        assert_eq!(event.user_agent, Some("Mozilla/5.0".to_string()));
    }

    #[test]
    fn test_access_event_minimal() {
        let event = AccessEvent::new(ResourceKind::Share, 1, "xyz".to_string(), None, None);

        assert!(event.ip.is_none());
        assert!(event.user_agent.is_none());
        assert_eq!(event.kind.as_str(), "share");
    }
}

//! Append-only access-log entries for resolved resources.

/// Input for a click log append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub link_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Input for a view log append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewView {
    pub share_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

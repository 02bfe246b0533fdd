//! Shared types used across drowse crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Queue ─────────────────────────────────────────────────────────

/// Status of a single build in the CI queue.
///
/// The queue API only promises `pending` and `running`. Anything else is
/// kept as [`QueueStatus::Other`] so classification can reject it instead
/// of the item vanishing at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueueStatus {
    Pending,
    Running,
    Other(String),
}

impl From<String> for QueueStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => QueueStatus::Pending,
            "running" => QueueStatus::Running,
            _ => QueueStatus::Other(s),
        }
    }
}

impl From<QueueStatus> for String {
    fn from(status: QueueStatus) -> Self {
        match status {
            QueueStatus::Pending => "pending".to_string(),
            QueueStatus::Running => "running".to_string(),
            QueueStatus::Other(s) => s,
        }
    }
}

/// One entry of the CI queue.
///
/// Drone reports many more fields per item; only these two matter here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub status: QueueStatus,
    /// Unix timestamp (seconds) when the build was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
}

impl QueueItem {
    pub fn pending(created: Option<u64>) -> Self {
        Self {
            status: QueueStatus::Pending,
            created,
        }
    }

    pub fn running(created: Option<u64>) -> Self {
        Self {
            status: QueueStatus::Running,
            created,
        }
    }
}

/// Aggregate state of the queue for one check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Empty,
    Pending,
    Running,
}

impl QueueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::Empty => "empty",
            QueueState::Pending => "pending",
            QueueState::Running => "running",
        }
    }

    /// Whether the queue has any work that needs the instance.
    pub fn has_work(&self) -> bool {
        matches!(self, QueueState::Pending | QueueState::Running)
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Instance ──────────────────────────────────────────────────────

/// Lifecycle state of the supervised instance, as named by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl InstanceState {
    pub const ALL: [InstanceState; 6] = [
        InstanceState::Pending,
        InstanceState::Running,
        InstanceState::ShuttingDown,
        InstanceState::Terminated,
        InstanceState::Stopping,
        InstanceState::Stopped,
    ];

    /// The provider's name for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
        }
    }

    /// Up, or on its way up.
    pub fn is_up(&self) -> bool {
        matches!(self, InstanceState::Pending | InstanceState::Running)
    }

    /// Down, or on its way down (excluding termination).
    pub fn is_down(&self) -> bool {
        matches!(self, InstanceState::Stopping | InstanceState::Stopped)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a provider state name is not one of the known states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInstanceState(pub String);

impl fmt::Display for UnknownInstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown instance state '{}'", self.0)
    }
}

impl std::error::Error for UnknownInstanceState {}

impl FromStr for InstanceState {
    type Err = UnknownInstanceState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstanceState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownInstanceState(s.to_string()))
    }
}

/// Raw result of describing the instance.
///
/// Every level is optional because the provider does not guarantee it;
/// the instance classifier decides what a gap means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    pub state: Option<StateDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescriptor {
    pub name: Option<String>,
}

impl InstanceDescriptor {
    /// Descriptor reporting the given provider state name.
    pub fn with_state_name(name: impl Into<String>) -> Self {
        Self {
            state: Some(StateDescriptor {
                name: Some(name.into()),
            }),
        }
    }
}

// ── Action ────────────────────────────────────────────────────────

/// Next action decided by one planning cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    #[default]
    #[serde(rename = "noop")]
    NoOp,
    Start,
    ScheduleStop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::NoOp => "noop",
            Action::Start => "start",
            Action::ScheduleStop => "schedule-stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_items_parse_from_drone_payload() {
        let json = r#"[
            {"id": 7, "status": "pending", "created": 1700000000, "repo_id": 3},
            {"status": "running"},
            {"status": "killed", "created": 1}
        ]"#;
        let items: Vec<QueueItem> = serde_json::from_str(json).unwrap();

        assert_eq!(items[0], QueueItem::pending(Some(1_700_000_000)));
        assert_eq!(items[1], QueueItem::running(None));
        assert_eq!(items[2].status, QueueStatus::Other("killed".to_string()));
    }

    #[test]
    fn instance_state_names_match_provider() {
        for state in InstanceState::ALL {
            assert_eq!(state.as_str().parse::<InstanceState>(), Ok(state));
        }
        assert_eq!(
            "shutting-down".parse::<InstanceState>(),
            Ok(InstanceState::ShuttingDown)
        );
        assert_eq!(
            "rebooting".parse::<InstanceState>(),
            Err(UnknownInstanceState("rebooting".to_string()))
        );
    }

    #[test]
    fn action_display_names() {
        assert_eq!(Action::default(), Action::NoOp);
        assert_eq!(Action::NoOp.to_string(), "noop");
        assert_eq!(Action::ScheduleStop.to_string(), "schedule-stop");
        assert_eq!(
            serde_json::to_string(&Action::ScheduleStop).unwrap(),
            "\"schedule-stop\""
        );
        assert_eq!(serde_json::to_string(&Action::NoOp).unwrap(), "\"noop\"");
    }
}

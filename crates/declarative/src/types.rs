//! Core types for declarative resource management

use serde::{Deserialize, Serialize};

/// Local record of one managed resource: its remote identifier (once the
/// remote system assigned one) and its flat attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData<C> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    /// Attribute values
    pub config: C,
}

impl<C> ResourceData<C> {
    /// A record for a resource that does not exist remotely yet
    pub fn new(config: C) -> Self {
        Self { id: None, config }
    }

    /// A record for an existing remote resource
    pub fn with_id(id: impl Into<String>, config: C) -> Self {
        Self {
            id: Some(id.into()),
            config,
        }
    }

    /// Remote identifier, if assigned
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether no remote identifier has been assigned
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Assign the remote identifier
    ///
    /// An identifier never changes once assigned: returns `false` and keeps
    /// the existing one if a different id is offered.
    pub fn set_id(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        match &self.id {
            Some(existing) if *existing != id => {
                log::warn!("Refusing to replace resource id {} with {}", existing, id);
                false
            }
            _ => {
                self.id = Some(id);
                true
            }
        }
    }

    /// Forget the remote identifier (the resource is gone)
    pub fn clear_id(&mut self) {
        self.id = None;
    }
}

/// Result of applying a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was modified
    Modified,
    /// Resource was removed
    Removed,
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.removed + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of resources applied concurrently
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_data_id_lifecycle() {
        let mut data = ResourceData::new("cfg");
        assert!(data.is_new());
        assert_eq!(data.id(), None);

        assert!(data.set_id("0oa1"));
        assert_eq!(data.id(), Some("0oa1"));

        // Same id is accepted, a different one is refused
        assert!(data.set_id("0oa1"));
        assert!(!data.set_id("0oa2"));
        assert_eq!(data.id(), Some("0oa1"));

        data.clear_id();
        assert!(data.is_new());
    }

    #[test]
    fn test_resource_data_serde_skips_missing_id() {
        let data = ResourceData::new(7u32);
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"config":7}"#);

        let back: ResourceData<u32> = serde_json::from_str(r#"{"id":"0oa1","config":7}"#).unwrap();
        assert_eq!(back.id(), Some("0oa1"));
    }

    #[test]
    fn test_apply_result_predicates() {
        assert!(ApplyResult::Created.is_change());
        assert!(!ApplyResult::NoChange.is_change());
        assert!(!ApplyResult::Failed { error: "x".into() }.is_success());
        assert!(ApplyResult::Skipped { reason: "dry run".into() }.is_success());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        summary.add_result(&ApplyResult::Created);
        summary.add_result(&ApplyResult::Modified);
        summary.add_result(&ApplyResult::Failed { error: "x".into() });
        summary.add_result(&ApplyResult::NoChange);

        assert_eq!(summary.total_changes(), 2);
        assert_eq!(summary.total(), 4);
        assert!(!summary.is_success());
    }
}

//! # Workflow Nodes and Templates
//!
//! Template-level definitions that tasks are instantiated from. Nodes are read-only
//! to the engine; templates are validated as DAGs before they are accepted and every
//! dependency edit is checked before it is applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;
use crate::dependency_graph::{self, GraphError};

pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 60;
pub const DEFAULT_REMINDER_BEFORE_MINUTES: u32 = 5;
pub const DEFAULT_ESCALATION_AFTER_MINUTES: u32 = 15;
pub const DEFAULT_WARNING_AFTER_MINUTES: u32 = 30;

/// Template-level unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub responsible_role: Role,
    /// Total permissible window after the scheduled time
    pub time_limit_minutes: u32,
    /// Reminder lead time before the scheduled time
    pub reminder_before_minutes: u32,
    /// Escalation threshold after the scheduled time
    pub escalation_after_minutes: u32,
    /// Warning threshold after the scheduled time
    pub warning_after_minutes: u32,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>, responsible_role: Role) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: String::new(),
            responsible_role,
            time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
            reminder_before_minutes: DEFAULT_REMINDER_BEFORE_MINUTES,
            escalation_after_minutes: DEFAULT_ESCALATION_AFTER_MINUTES,
            warning_after_minutes: DEFAULT_WARNING_AFTER_MINUTES,
            depends_on: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_time_limit(mut self, minutes: u32) -> Self {
        self.time_limit_minutes = minutes;
        self
    }

    pub fn with_reminder_before(mut self, minutes: u32) -> Self {
        self.reminder_before_minutes = minutes;
        self
    }

    pub fn with_escalation_after(mut self, minutes: u32) -> Self {
        self.escalation_after_minutes = minutes;
        self
    }

    pub fn with_warning_after(mut self, minutes: u32) -> Self {
        self.warning_after_minutes = minutes;
        self
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// A validated set of nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    nodes: Vec<WorkflowNode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowTemplate {
    /// Build a template, rejecting node sets that are not a DAG
    pub fn new(name: impl Into<String>, nodes: Vec<WorkflowNode>) -> Result<Self, GraphError> {
        dependency_graph::validate_graph(&nodes)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            nodes,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Make `target` depend on `source`.
    ///
    /// The edge is checked against the current graph first; on error the template is
    /// left untouched.
    pub fn add_dependency(&mut self, source: &str, target: &str) -> Result<(), GraphError> {
        dependency_graph::check_edge(&self.nodes, source, target)?;

        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == target) {
            if !node.depends_on.iter().any(|d| d == source) {
                node.depends_on.push(source.to_string());
                self.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    /// Replace the node set after validating it as a whole
    pub fn replace_nodes(&mut self, nodes: Vec<WorkflowNode>) -> Result<(), GraphError> {
        dependency_graph::validate_graph(&nodes)?;
        self.nodes = nodes;
        self.updated_at = Utc::now();
        Ok(())
    }
}

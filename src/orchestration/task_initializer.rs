//! # Task Initializer
//!
//! Builds a [`WorkflowInstance`] from a [`WorkflowTemplate`].
//!
//! ## Scheduling
//!
//! Nodes are visited in dependency order. A node with no dependencies is scheduled at
//! the instance start time; any other node is scheduled when its slowest dependency's
//! window closes, i.e. the latest `scheduled_time + time_limit` among its
//! dependencies. Reminder, escalation and warning times are then derived from the
//! node's offsets. Tasks keep the template's node order in the resulting instance.
//!
//! The initializer does no persistence; the engine saves the instance it returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::dependency_graph::{topological_order, GraphError, GraphResult};
use crate::models::{InstanceStatus, WorkflowInstance, WorkflowTask, WorkflowTemplate};

/// Request to start a new instance of a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstanceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: String,
    pub start_time: DateTime<Utc>,
}

impl NewInstanceRequest {
    pub fn new(
        name: impl Into<String>,
        created_by: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            created_by: created_by.into(),
            start_time,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TaskInitializer;

impl TaskInitializer {
    pub fn new() -> Self {
        Self
    }

    /// Instantiate `template`. Fails with the graph error if the template's nodes are
    /// not a valid DAG; nothing is built in that case.
    #[instrument(skip(self, template, request), fields(template_id = %template.id))]
    pub fn build_instance(
        &self,
        template: &WorkflowTemplate,
        request: NewInstanceRequest,
        now: DateTime<Utc>,
    ) -> GraphResult<WorkflowInstance> {
        let schedule = self.schedule(template, request.start_time)?;

        let tasks = template
            .nodes()
            .iter()
            .map(|node| {
                let scheduled = schedule
                    .get(node.id.as_str())
                    .copied()
                    .unwrap_or(request.start_time);
                WorkflowTask::from_node(node, scheduled)
            })
            .collect::<Vec<_>>();

        debug!(task_count = tasks.len(), "Built tasks for new instance");

        Ok(WorkflowInstance {
            id: Uuid::new_v4(),
            template_id: template.id,
            name: request.name,
            description: request.description,
            status: InstanceStatus::Active,
            tasks,
            start_time: request.start_time,
            end_time: None,
            created_by: request.created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Scheduled time per node id
    pub fn schedule<'t>(
        &self,
        template: &'t WorkflowTemplate,
        start_time: DateTime<Utc>,
    ) -> GraphResult<HashMap<&'t str, DateTime<Utc>>> {
        let order = topological_order(template.nodes())?;
        let mut schedule: HashMap<&'t str, DateTime<Utc>> = HashMap::with_capacity(order.len());

        for id in &order {
            let node = template
                .node(id)
                .ok_or_else(|| GraphError::UnknownNode {
                    node_id: id.clone(),
                    referenced_by: template.name.clone(),
                })?;

            let mut scheduled = start_time;
            for dep_id in &node.depends_on {
                let dep = template
                    .node(dep_id)
                    .ok_or_else(|| GraphError::UnknownNode {
                        node_id: dep_id.clone(),
                        referenced_by: node.id.clone(),
                    })?;
                if let Some(dep_start) = schedule.get(dep.id.as_str()) {
                    let dep_end =
                        *dep_start + chrono::Duration::minutes(i64::from(dep.time_limit_minutes));
                    scheduled = scheduled.max(dep_end);
                }
            }
            schedule.insert(node.id.as_str(), scheduled);
        }

        Ok(schedule)
    }
}

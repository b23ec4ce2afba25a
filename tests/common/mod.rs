#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use workflow_escalation::{
    EscalationConfig, EscalationEngine, InMemoryInstanceStore, InMemoryNotificationStore,
    InstanceStore, NewInstanceRequest, NotificationRecord, NotificationStore, NotificationType,
    Role, StoreError, StoreResult, WorkflowInstance, WorkflowNode, WorkflowTemplate,
};

/// Fixed start time shared by the scenario tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap()
}

pub fn at(minutes: i64, seconds: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::minutes(minutes) + chrono::Duration::seconds(seconds)
}

/// Node with the thresholds used throughout the scenarios: escalate at 15, warn at
/// 30, time limit 60
pub fn node(id: &str, role: Role) -> WorkflowNode {
    WorkflowNode::new(id, format!("Task {id}"), role)
        .with_escalation_after(15)
        .with_warning_after(30)
        .with_time_limit(60)
}

pub fn single_task_template(role: Role) -> WorkflowTemplate {
    WorkflowTemplate::new("single", vec![node("only", role)]).unwrap()
}

pub fn request(name: &str) -> NewInstanceRequest {
    NewInstanceRequest::new(name, "test-suite", t0())
}

/// Instance store wrapper that can be told to fail
#[derive(Debug, Default)]
pub struct FlakyInstanceStore {
    inner: InMemoryInstanceStore,
    fail_load: AtomicBool,
    fail_saves_for: Mutex<HashSet<Uuid>>,
}

impl FlakyInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves_for(&self, instance_id: Uuid) {
        self.fail_saves_for.lock().insert(instance_id);
    }

    /// Bypass failure injection, for seeding
    pub async fn seed(&self, instance: &WorkflowInstance) {
        self.inner.save_instance(instance).await.unwrap();
    }
}

#[async_trait]
impl InstanceStore for FlakyInstanceStore {
    async fn load_active_instances(&self) -> StoreResult<Vec<WorkflowInstance>> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("listing disabled".into()));
        }
        self.inner.load_active_instances().await
    }

    async fn save_instance(&self, instance: &WorkflowInstance) -> StoreResult<()> {
        if self.fail_saves_for.lock().contains(&instance.id) {
            return Err(StoreError::Timeout(format!("save of {}", instance.id)));
        }
        self.inner.save_instance(instance).await
    }

    async fn get_instance(&self, id: Uuid) -> StoreResult<Option<WorkflowInstance>> {
        self.inner.get_instance(id).await
    }
}

/// Instance store whose listing sleeps for a configurable delay and counts loads
#[derive(Debug)]
pub struct SlowInstanceStore {
    inner: InMemoryInstanceStore,
    delay_ms: AtomicU64,
    loads_started: AtomicUsize,
    loads_finished: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowInstanceStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryInstanceStore::new(),
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
            loads_started: AtomicUsize::new(0),
            loads_finished: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn loads_started(&self) -> usize {
        self.loads_started.load(Ordering::SeqCst)
    }

    pub fn loads_finished(&self) -> usize {
        self.loads_finished.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Poll until at least `count` loads have started
    pub async fn wait_for_loads_started(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.loads_started() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("load should start");
    }

    /// Poll until at least `count` loads have finished
    pub async fn wait_for_loads_finished(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.loads_finished() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("load should finish");
    }
}

#[async_trait]
impl InstanceStore for SlowInstanceStore {
    async fn load_active_instances(&self) -> StoreResult<Vec<WorkflowInstance>> {
        self.loads_started.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        let loaded = self.inner.load_active_instances().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.loads_finished.fetch_add(1, Ordering::SeqCst);
        loaded
    }

    async fn save_instance(&self, instance: &WorkflowInstance) -> StoreResult<()> {
        self.inner.save_instance(instance).await
    }

    async fn get_instance(&self, id: Uuid) -> StoreResult<Option<WorkflowInstance>> {
        self.inner.get_instance(id).await
    }
}

/// Notification store that rejects every append
#[derive(Debug, Default)]
pub struct RejectingNotificationStore {
    inner: InMemoryNotificationStore,
    append_attempts: AtomicUsize,
}

impl RejectingNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_attempts(&self) -> usize {
        self.append_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationStore for RejectingNotificationStore {
    async fn append(&self, _record: NotificationRecord) -> StoreResult<()> {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("notification store down".into()))
    }

    async fn mark_read(
        &self,
        id: Uuid,
        action_taken: Option<String>,
        action_time: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<NotificationRecord>> {
        self.inner.mark_read(id, action_taken, action_time).await
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<NotificationRecord>> {
        self.inner.list_by_role(role).await
    }

    async fn has_notification(
        &self,
        task_id: Uuid,
        notification_type: NotificationType,
    ) -> StoreResult<bool> {
        self.inner.has_notification(task_id, notification_type).await
    }
}

/// Engine wired to in-memory stores
pub struct Harness {
    pub engine: Arc<EscalationEngine>,
    pub instances: Arc<InMemoryInstanceStore>,
    pub notifications: Arc<InMemoryNotificationStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EscalationConfig::default())
    }

    pub fn with_config(config: EscalationConfig) -> Self {
        let instances = Arc::new(InMemoryInstanceStore::new());
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let engine = EscalationEngine::new(config, instances.clone(), notifications.clone())
            .expect("default config is valid");
        Self {
            engine: Arc::new(engine),
            instances,
            notifications,
        }
    }

    pub async fn start(&self, template: &WorkflowTemplate) -> WorkflowInstance {
        self.engine
            .start_instance(template, request("scenario"), t0())
            .await
            .unwrap()
    }

    pub async fn reload(&self, instance_id: Uuid) -> WorkflowInstance {
        self.instances
            .get_instance(instance_id)
            .await
            .unwrap()
            .expect("instance exists")
    }
}

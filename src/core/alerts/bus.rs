// Alert bus - delivers notifications to subscribers, the local push surface
// and the contact router.
//
// Subscribers run synchronously and in registration order. A dispatch issued
// from inside a subscriber is queued behind the notification being delivered.
// Contact fan-out runs on a detached tokio task and is never awaited here.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use tokio::runtime::Handle;
use tokio::sync::Notify;

use super::model::{Anomaly, Notification, NotificationId, NotificationKind, Severity};
use super::push::{HeadlessPermissions, LogPushSurface, PermissionProvider, PermissionState, PushSurface};
use super::triggers::{self, LocationMonitor, TriggerConfig};
use crate::core::clock::{Clock, SystemClock};
use crate::core::contacts::router::NotificationRouter;
use crate::core::error::{MonitorError, Result};
use crate::core::model::{Acceleration, BloodPressure, Coordinates, SafeArea};

type Callback = Arc<dyn Fn(&Notification) + Send + Sync>;

struct Registration {
    id: u64,
    callback: Callback,
}

type Registry = Mutex<Vec<Registration>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for one registered callback.
///
/// Dropping it leaves the callback registered; call [`Subscription::unsubscribe`]
/// to remove it.
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes exactly this registration. Other registrations of the same
    /// callback stay in place.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).retain(|r| r.id != self.id);
        }
    }
}

#[derive(Default)]
struct DeliveryState {
    queue: VecDeque<Notification>,
    /// Thread currently draining the queue
    owner: Option<ThreadId>,
}

/// Releases the delivery gate even if a subscriber panics.
struct DeliveryGate<'a> {
    bus: &'a AlertBus,
}

impl Drop for DeliveryGate<'_> {
    fn drop(&mut self) {
        lock(&self.bus.delivery).owner = None;
        self.bus.idle.notify_all();
    }
}

#[derive(Default)]
struct FanoutTracker {
    in_flight: AtomicUsize,
    drained: Notify,
}

struct FanoutGuard(Arc<FanoutTracker>);

impl Drop for FanoutGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.drained.notify_waiters();
        }
    }
}

pub struct AlertBus {
    subscribers: Arc<Registry>,
    next_subscription: AtomicU64,
    permission: Mutex<PermissionState>,
    permission_provider: Arc<dyn PermissionProvider>,
    push_surface: Arc<dyn PushSurface>,
    router: Arc<NotificationRouter>,
    triggers: TriggerConfig,
    clock: Arc<dyn Clock>,
    delivery: Mutex<DeliveryState>,
    idle: Condvar,
    fanout: Arc<FanoutTracker>,
    runtime: Handle,
}

impl AlertBus {
    /// Contact fan-out is spawned on `runtime`.
    pub fn new(router: NotificationRouter, runtime: Handle) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscription: AtomicU64::new(1),
            permission: Mutex::new(PermissionState::Unknown),
            permission_provider: Arc::new(HeadlessPermissions),
            push_surface: Arc::new(LogPushSurface),
            router: Arc::new(router),
            triggers: TriggerConfig::default(),
            clock: Arc::new(SystemClock),
            delivery: Mutex::new(DeliveryState::default()),
            idle: Condvar::new(),
            fanout: Arc::new(FanoutTracker::default()),
            runtime,
        }
    }

    /// Builds a bus bound to the tokio runtime the caller is running in.
    pub fn for_current_runtime(router: NotificationRouter) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;
        Ok(Self::new(router, runtime))
    }

    pub fn with_permission_provider(mut self, provider: Arc<dyn PermissionProvider>) -> Self {
        self.permission_provider = provider;
        self
    }

    pub fn with_push_surface(mut self, surface: Arc<dyn PushSurface>) -> Self {
        self.push_surface = surface;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_triggers(mut self, triggers: TriggerConfig) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn router(&self) -> &NotificationRouter {
        &self.router
    }

    pub fn triggers(&self) -> &TriggerConfig {
        &self.triggers
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn permission(&self) -> PermissionState {
        *lock(&self.permission)
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Registers a callback invoked once per dispatched notification.
    #[must_use = "keep the Subscription to be able to unsubscribe"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscribers).push(Registration {
            id,
            callback: Arc::new(callback),
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Asks the platform for local notification permission. Never fails:
    /// errors keep the previous state and are logged.
    pub fn request_permission(&self) -> PermissionState {
        match self.permission_provider.request() {
            Ok(state) => {
                match state {
                    PermissionState::Unsupported => log::info!(
                        "Local notifications are not supported here; delivering to subscribers only"
                    ),
                    PermissionState::Denied => log::info!("Local notification permission denied"),
                    _ => log::debug!("Local notification permission: {:?}", state),
                }
                *lock(&self.permission) = state;
                state
            }
            Err(e) => {
                log::error!("Failed to request notification permission: {}", e);
                self.permission()
            }
        }
    }

    /// Delivers a notification to every subscriber, the push surface (when
    /// permitted) and, in the background, the contact router.
    ///
    /// A dispatch from another thread waits until the current delivery ends.
    /// Subscribers must not block on such a dispatch (for example by joining
    /// a thread that dispatches): the delivering thread would never release
    /// the gate and both would hang.
    pub fn dispatch(&self, notification: Notification) {
        let current = thread::current().id();
        let mut state = lock(&self.delivery);

        if state.owner == Some(current) {
            // Re-entrant call from a subscriber: deliver after the current one
            state.queue.push_back(notification);
            return;
        }

        while state.owner.is_some() {
            state = self
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.owner = Some(current);
        state.queue.push_back(notification);
        drop(state);

        let _gate = DeliveryGate { bus: self };
        loop {
            let next = lock(&self.delivery).queue.pop_front();
            match next {
                Some(notification) => self.deliver(notification),
                None => break,
            }
        }
    }

    fn deliver(&self, notification: Notification) {
        let snapshot: Vec<Callback> = lock(&self.subscribers)
            .iter()
            .map(|r| Arc::clone(&r.callback))
            .collect();

        for callback in &snapshot {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| callback(&notification)));
            if delivered.is_err() {
                log::error!(
                    "Subscriber panicked while handling notification {}",
                    notification.id()
                );
            }
        }

        self.show_local(&notification);
        self.route(notification);
    }

    fn show_local(&self, notification: &Notification) {
        if self.permission() != PermissionState::Granted {
            return;
        }
        let shown = panic::catch_unwind(AssertUnwindSafe(|| {
            self.push_surface
                .show(notification.title(), notification.message())
        }));
        match shown {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("Failed to show local notification: {}", e),
            Err(_) => log::error!(
                "Push surface panicked while showing notification {}",
                notification.id()
            ),
        }
    }

    fn route(&self, notification: Notification) {
        self.fanout.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = FanoutGuard(Arc::clone(&self.fanout));
        let router = Arc::clone(&self.router);

        self.runtime.spawn(async move {
            let _guard = guard;
            let report = router.notify_contacts(&notification).await;
            if report.failed() > 0 {
                log::warn!(
                    "Notification {}: {} of {} contact sends failed",
                    notification.id(),
                    report.failed(),
                    report.attempts.len()
                );
            }
        });
    }

    /// Waits until every contact fan-out started so far has finished.
    pub async fn flush(&self) {
        loop {
            let drained = self.fanout.drained.notified();
            if self.fanout.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            drained.await;
        }
    }

    fn emit(&self, notification: Notification) -> NotificationId {
        let id = notification.id();
        self.dispatch(notification);
        id
    }

    /// Converts each anomaly into a notification and dispatches it.
    pub fn dispatch_anomalies(&self, anomalies: impl IntoIterator<Item = Anomaly>) -> Vec<NotificationId> {
        anomalies
            .into_iter()
            .map(|anomaly| self.emit(anomaly.into_notification()))
            .collect()
    }

    pub fn check_for_falls(&self, accel: Acceleration) -> Vec<NotificationId> {
        let found = self.triggers.fall.check(accel, self.clock.now());
        self.dispatch_anomalies(found)
    }

    pub fn check_vital_signs(&self, heart_rate: f64, pressure: BloodPressure) -> Vec<NotificationId> {
        let found = self
            .triggers
            .vitals
            .check(heart_rate, pressure, self.clock.now());
        self.dispatch_anomalies(found)
    }

    pub fn check_location(&self, position: Coordinates, area: &SafeArea) -> Vec<NotificationId> {
        let found = LocationMonitor.check(position, area, self.clock.now());
        self.dispatch_anomalies(found)
    }

    /// Compares `last_activity` against the bus clock.
    pub fn check_inactivity(&self, last_activity: DateTime<Utc>) -> Vec<NotificationId> {
        let found = self
            .triggers
            .inactivity
            .check(last_activity, self.clock.now());
        self.dispatch_anomalies(found)
    }

    pub fn fall_notification(&self) -> NotificationId {
        self.emit(triggers::fall_anomaly(self.clock.now()).into_notification())
    }

    pub fn status_notification(&self, message: &str) -> NotificationId {
        self.emit(Notification::new(
            NotificationKind::Status,
            Severity::Low,
            "Status Normal",
            message,
            self.clock.now(),
        ))
    }

    pub fn medication_reminder(&self, medicine: &str) -> NotificationId {
        self.emit(Notification::new(
            NotificationKind::Medication,
            Severity::Medium,
            "Medication Reminder",
            format!("Time for the {} medication", medicine),
            self.clock.now(),
        ))
    }

    pub fn activity_notification(&self, activity: &str) -> NotificationId {
        self.emit(Notification::new(
            NotificationKind::Activity,
            Severity::Low,
            "Physical Activity",
            activity,
            self.clock.now(),
        ))
    }
}

lazy_static! {
    static ref GLOBAL_BUS: RwLock<Option<Arc<AlertBus>>> = RwLock::new(None);
}

/// Installs the process-wide bus. Fails if one is already installed.
pub fn install_global(bus: AlertBus) -> Result<Arc<AlertBus>> {
    let mut slot = GLOBAL_BUS.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(MonitorError::AlreadyInstalled);
    }
    let bus = Arc::new(bus);
    *slot = Some(Arc::clone(&bus));
    Ok(bus)
}

pub fn global() -> Option<Arc<AlertBus>> {
    GLOBAL_BUS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Removes the process-wide bus, returning it for teardown.
pub fn uninstall_global() -> Option<Arc<AlertBus>> {
    GLOBAL_BUS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

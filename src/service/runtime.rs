//! Running instance of a machine.

use crate::core::{
    Action, ActionContext, ActionKind, TransitionHistory, TransitionRecord, Trigger,
};
use crate::machine::{Machine, NodeId, StateNode};
use crate::service::configuration::{ActiveConfiguration, RegionPath};
use crate::service::error::ServiceError;
use crate::service::timer::TimerScheduler;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default cap on events processed by a single `start`, `send` or timer
/// firing, raised events included.
pub const DEFAULT_RAISE_LIMIT: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceStatus {
    NotStarted,
    Running,
    Stopped,
}

/// A running statechart bound to a host context.
///
/// The service owns the active configuration, the armed timers, the queue
/// of raised events and the host context `C` that guards and actions read.
/// The machine itself is shared.
///
/// # Example
///
/// ```rust
/// use stagecraft::builder::{compile, CandidateConfig, DelayedConfig, StateConfig};
/// use stagecraft::core::Implementations;
/// use stagecraft::service::Service;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Fighter {
///     attacking: bool,
/// }
///
/// let config = StateConfig::new("upper-body")
///     .initial("attack-idle")
///     .state(StateConfig::new("attack-idle")
///         .on("tick", CandidateConfig::to("attack-start").guard("attacking?")))
///     .state(StateConfig::new("attack-start")
///         .after(DelayedConfig::new(Duration::from_millis(450), "attack-end")))
///     .state(StateConfig::new("attack-end"));
/// let implementations = Implementations::new().guard("attacking?", |f: &Fighter| f.attacking);
/// let machine = Arc::new(compile(&config, &implementations).unwrap());
///
/// let mut service = Service::new(machine, Fighter::default());
/// service.start().unwrap();
///
/// service.context_mut().attacking = true;
/// let configuration = service.send("tick").unwrap();
/// assert_eq!(configuration.leaf("upper-body"), Some("attack-start"));
///
/// let configuration = service.advance_time(Duration::from_millis(450)).unwrap();
/// assert_eq!(configuration.leaf("upper-body"), Some("attack-end"));
/// ```
pub struct Service<C> {
    id: Uuid,
    machine: Arc<Machine<C>>,
    context: C,
    status: ServiceStatus,
    active: Vec<Vec<NodeId>>,
    timers: TimerScheduler,
    now: Duration,
    queue: VecDeque<String>,
    history: TransitionHistory,
    raise_limit: usize,
}

impl<C> Service<C> {
    /// Create an unstarted service. Engine time starts at zero.
    pub fn new(machine: Arc<Machine<C>>, context: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            machine,
            context,
            status: ServiceStatus::NotStarted,
            active: Vec::new(),
            timers: TimerScheduler::new(),
            now: Duration::ZERO,
            queue: VecDeque::new(),
            history: TransitionHistory::new(),
            raise_limit: DEFAULT_RAISE_LIMIT,
        }
    }

    /// Keep at most `capacity` transition records.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = TransitionHistory::with_capacity(capacity);
        self
    }

    /// Cap the number of events processed by one step.
    pub fn with_raise_limit(mut self, limit: usize) -> Self {
        self.raise_limit = limit;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn machine(&self) -> &Arc<Machine<C>> {
        &self.machine
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the host context, for use between steps.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == ServiceStatus::Running
    }

    /// Current engine time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    pub fn timers(&self) -> &TimerScheduler {
        &self.timers
    }

    /// Snapshot of the active path of every region. Empty unless running.
    pub fn configuration(&self) -> ActiveConfiguration {
        ActiveConfiguration::new(
            self.active
                .iter()
                .enumerate()
                .map(|(region, path)| RegionPath {
                    region: self.machine.region_id(region).to_string(),
                    path: self.machine.ids(path),
                })
                .collect(),
        )
    }

    /// Enter the initial configuration.
    ///
    /// Entry actions run parent before child, region by region, and every
    /// entered state arms its delayed transitions. If an entry action fails
    /// nothing is kept active and the service stays unstarted.
    pub fn start(&mut self) -> Result<ActiveConfiguration, ServiceError> {
        if self.status != ServiceStatus::NotStarted {
            return Err(ServiceError::AlreadyStarted);
        }

        let machine = Arc::clone(&self.machine);
        log::info!("service {} starting machine '{}'", self.id, machine.id());

        if let Err(err) = self.enter_initial(&machine) {
            self.active.clear();
            self.timers.clear();
            self.queue.clear();
            return Err(err);
        }
        self.status = ServiceStatus::Running;

        self.drain()?;
        Ok(self.configuration())
    }

    /// Process an event, then every event raised while processing it.
    ///
    /// An event no active state handles is a no-op.
    pub fn send(&mut self, event: impl Into<String>) -> Result<ActiveConfiguration, ServiceError> {
        self.ensure_running()?;
        self.queue.push_back(event.into());
        self.drain()?;
        Ok(self.configuration())
    }

    /// Move engine time forward to `now` and fire every due timer.
    ///
    /// Timers fire one at a time in deadline order, ties in arming order.
    /// A time earlier than the current one is ignored.
    pub fn advance_time(&mut self, now: Duration) -> Result<ActiveConfiguration, ServiceError> {
        self.ensure_running()?;
        if now < self.now {
            log::warn!(
                "service {} ignoring time {:?} earlier than {:?}",
                self.id,
                now,
                self.now
            );
            return Ok(self.configuration());
        }
        self.now = now;

        let machine = Arc::clone(&self.machine);
        while let Some(timer) = self.timers.pop_due(now) {
            let owner = machine.node(timer.owner);
            let delayed = &owner.after()[timer.index];
            log::debug!(
                "timer on '{}' fired at {:?} (deadline {:?})",
                owner.path(),
                now,
                timer.deadline
            );

            let fired = self.transition_region(
                timer.region,
                timer.owner,
                Some(delayed.target()),
                delayed.actions(),
                ActionKind::Timer,
                Trigger::Timer {
                    delay: delayed.delay(),
                },
            );
            if let Err(err) = fired {
                self.queue.clear();
                return Err(err);
            }
            self.drain()?;
        }

        Ok(self.configuration())
    }

    /// Move engine time forward by `elapsed`.
    pub fn advance_by(&mut self, elapsed: Duration) -> Result<ActiveConfiguration, ServiceError> {
        let now = self.now.saturating_add(elapsed);
        self.advance_time(now)
    }

    /// Exit every active state and release timers and queued events.
    ///
    /// Exit actions run leaf first, region by region, then the parallel
    /// root's. Teardown completes even when an exit action fails; the first
    /// failure is returned.
    pub fn stop(&mut self) -> Result<(), ServiceError> {
        self.ensure_running()?;
        let machine = Arc::clone(&self.machine);
        let mut result = Ok(());

        for path in &self.active {
            for node in path.iter().rev() {
                let state = machine.node(*node);
                let exited = run_actions(
                    state.exit(),
                    ActionKind::Exit,
                    state,
                    &self.context,
                    &mut self.queue,
                );
                if result.is_ok() {
                    result = exited;
                }
            }
        }
        if machine.is_parallel() {
            let root = machine.node(machine.root());
            let exited = run_actions(
                root.exit(),
                ActionKind::Exit,
                root,
                &self.context,
                &mut self.queue,
            );
            if result.is_ok() {
                result = exited;
            }
        }

        let released = self.timers.clear();
        self.queue.clear();
        self.active.clear();
        self.status = ServiceStatus::Stopped;
        log::info!("service {} stopped, released {} timers", self.id, released);

        result
    }

    fn ensure_running(&self) -> Result<(), ServiceError> {
        if self.status == ServiceStatus::Running {
            Ok(())
        } else {
            Err(ServiceError::NotRunning)
        }
    }

    fn enter_initial(&mut self, machine: &Machine<C>) -> Result<(), ServiceError> {
        if machine.is_parallel() {
            let root = machine.node(machine.root());
            run_actions(
                root.entry(),
                ActionKind::Entry,
                root,
                &self.context,
                &mut self.queue,
            )?;
        }

        for (region, &region_root) in machine.regions().iter().enumerate() {
            let mut path = vec![region_root];
            path.extend(machine.initial_descent(region_root));
            for node in &path {
                let state = machine.node(*node);
                run_actions(
                    state.entry(),
                    ActionKind::Entry,
                    state,
                    &self.context,
                    &mut self.queue,
                )?;
            }
            for node in &path {
                self.arm_timers(machine, *node, region);
            }
            log::debug!(
                "region '{}' entered {:?}",
                machine.region_id(region),
                machine.ids(&path)
            );
            self.active.push(path);
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), ServiceError> {
        let mut processed = 0;
        while let Some(event) = self.queue.pop_front() {
            processed += 1;
            if processed > self.raise_limit {
                self.queue.clear();
                return Err(ServiceError::RaiseLimitExceeded {
                    event,
                    limit: self.raise_limit,
                });
            }
            if let Err(err) = self.process_event(&event) {
                self.queue.clear();
                return Err(err);
            }
        }
        Ok(())
    }

    fn process_event(&mut self, event: &str) -> Result<(), ServiceError> {
        let machine = Arc::clone(&self.machine);
        let mut handled = false;

        for region in 0..self.active.len() {
            let declared = self.active[region]
                .iter()
                .rev()
                .find_map(|&node| machine.node(node).rule(event).map(|rule| (node, rule)));
            let Some((source, rule)) = declared else {
                continue;
            };
            let Some(candidate) = rule.select(&self.context) else {
                log::trace!(
                    "no candidate enabled for '{}' on '{}'",
                    event,
                    machine.node(source).path()
                );
                continue;
            };

            handled = true;
            self.transition_region(
                region,
                source,
                candidate.target(),
                candidate.actions(),
                ActionKind::Transition,
                Trigger::Event(event.to_string()),
            )?;
        }

        if !handled {
            log::trace!("event '{}' left every region unchanged", event);
        }
        Ok(())
    }

    /// Run one region transition and commit it once every action succeeded.
    ///
    /// `source` is the active state that declared the rule or armed the
    /// timer. Exits stop below the deepest state shared by the active path
    /// and the target path, so a rule on an ancestor targeting one of its
    /// descendants leaves that ancestor and its timers alone. Without a
    /// target only `actions` run.
    fn transition_region(
        &mut self,
        region: usize,
        source: NodeId,
        target: Option<NodeId>,
        actions: &[Action<C>],
        kind: ActionKind,
        trigger: Trigger,
    ) -> Result<(), ServiceError> {
        let machine = Arc::clone(&self.machine);
        let source_state = machine.node(source);

        let Some(target) = target else {
            return run_actions(actions, kind, source_state, &self.context, &mut self.queue);
        };

        let current = self.active[region].clone();
        let target_path = machine.region_path(target);
        let shared = current
            .iter()
            .zip(&target_path)
            .take_while(|(a, b)| a == b)
            .count();
        // A target on the active path is itself exited and re-entered.
        let domain = shared.min(target_path.len() - 1);

        let exited = &current[domain..];
        let mut entered = target_path[domain..].to_vec();
        entered.extend(machine.initial_descent(target));

        for node in exited.iter().rev() {
            let state = machine.node(*node);
            run_actions(
                state.exit(),
                ActionKind::Exit,
                state,
                &self.context,
                &mut self.queue,
            )?;
        }
        run_actions(actions, kind, source_state, &self.context, &mut self.queue)?;
        for node in &entered {
            let state = machine.node(*node);
            run_actions(
                state.entry(),
                ActionKind::Entry,
                state,
                &self.context,
                &mut self.queue,
            )?;
        }

        for node in exited {
            self.timers.cancel_owner(*node);
        }
        let mut path = current[..domain].to_vec();
        path.extend_from_slice(&entered);
        for node in &entered {
            self.arm_timers(&machine, *node, region);
        }

        let record = TransitionRecord {
            region: machine.region_id(region).to_string(),
            from: machine.ids(&current),
            to: machine.ids(&path),
            trigger,
            at: self.now,
            timestamp: Utc::now(),
        };
        log::debug!(
            "region '{}' {:?} -> {:?} on {:?}",
            record.region,
            record.from_leaf(),
            record.to_leaf(),
            record.trigger
        );
        self.history.record(record);
        self.active[region] = path;
        Ok(())
    }

    fn arm_timers(&mut self, machine: &Machine<C>, node: NodeId, region: usize) {
        let state = machine.node(node);
        for (index, delayed) in state.after().iter().enumerate() {
            let deadline = self.now.saturating_add(delayed.delay());
            self.timers.arm(node, index, region, deadline);
            log::debug!(
                "armed {:?} timer on '{}', due at {:?}",
                delayed.delay(),
                state.path(),
                deadline
            );
        }
    }
}

impl<C> Drop for Service<C> {
    fn drop(&mut self) {
        let released = self.timers.clear();
        let discarded = self.queue.len();
        self.queue.clear();
        if released > 0 || discarded > 0 {
            log::debug!(
                "service {} dropped, released {} timers and {} queued events",
                self.id,
                released,
                discarded
            );
        }
    }
}

fn run_actions<C>(
    actions: &[Action<C>],
    kind: ActionKind,
    state: &StateNode<C>,
    context: &C,
    queue: &mut VecDeque<String>,
) -> Result<(), ServiceError> {
    for action in actions {
        log::trace!("{} action '{}' on '{}'", kind, action.name(), state.path());
        let mut ctx = ActionContext::new(context, kind, state.id(), queue);
        action
            .invoke(&mut ctx)
            .map_err(|source| ServiceError::ActionFailed {
                action: action.name().to_string(),
                state: state.path().to_string(),
                kind,
                source,
            })?;
    }
    Ok(())
}

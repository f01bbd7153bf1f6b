//! # EventDesk Runtime
//!
//! Runtime implementation for the EventDesk client architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, runs the reducer, executes effects
//! - **Feedback loop**: Actions produced by effects are sent back into the store
//! - **`EffectHandle`**: Awaitable completion of everything an action caused,
//!   including the effects of actions fed back by its effects
//!
//! ## Example
//!
//! ```ignore
//! use eventdesk_runtime::Store;
//!
//! let store = Store::new(EventDetailState::new(event_id, viewer), EventDetailReducer::new(), env);
//!
//! // Register, then wait for the registration call *and* the re-fetch it triggers
//! store.send(EventDetailAction::Register).await?.wait().await;
//!
//! let seats = store.state(|s| s.availability()).await;
//! ```

use eventdesk_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::AbortHandle;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store has been torn down and no longer accepts actions
        #[error("Store has been torn down")]
        ShutdownInProgress,

        /// Timeout waiting for a terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Waiting on it returns once every effect the
/// action produced has finished. Effects that feed an action back wait for
/// that action's effects too, so a mutation followed by its reconciling read
/// completes as one unit.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, nothing can still be running
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Created before the task is spawned, so an aborted task that was never
/// polled still releases its slot.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        AbortHandle, Arc, AtomicBool, DecrementGuard, Duration, Effect, EffectHandle,
        EffectTracking, Mutex, Ordering, PoisonError, Reducer, RwLock, StoreError, broadcast,
    };

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent reads)
    /// 2. Reducer (client logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    /// 5. In-flight effect tasks, aborted on [`Store::teardown`]
    ///
    /// Clones share the same state and tasks.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        pub(crate) state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pub(crate) tasks: Arc<Mutex<Vec<AbortHandle>>>,
        /// Actions produced by effects, for request/response style callers.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                tasks: Arc::clone(&self.tasks),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a new store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                tasks: Arc::new(Mutex::new(Vec::new())),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// Runs the reducer under the state write lock, then starts the
        /// returned effects. The returned handle completes when those effects
        /// (and any effects of actions they feed back) have finished.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] after [`Store::teardown`].
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.is_torn_down() {
                tracing::debug!("Dropping action sent after teardown");
                return Err(StoreError::ShutdownInProgress);
            }

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                if self.is_torn_down() {
                    tracing::debug!("Dropping action: store torn down while waiting for state");
                    return Err(StoreError::ShutdownInProgress);
                }
                self.reducer.reduce(&mut state, action, &self.environment)
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast *before* sending, then returns
        /// the first effect-produced action for which `predicate` holds. The
        /// matching action has already been reduced and its effects have
        /// finished by the time it is returned.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before `timeout`
        /// - [`StoreError::ChannelClosed`]: broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: store torn down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut receiver = self.action_broadcast.subscribe();
            let _handle = self.send(action).await?;

            let wait = async {
                loop {
                    match receiver.recv().await {
                        Ok(candidate) if predicate(&candidate) => return Ok(candidate),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action broadcast lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            };

            tokio::time::timeout(timeout, wait)
                .await
                .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read the current state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Abort every in-flight effect and stop accepting actions
        ///
        /// Called when the view owning this store goes away. Responses that
        /// arrive afterwards are never reduced.
        pub fn teardown(&self) {
            self.shutdown.store(true, Ordering::SeqCst);

            let tasks: Vec<AbortHandle> = self
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect();

            let aborted = tasks.iter().filter(|task| !task.is_finished()).count();
            for task in tasks {
                task.abort();
            }

            tracing::debug!(aborted, "Store torn down");
        }

        /// Whether [`Store::teardown`] has been called
        #[must_use]
        pub fn is_torn_down(&self) -> bool {
            self.shutdown.load(Ordering::SeqCst)
        }

        /// Register a spawned effect for teardown; one spawned after teardown
        /// has drained the list is aborted on the spot.
        fn track_task(&self, task: AbortHandle) {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            if self.is_torn_down() {
                task.abort();
                return;
            }
            tasks.retain(|t| !t.is_finished());
            tasks.push(task);
        }

        /// Execute an effect with completion tracking
        ///
        /// - `None`: No-op
        /// - `Future`: Spawned; a produced action is sent back, its own effects
        ///   are awaited, then it is broadcast to subscribers
        /// - `Parallel`: Each child runs concurrently under the same tracking
        /// - `Sequential`: Children run in order, each fully awaited
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        pub(crate) fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    tracking.increment();
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    let task = tokio::spawn(async move {
                        let _guard = guard;

                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                    self.track_task(task.abort_handle());
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                    tracking.increment();
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    let task = tokio::spawn(async move {
                        let _guard = guard;

                        for effect in effects {
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect(effect, step_tracking);
                            step.wait().await;
                        }
                    });
                    self.track_task(task.abort_handle());
                },
            }
        }

        async fn feed_back(&self, action: A) {
            if self.is_torn_down() {
                tracing::debug!("Discarding effect result after teardown");
                return;
            }

            let observed = action.clone();

            match self.send(action).await {
                Ok(mut handle) => handle.wait().await,
                Err(error) => {
                    tracing::debug!(%error, "Feedback action rejected");
                    return;
                },
            }

            // Observers see the action only once its own effects have settled.
            let _ = self.action_broadcast.send(observed);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use eventdesk_core::{smallvec, SmallVec};

    #[derive(Debug, Clone, PartialEq)]
    enum SeatAction {
        Reserve,
        Reserved,
        Refetch,
        Refetched(u32),
        SlowReserve,
        Record(&'static str),
        RecordBoth,
    }

    #[derive(Debug, Default)]
    struct SeatState {
        reserved: bool,
        seats: u32,
        log: Vec<&'static str>,
    }

    struct SeatReducer;

    impl Reducer for SeatReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut SeatState,
            action: SeatAction,
            _env: &(),
        ) -> SmallVec<[Effect<SeatAction>; 4]> {
            match action {
                SeatAction::Reserve => {
                    smallvec![Effect::future(async { Some(SeatAction::Reserved) })]
                },
                SeatAction::Reserved => {
                    state.reserved = true;
                    smallvec![Effect::future(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some(SeatAction::Refetch)
                    })]
                },
                SeatAction::Refetch => {
                    smallvec![Effect::future(async { Some(SeatAction::Refetched(9)) })]
                },
                SeatAction::Refetched(seats) => {
                    state.seats = seats;
                    SmallVec::new()
                },
                SeatAction::SlowReserve => {
                    smallvec![Effect::future(async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Some(SeatAction::Reserved)
                    })]
                },
                SeatAction::Record(entry) => {
                    state.log.push(entry);
                    SmallVec::new()
                },
                SeatAction::RecordBoth => smallvec![Effect::chain(vec![
                    Effect::future(async {
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Some(SeatAction::Record("first"))
                    }),
                    Effect::future(async { Some(SeatAction::Record("second")) }),
                ])],
            }
        }
    }

    fn seat_store() -> Store<SeatState, SeatAction, (), SeatReducer> {
        Store::new(SeatState::default(), SeatReducer, ())
    }

    #[tokio::test]
    async fn wait_covers_cascading_feedback() {
        let store = seat_store();

        let mut handle = store.send(SeatAction::Reserve).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(5))
            .await
            .unwrap();

        let (reserved, seats) = store.state(|s| (s.reserved, s.seats)).await;
        assert!(reserved);
        assert_eq!(seats, 9);
    }

    #[tokio::test]
    async fn sequential_effects_run_in_order() {
        let store = seat_store();

        store
            .send(SeatAction::RecordBoth)
            .await
            .unwrap()
            .wait()
            .await;

        let log = store.state(|s| s.log.clone()).await;
        assert_eq!(log, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn teardown_aborts_in_flight_effects() {
        let store = seat_store();

        let mut handle = store.send(SeatAction::SlowReserve).await.unwrap();
        assert_eq!(handle.pending(), 1);

        store.teardown();
        handle
            .wait_with_timeout(Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!store.state(|s| s.reserved).await);
        assert_eq!(
            store.send(SeatAction::Reserve).await.unwrap_err(),
            StoreError::ShutdownInProgress
        );
    }

    #[tokio::test]
    async fn send_blocked_on_state_during_teardown_is_rejected() {
        let store = seat_store();
        let state = store.state.write().await;

        let sender = store.clone();
        let blocked = tokio::spawn(async move { sender.send(SeatAction::Reserve).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        store.teardown();
        drop(state);

        assert_eq!(
            blocked.await.unwrap().unwrap_err(),
            StoreError::ShutdownInProgress
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!store.state(|s| s.reserved).await);
    }

    #[tokio::test]
    async fn effect_spawned_after_teardown_is_aborted() {
        let store = seat_store();
        store.teardown();

        let (mut handle, tracking) = EffectHandle::new();
        store.execute_effect(
            Effect::future(async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Some(SeatAction::Reserved)
            }),
            tracking,
        );

        handle
            .wait_with_timeout(Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!store.state(|s| s.reserved).await);
        assert!(store.tasks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_matching_action() {
        let store = seat_store();

        let action = store
            .send_and_wait_for(
                SeatAction::Refetch,
                |a| matches!(a, SeatAction::Refetched(_)),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(action, SeatAction::Refetched(9));
    }

    #[tokio::test]
    async fn matched_action_effects_have_settled() {
        let store = seat_store();

        store
            .send_and_wait_for(
                SeatAction::Reserve,
                |a| matches!(a, SeatAction::Reserved),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        // Reserved triggers a delayed refetch, which must already be reduced
        assert_eq!(store.state(|s| s.seats).await, 9);
    }

    #[tokio::test]
    async fn send_and_wait_for_times_out() {
        let store = seat_store();

        let result = store
            .send_and_wait_for(
                SeatAction::Record("noop"),
                |a| matches!(a, SeatAction::Reserved),
                Duration::from_millis(50),
            )
            .await;

        assert_eq!(result.unwrap_err(), StoreError::Timeout);
    }

    #[tokio::test]
    async fn completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        handle
            .wait_with_timeout(Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(handle.pending(), 0);
    }
}

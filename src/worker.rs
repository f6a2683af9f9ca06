//! Signal-multiplexing worker thread
//!
//! This module contains the generic worker-thread primitive the producer and
//! consumer sides are built on. A [`SignalWorker`] gives its owner a dedicated
//! background thread that blocks on a prioritized wait over three independent
//! binary signals and dispatches to owner hooks, without busy-polling:
//!
//! - **Quit** - raised by [`SignalWorker::request_quit`] or at teardown;
//!   absolute priority, structurally terminal
//! - **Trigger** - raised by [`SignalWorker::signal`] from any thread
//! - **Restart/timeout** - the wakeup interval elapsed, or
//!   [`SignalWorker::set_wakeup_interval`] asked the loop to re-evaluate its
//!   wait timeout
//!
//! Signals are bounded(1) crossbeam channels: `try_send` raises a signal
//! idempotently and a receive consumes it, giving auto-reset semantics. The
//! wait-any is a `select!` over the three receivers with an optional timeout.
//!
//! A hook that returns an error is caught and logged; the loop continues,
//! except after quit, which terminates the loop regardless of the hook
//! outcome.
//!
//! Instead of spawning the loop, a foreign caller can drive one wait-any
//! cycle synchronously with [`SignalWorker::wait_for_signal_once`].

use crate::error::{FrameFlowError, Result};
use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Bounded wait applied when joining the loop thread at teardown
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Which kind of signal a wait-any cycle resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalKind {
    /// Unknown or unmapped signal
    #[default]
    Unknown,
    /// A hook failed while handling the signal
    Fault,
    /// Quit signal consumed; the activation is over
    Quit,
    /// Trigger signal consumed
    Trigger,
    /// Wakeup interval elapsed or restart was requested
    Timeout,
}

/// Cooperative cancellation flag scoped to one worker activation
///
/// Cloned into processing units; observed between work slices rather than
/// forcing thread termination.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Execution context handed to every hook invocation
#[derive(Debug, Clone)]
pub struct SignalContext {
    /// Name of the worker dispatching the hook
    pub worker: String,
    /// Cancellation token of the current activation
    pub cancel: CancelToken,
}

/// A hook invoked by the worker loop on its own thread
pub type SignalHook = Box<dyn FnMut(&SignalContext) -> Result<()> + Send>;

/// Owner hooks dispatched by a worker activation
///
/// All hooks are optional; a missing hook makes the signal a no-op.
#[derive(Default)]
pub struct WorkerHooks {
    on_trigger: Option<SignalHook>,
    on_timeout: Option<SignalHook>,
    on_quit: Option<SignalHook>,
}

impl WorkerHooks {
    /// Create an empty hook set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hook invoked on a trigger signal
    pub fn on_trigger(mut self, hook: impl FnMut(&SignalContext) -> Result<()> + Send + 'static) -> Self {
        self.on_trigger = Some(Box::new(hook));
        self
    }

    /// Set the hook invoked on timeout or restart
    pub fn on_timeout(mut self, hook: impl FnMut(&SignalContext) -> Result<()> + Send + 'static) -> Self {
        self.on_timeout = Some(Box::new(hook));
        self
    }

    /// Set the hook invoked once when the quit signal is consumed
    pub fn on_quit(mut self, hook: impl FnMut(&SignalContext) -> Result<()> + Send + 'static) -> Self {
        self.on_quit = Some(Box::new(hook));
        self
    }
}

/// One binary signal with auto-reset semantics
///
/// A bounded(1) channel: raising an already-raised signal is a no-op, a
/// receive consumes it.
struct SignalSlot {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl SignalSlot {
    fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Raise the signal; idempotent and non-blocking
    fn raise(&self) {
        let _ = self.tx.try_send(());
    }

    /// Consume the signal if raised
    fn consume(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Drop any pending raise
    fn clear(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}

/// What a wait-any cycle observed, before hook dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    Quit,
    Trigger,
    /// Restart signal or interval expiry; both re-enter the timeout path
    Timeout,
}

/// State shared between the owner-facing handle and the loop thread
struct WorkerShared {
    name: String,
    /// Poll interval in milliseconds; 0 waits indefinitely
    wakeup_ms: AtomicU64,
    quit: SignalSlot,
    trigger: SignalSlot,
    restart: SignalSlot,
    /// Cancellation flag scoped to the current activation
    cancel: Mutex<CancelToken>,
    initialized: AtomicBool,
}

impl WorkerShared {
    fn cancel_token(&self) -> CancelToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn context(&self) -> SignalContext {
        SignalContext {
            worker: self.name.clone(),
            cancel: self.cancel_token(),
        }
    }

    /// Block until one signal fires, honoring quit priority
    ///
    /// `timeout` of `None` waits indefinitely. If quit is raised together with
    /// another signal, quit wins.
    fn wait_any(&self, timeout: Option<Duration>) -> WaitOutcome {
        if self.quit.consume() {
            return WaitOutcome::Quit;
        }
        let outcome = match timeout {
            Some(t) => {
                select! {
                    recv(self.quit.rx) -> _ => WaitOutcome::Quit,
                    recv(self.trigger.rx) -> _ => WaitOutcome::Trigger,
                    recv(self.restart.rx) -> _ => WaitOutcome::Timeout,
                    default(t) => WaitOutcome::Timeout,
                }
            }
            None => {
                select! {
                    recv(self.quit.rx) -> _ => WaitOutcome::Quit,
                    recv(self.trigger.rx) -> _ => WaitOutcome::Trigger,
                    recv(self.restart.rx) -> _ => WaitOutcome::Timeout,
                }
            }
        };
        // A quit raised concurrently with another signal still wins.
        if outcome != WaitOutcome::Quit && self.quit.consume() {
            return WaitOutcome::Quit;
        }
        outcome
    }

    /// Invoke the hook matching a wait outcome, converting errors to a fault
    fn dispatch(&self, outcome: WaitOutcome, hooks: &mut WorkerHooks) -> SignalKind {
        let ctx = self.context();
        match outcome {
            WaitOutcome::Quit => {
                tracing::info!("{} : detected quit signal", self.name);
                match hooks.on_quit.as_mut().map(|hook| hook(&ctx)) {
                    Some(Err(e)) => {
                        tracing::error!("{} : quit hook failed: {}", self.name, e);
                        SignalKind::Fault
                    }
                    _ => SignalKind::Quit,
                }
            }
            WaitOutcome::Trigger => match hooks.on_trigger.as_mut().map(|hook| hook(&ctx)) {
                Some(Err(e)) => {
                    tracing::error!("{} : trigger hook failed: {}", self.name, e);
                    SignalKind::Fault
                }
                _ => SignalKind::Trigger,
            },
            WaitOutcome::Timeout => match hooks.on_timeout.as_mut().map(|hook| hook(&ctx)) {
                Some(Err(e)) => {
                    tracing::error!("{} : timeout hook failed: {}", self.name, e);
                    SignalKind::Fault
                }
                _ => SignalKind::Timeout,
            },
        }
    }

    fn current_timeout(&self) -> Option<Duration> {
        match self.wakeup_ms.load(Ordering::SeqCst) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Handle to a spawned loop thread plus its completion channel
struct LoopHandle {
    handle: JoinHandle<()>,
    done_rx: Receiver<()>,
}

/// A dedicated background thread multiplexing quit/trigger/timeout signals
///
/// Lifecycle: [`create`](Self::create) (idempotent) ->
/// [`start`](Self::start) -> signal deliveries -> [`destroy`](Self::destroy)
/// (bounded join). All signal-raising operations are safe from any thread.
pub struct SignalWorker {
    shared: Arc<WorkerShared>,
    thread: Mutex<Option<LoopHandle>>,
}

impl SignalWorker {
    /// Create a worker handle with the given name and poll interval
    ///
    /// `wakeup_ms` of 0 disables periodic wakeups (infinite wait). The loop
    /// thread does not exist until [`start`](Self::start).
    pub fn new(name: impl Into<String>, wakeup_ms: u64) -> Self {
        Self {
            shared: Arc::new(WorkerShared {
                name: name.into(),
                wakeup_ms: AtomicU64::new(wakeup_ms),
                quit: SignalSlot::new(),
                trigger: SignalSlot::new(),
                restart: SignalSlot::new(),
                cancel: Mutex::new(CancelToken::new()),
                initialized: AtomicBool::new(false),
            }),
            thread: Mutex::new(None),
        }
    }

    /// Worker name
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether resources are allocated for an activation
    pub fn initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::SeqCst)
    }

    /// Whether the loop thread is currently alive
    pub fn running(&self) -> bool {
        self.thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| !t.handle.is_finished())
            .unwrap_or(false)
    }

    /// Cancellation token of the current activation
    pub fn cancel_token(&self) -> CancelToken {
        self.shared.cancel_token()
    }

    /// Allocate a fresh activation
    ///
    /// Tears down any previous activation, clears pending signals, installs a
    /// fresh cancellation token and marks the worker initialized. Does not
    /// start the loop thread.
    pub fn create(&self) {
        self.destroy();
        {
            let mut cancel = self
                .shared
                .cancel
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *cancel = CancelToken::new();
        }
        self.shared.quit.clear();
        self.shared.trigger.clear();
        self.shared.restart.clear();
        self.shared.initialized.store(true, Ordering::SeqCst);
    }

    /// Spawn the loop thread
    ///
    /// Fails if [`create`](Self::create) has not been called. With
    /// `fire_trigger_immediately` the trigger signal is raised once before the
    /// loop starts waiting, so the first cycle dispatches the trigger hook.
    pub fn start(&self, fire_trigger_immediately: bool, mut hooks: WorkerHooks) -> Result<()> {
        if !self.initialized() {
            tracing::error!("{} : worker not initialized", self.shared.name);
            return Err(FrameFlowError::NotInitialized(self.shared.name.clone()));
        }
        if fire_trigger_immediately {
            self.signal();
        }

        let shared = Arc::clone(&self.shared);
        let (done_tx, done_rx) = bounded(1);
        let handle = std::thread::spawn(move || {
            tracing::info!("{} : starting thread", shared.name);
            loop {
                let outcome = shared.wait_any(shared.current_timeout());
                shared.dispatch(outcome, &mut hooks);
                if outcome == WaitOutcome::Quit {
                    break;
                }
            }
            tracing::info!("{} : thread end", shared.name);
            let _ = done_tx.try_send(());
        });

        let mut thread = self.thread.lock().unwrap_or_else(PoisonError::into_inner);
        *thread = Some(LoopHandle { handle, done_rx });
        Ok(())
    }

    /// Raise the trigger signal; idempotent, non-blocking, safe from any thread
    pub fn signal(&self) {
        self.shared.trigger.raise();
    }

    /// Cancel the activation token and raise the quit signal
    pub fn request_quit(&self) {
        self.shared.cancel_token().cancel();
        self.shared.quit.raise();
    }

    /// Update the poll interval
    ///
    /// Raises the restart signal so a waiting loop re-evaluates its timeout
    /// immediately without consuming a pending trigger or quit.
    pub fn set_wakeup_interval(&self, wakeup_ms: u64) {
        self.shared.wakeup_ms.store(wakeup_ms, Ordering::SeqCst);
        self.shared.restart.raise();
    }

    /// Perform one synchronous wait-any + dispatch cycle on the calling thread
    ///
    /// Usable instead of spawning the loop. `timeout_ms` of 0 waits
    /// indefinitely. Returns which kind of signal fired, or
    /// [`SignalKind::Fault`] if the matching hook failed.
    pub fn wait_for_signal_once(&self, timeout_ms: u64, hooks: &mut WorkerHooks) -> SignalKind {
        tracing::debug!("{} : waiting for signal", self.shared.name);
        let timeout = match timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let outcome = self.shared.wait_any(timeout);
        self.shared.dispatch(outcome, hooks)
    }

    /// Tear down the activation
    ///
    /// Requests quit, then waits up to [`JOIN_TIMEOUT`] for the loop thread to
    /// exit. A thread that does not stop in time is logged as stuck and
    /// abandoned; no forced termination is attempted. The worker is marked
    /// uninitialized either way.
    pub fn destroy(&self) {
        self.request_quit();
        let taken = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(LoopHandle { handle, done_rx }) = taken {
            match done_rx.recv_timeout(JOIN_TIMEOUT) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if handle.join().is_err() {
                        tracing::error!("{} : thread panicked", self.shared.name);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Abandon the handle; the thread keeps its resources.
                    tracing::error!("{} : thread doesn't stop", self.shared.name);
                }
            }
        }
        self.shared.initialized.store(false, Ordering::SeqCst);
    }
}

impl Drop for SignalWorker {
    fn drop(&mut self) {
        self.destroy();
    }
}

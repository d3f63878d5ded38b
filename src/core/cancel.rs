//! One-shot cancellation signal shared between the scheduler and its work.
//!
//! A [`CancellationSource`] owns the signal; every [`CancellationToken`]
//! derived from it observes the same flag. Work can poll the token, block on
//! it, or register a callback that runs when the signal fires.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use super::error::{CancelError, Cancelled, WorkError, WorkResult};
use crate::util::panic::panic_message;

type Callback = Box<dyn FnOnce() -> WorkResult + Send + 'static>;

struct Registry {
    callbacks: Vec<Callback>,
    disposed: bool,
}

struct Signal {
    id: Uuid,
    /// Set only while `registry` is held, read lock-free.
    cancelled: AtomicBool,
    registry: Mutex<Registry>,
    fired: Condvar,
}

/// Observer side of a cancellation signal. Cloning is cheap and shares state.
#[derive(Clone)]
pub struct CancellationToken {
    signal: Arc<Signal>,
}

impl CancellationToken {
    /// Id of the source this token observes.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.signal.id
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.signal.cancelled.load(Ordering::Acquire)
    }

    /// Return `Err(Cancelled)` once cancellation has been requested.
    ///
    /// Meant to be used with `?` inside work closures; the scheduler treats
    /// the resulting [`WorkError::Cancelled`] as a normal completion.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] tagged with this token's source id.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled::new(self.signal.id))
        } else {
            Ok(())
        }
    }

    /// Block the current thread until cancellation is requested.
    pub fn wait(&self) {
        let mut registry = self.signal.registry.lock();
        while !self.is_cancelled() {
            self.signal.fired.wait(&mut registry);
        }
    }

    /// Block until cancellation is requested or `timeout` elapses.
    ///
    /// Returns `true` if the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut registry = self.signal.registry.lock();
        while !self.is_cancelled() {
            if self.signal.fired.wait_until(&mut registry, deadline).timed_out() {
                break;
            }
        }
        self.is_cancelled()
    }

    /// Register a callback to run when the signal fires.
    ///
    /// If the signal already fired the callback runs immediately on the
    /// calling thread and its result is returned.
    ///
    /// # Errors
    ///
    /// Returns the callback's error when it ran immediately, or
    /// [`WorkError::Failed`] if the source has been disposed.
    pub fn register<F>(&self, callback: F) -> WorkResult
    where
        F: FnOnce() -> WorkResult + Send + 'static,
    {
        let mut registry = self.signal.registry.lock();
        if self.is_cancelled() {
            drop(registry);
            return invoke(Box::new(callback));
        }
        if registry.disposed {
            return Err(WorkError::failed("cancellation source has been disposed"));
        }
        registry.callbacks.push(Box::new(callback));
        Ok(())
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("id", &self.signal.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Owner side of a cancellation signal.
///
/// The signal fires at most once; later calls to [`cancel`](Self::cancel)
/// are no-ops.
#[derive(Debug)]
pub struct CancellationSource {
    token: CancellationToken,
}

impl CancellationSource {
    /// Create a source with a fresh, unfired signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken {
                signal: Arc::new(Signal {
                    id: Uuid::new_v4(),
                    cancelled: AtomicBool::new(false),
                    registry: Mutex::new(Registry {
                        callbacks: Vec::new(),
                        disposed: false,
                    }),
                    fired: Condvar::new(),
                }),
            },
        }
    }

    /// Id shared by every token of this source.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.token.id()
    }

    /// Derive a token observing this source.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Check if the signal has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fire the signal and run registered callbacks.
    ///
    /// # Errors
    ///
    /// Returns a [`CancelError`] aggregating every callback that failed or
    /// panicked. The signal is fired regardless.
    pub fn cancel(&self) -> Result<(), CancelError> {
        self.signal().run()
    }

    /// Fire the signal and wake blocked waiters, deferring callbacks.
    ///
    /// Lets a caller flip the flag while holding its own lock and run the
    /// callbacks after releasing it. Returns no callbacks if the signal had
    /// already fired.
    pub fn signal(&self) -> PendingCallbacks {
        let signal = &self.token.signal;
        let mut registry = signal.registry.lock();
        if signal.cancelled.swap(true, Ordering::AcqRel) {
            return PendingCallbacks { callbacks: Vec::new() };
        }
        signal.fired.notify_all();
        PendingCallbacks {
            callbacks: std::mem::take(&mut registry.callbacks),
        }
    }

    /// Release pending callbacks; later registrations fail.
    ///
    /// Tokens already handed out stay valid and keep reporting their state.
    pub fn dispose(&self) {
        let mut registry = self.token.signal.registry.lock();
        registry.disposed = true;
        registry.callbacks.clear();
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Callbacks taken from a freshly fired signal, not yet run.
#[must_use = "callbacks do not run until `run` is called"]
pub struct PendingCallbacks {
    callbacks: Vec<Callback>,
}

impl PendingCallbacks {
    /// Number of callbacks waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether there are no callbacks to run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Run every callback, collecting failures and panics.
    ///
    /// # Errors
    ///
    /// Returns a [`CancelError`] if at least one callback failed.
    pub fn run(self) -> Result<(), CancelError> {
        let failures: Vec<WorkError> = self
            .callbacks
            .into_iter()
            .filter_map(|callback| invoke(callback).err())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CancelError::new(failures))
        }
    }
}

fn invoke(callback: Callback) -> WorkResult {
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(result) => result,
        Err(payload) => Err(WorkError::failed(format!(
            "cancellation callback panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

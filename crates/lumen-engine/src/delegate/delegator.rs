use std::panic::{self, AssertUnwindSafe};
use std::sync::{OnceLock, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, Sender};

use super::error::panic_message;
use super::pending::{self, Pending};
use super::DelegateError;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Lane {
    FireAndForget,
    Blocking,
    WithResult,
}

struct Senders {
    fire: Sender<Job>,
    blocking: Sender<Job>,
    with_result: Sender<Job>,
}

/// Number of tasks executed by one [`Delegator::drain`] call, per queue.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DrainReport {
    pub fire_and_forget: usize,
    pub blocking: usize,
    pub with_result: usize,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.fire_and_forget + self.blocking + self.with_result
    }
}

/// Schedules work onto a single owner thread.
///
/// Any thread may submit; only the owner executes. Submissions made on the
/// owner thread itself run inline before the call returns. Everything else is
/// queued and runs the next time the owner calls [`Delegator::drain`].
///
/// Three FIFO queues exist, one per submission mode. A drain empties them in
/// the order fire-and-forget, blocking, with-result. Nothing is promised about
/// ordering across queues beyond that.
///
/// Blocking submissions use a private one-shot slot per call (see
/// [`Pending`]), so concurrent callers can never receive each other's result.
pub struct Delegator {
    owner: OnceLock<ThreadId>,
    senders: RwLock<Option<Senders>>,
    fire_rx: Receiver<Job>,
    blocking_rx: Receiver<Job>,
    with_result_rx: Receiver<Job>,
}

impl Delegator {
    pub fn new() -> Self {
        let (fire, fire_rx) = crossbeam_channel::unbounded();
        let (blocking, blocking_rx) = crossbeam_channel::unbounded();
        let (with_result, with_result_rx) = crossbeam_channel::unbounded();

        Self {
            owner: OnceLock::new(),
            senders: RwLock::new(Some(Senders {
                fire,
                blocking,
                with_result,
            })),
            fire_rx,
            blocking_rx,
            with_result_rx,
        }
    }

    /// Makes the calling thread the owner.
    ///
    /// The owner can be bound once. Returns true if the calling thread is the
    /// owner after the call.
    pub fn bind_owner(&self) -> bool {
        let me = thread::current().id();
        *self.owner.get_or_init(|| me) == me
    }

    pub fn owner(&self) -> Option<ThreadId> {
        self.owner.get().copied()
    }

    pub fn is_owner_thread(&self) -> bool {
        self.owner.get() == Some(&thread::current().id())
    }

    /// Fire-and-forget submission.
    ///
    /// Errors and panics raised by `task` are logged on the owner thread and
    /// never reach the caller. The only error returned here is
    /// [`DelegateError::Closed`].
    pub fn submit<F>(&self, task: F) -> Result<(), DelegateError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        if self.is_owner_thread() {
            run_detached(task);
            return Ok(());
        }
        self.enqueue(Lane::FireAndForget, Box::new(move || run_detached(task)))
    }

    /// Runs `task` on the owner thread and blocks until it has finished.
    pub fn submit_blocking<F>(&self, task: F) -> Result<(), DelegateError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.schedule(Lane::Blocking, task)?.wait()
    }

    /// Runs `task` on the owner thread and blocks until its value is available.
    pub fn submit_blocking_with_result<T, F>(&self, task: F) -> Result<T, DelegateError>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        self.schedule(Lane::WithResult, task)?.wait()
    }

    /// Queues `task` on the result queue without blocking.
    ///
    /// The returned [`Pending`] can be waited on later, or dropped to abandon
    /// the result.
    pub fn schedule_with_result<T, F>(&self, task: F) -> Result<Pending<T>, DelegateError>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        self.schedule(Lane::WithResult, task)
    }

    fn schedule<T, F>(&self, lane: Lane, task: F) -> Result<Pending<T>, DelegateError>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let (completion, pending) = pending::slot();

        if self.is_owner_thread() {
            completion.fulfil(execute(task));
            return Ok(pending);
        }

        self.enqueue(
            lane,
            Box::new(move || {
                if !completion.fulfil(execute(task)) {
                    log::trace!("delegated result discarded: waiter went away");
                }
            }),
        )?;
        Ok(pending)
    }

    fn enqueue(&self, lane: Lane, job: Job) -> Result<(), DelegateError> {
        // Held across the send so `close` cannot slip in between.
        let guard = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        let Some(senders) = guard.as_ref() else {
            return Err(DelegateError::Closed);
        };

        let tx = match lane {
            Lane::FireAndForget => &senders.fire,
            Lane::Blocking => &senders.blocking,
            Lane::WithResult => &senders.with_result,
        };
        tx.send(job).map_err(|_| DelegateError::Closed)
    }

    /// Executes queued work. Owner thread only.
    ///
    /// Each queue is drained of the tasks present when its turn comes, so
    /// producers that keep submitting cannot starve the owner's loop.
    pub fn drain(&self) -> DrainReport {
        if !self.is_owner_thread() {
            log::warn!("Delegator::drain called off the owner thread; ignored");
            return DrainReport::default();
        }

        DrainReport {
            fire_and_forget: drain_queue(&self.fire_rx),
            blocking: drain_queue(&self.blocking_rx),
            with_result: drain_queue(&self.with_result_rx),
        }
    }

    /// Tasks waiting across all three queues.
    pub fn pending_len(&self) -> usize {
        self.fire_rx.len() + self.blocking_rx.len() + self.with_result_rx.len()
    }

    pub fn is_closed(&self) -> bool {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Stops accepting work from other threads and discards queued tasks.
    ///
    /// Callers blocked on discarded tasks receive [`DelegateError::Cancelled`];
    /// later submissions from non-owner threads fail with
    /// [`DelegateError::Closed`]. Owner-thread submissions still run inline.
    /// Returns the number of discarded tasks.
    pub fn close(&self) -> usize {
        let senders = self
            .senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if senders.is_none() {
            return 0;
        }
        drop(senders);

        let dropped: usize = [&self.fire_rx, &self.blocking_rx, &self.with_result_rx]
            .into_iter()
            .map(|rx| rx.try_iter().count())
            .sum();
        if dropped > 0 {
            log::debug!("delegator closed; {dropped} queued task(s) discarded");
        }
        dropped
    }
}

impl Default for Delegator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Delegator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegator")
            .field("owner", &self.owner())
            .field("pending", &self.pending_len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn drain_queue(rx: &Receiver<Job>) -> usize {
    let queued = rx.len();
    let mut ran = 0;
    while ran < queued {
        let Ok(job) = rx.try_recv() else {
            break;
        };
        job();
        ran += 1;
    }
    ran
}

/// Runs a task, converting both `Err` and panics into a [`DelegateError`].
fn execute<T, F>(task: F) -> Result<T, DelegateError>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(DelegateError::Failed(err)),
        Err(payload) => Err(DelegateError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn run_detached<F>(task: F)
where
    F: FnOnce() -> anyhow::Result<()>,
{
    if let Err(err) = execute(task) {
        log::warn!("fire-and-forget task: {err}");
    }
}

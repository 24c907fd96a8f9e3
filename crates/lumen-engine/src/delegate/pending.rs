use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::DelegateError;

/// Creates a connected single-use completion slot.
pub(crate) fn slot<T>() -> (Completion<T>, Pending<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (Completion { tx }, Pending { rx, early: None })
}

/// Producer half of a completion slot; held by the task on the owner thread.
///
/// Consumed by [`Completion::fulfil`], so a slot can be fulfilled at most once.
/// Dropping it unfulfilled wakes the waiter with [`DelegateError::Cancelled`].
#[derive(Debug)]
pub struct Completion<T> {
    tx: Sender<Result<T, DelegateError>>,
}

impl<T> Completion<T> {
    /// Delivers the task outcome.
    ///
    /// Returns false when the waiter has already gone away; the value is
    /// dropped in that case.
    pub fn fulfil(self, result: Result<T, DelegateError>) -> bool {
        self.tx.send(result).is_ok()
    }
}

/// Consumer half of a completion slot; held by the submitting thread.
///
/// Dropping it abandons the slot: the task still runs, but its outcome is
/// discarded.
#[derive(Debug)]
pub struct Pending<T> {
    rx: Receiver<Result<T, DelegateError>>,
    early: Option<Result<T, DelegateError>>,
}

impl<T> Pending<T> {
    /// Blocks until the owner thread has executed the task.
    ///
    /// There is no timeout: an owner thread that never drains stalls the
    /// caller indefinitely.
    pub fn wait(self) -> Result<T, DelegateError> {
        if let Some(result) = self.early {
            return result;
        }
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(DelegateError::Cancelled),
        }
    }

    /// True once the outcome (or a cancellation) is available without blocking.
    pub fn is_ready(&mut self) -> bool {
        if self.early.is_some() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.early = Some(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.early = Some(Err(DelegateError::Cancelled));
                true
            }
        }
    }

    /// Gives up on the result.
    pub fn cancel(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfilled_slot_yields_value() {
        let (done, mut pending) = slot::<u32>();
        assert!(!pending.is_ready());
        assert!(done.fulfil(Ok(7)));
        assert!(pending.is_ready());
        assert_eq!(pending.wait().unwrap(), 7);
    }

    #[test]
    fn dropped_completion_cancels_waiter() {
        let (done, mut pending) = slot::<()>();
        drop(done);
        assert!(pending.is_ready());
        assert!(matches!(pending.wait(), Err(DelegateError::Cancelled)));
    }

    #[test]
    fn fulfil_after_abandon_is_a_no_op() {
        let (done, pending) = slot::<String>();
        pending.cancel();
        assert!(!done.fulfil(Ok("late".to_string())));
    }

    #[test]
    fn error_is_delivered_to_waiter() {
        let (done, pending) = slot::<u8>();
        done.fulfil(Err(DelegateError::Failed(anyhow::anyhow!("boom"))));
        let err = pending.wait().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::delegate::Delegator;
use crate::platform::{Platform, PlatformControl};

use super::Engine;

const LATCH_POLL: Duration = Duration::from_millis(1);

/// Owner-thread loop: polls the platform and drains delegated work until the
/// engine leaves `Running`. Returns the platform failure that ended it, if any.
pub(crate) fn run<P: Platform>(engine: &Engine, platform: &mut P) -> Option<anyhow::Error> {
    let delegator = engine.delegator();
    let mut failure = None;

    while engine.state().is_running() {
        match platform.poll_input() {
            Ok(PlatformControl::Continue) => {}
            Ok(PlatformControl::Exit) => {
                log::info!("platform requested exit");
                engine.stop();
            }
            Err(e) => {
                log::error!("platform input failed: {e:#}");
                failure = Some(e);
                engine.stop();
            }
        }
        platform.poll_controllers();

        let report = delegator.drain();
        if report.total() > 0 {
            log::trace!("drained {report:?}");
        }

        thread::yield_now();
    }

    failure
}

/// Waits for the render thread to finish, draining the delegator meanwhile so
/// a render thread blocked on the owner cannot deadlock shutdown.
pub(crate) fn await_render(delegator: &Delegator, latch: &Receiver<()>) {
    loop {
        match latch.recv_timeout(LATCH_POLL) {
            Err(RecvTimeoutError::Timeout) => {
                delegator.drain();
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    delegator.drain();
}

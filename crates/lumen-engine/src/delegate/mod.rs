//! Owner-thread task delegation.
//!
//! Some state may only be touched on the thread that started the engine (OS
//! windowing objects, most notably). Other threads reach it by handing a
//! closure to the [`Delegator`], which the owner thread executes during its
//! main loop.
//!
//! Submission modes:
//! - [`Delegator::submit`]: fire-and-forget; failures are logged
//! - [`Delegator::submit_blocking`]: waits for completion, returns failures
//! - [`Delegator::submit_blocking_with_result`]: waits for a typed value

mod delegator;
mod error;
mod pending;

pub use delegator::{Delegator, DrainReport};
pub use error::DelegateError;
pub use pending::{Completion, Pending};

pub(crate) use error::panic_message;

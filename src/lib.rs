//! # relay
//!
//! Combinators for composing continuation-style tasks.
//!
//! A [`Task`] takes positional inputs and a [`Continuation`], and reports
//! through the continuation with an optional error followed by zero or more
//! values. The combinators turn a list of tasks into a single operation that
//! follows the same convention:
//!
//! - [`Chain`]: a pipeline. Each task's values become the next task's inputs;
//!   the first error stops it.
//! - [`Combine`]: a fan-out. All tasks start at once; the callback fires for
//!   the first error, or once every task succeeded.
//! - [`Parallel`]: a fan-out that always waits for every task and reports all
//!   errors by task position.
//!
//! Results of combine and parallel are laid out by task position. A slot is
//! `None` until its task reports, and a task's values are kept as
//! [`TaskOutput::Single`] when it reported exactly one value and as
//! [`TaskOutput::Multiple`] otherwise.
//!
//! The combinators never block, spawn or time out. Tasks may complete
//! synchronously or later from any thread; a task that never reports keeps
//! the final callback from firing.
//!
//! # Module Organization
//!
//! - [`continuation`] - Tasks, continuations and result shaping
//! - [`chain`], [`combine`], [`parallel`] - The combinators
//! - [`outcome`] - Payloads resolved by the `run` futures
//! - [`config`] - Diagnostics configuration
//! - [`error`] - Errors raised by the combinators themselves
//!
//! # Examples
//!
//! ```
//! use relay::{Task, TaskOutput};
//!
//! let fetch: relay::Combine<&str, String> = relay::combine([
//!     Task::new(|_, k| k.succeed(vec!["a1", "a2"])),
//!     Task::new(|_, k| k.succeed(vec!["b"])),
//!     Task::new(|_, k| k.succeed(vec!["c1", "c2"])),
//! ]);
//!
//! fetch.call(vec![], |error, results| {
//!     assert!(error.is_none());
//!     assert_eq!(
//!         results,
//!         vec![
//!             Some(TaskOutput::Multiple(vec!["a1", "a2"])),
//!             Some(TaskOutput::Single("b")),
//!             Some(TaskOutput::Multiple(vec!["c1", "c2"])),
//!         ]
//!     );
//! });
//! ```

pub mod chain;
pub mod combine;
mod completion;
pub mod config;
pub mod continuation;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod outcome;
pub mod parallel;

// Re-export commonly used types
pub use chain::Chain;
pub use combine::Combine;
pub use config::{ConfigError, RelayConfig};
pub use continuation::{Continuation, ErrorSlots, Slots, Task, TaskOutput};
pub use error::{RelayError, Result};
pub use outcome::{CombineOutcome, ParallelOutcome};
pub use parallel::Parallel;

/// Build a [`Chain`] running `tasks` in sequence.
///
/// Fails with [`RelayError::EmptyChain`] when `tasks` is empty.
pub fn chain<T, E, I>(tasks: I) -> Result<Chain<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = Task<T, E>>,
{
    Chain::new(tasks)
}

/// Build a [`Combine`] over `tasks`.
pub fn combine<T, E, I>(tasks: I) -> Combine<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = Task<T, E>>,
{
    Combine::new(tasks)
}

/// Build a [`Parallel`] over `tasks`.
pub fn parallel<T, E, I>(tasks: I) -> Parallel<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = Task<T, E>>,
{
    Parallel::new(tasks)
}

//! Awaiting a combinator invocation.
//!
//! Each combinator has a `run` method next to `call`. `run` launches the
//! tasks immediately, exactly like `call`, and returns a future resolving to
//! what the final callback would have received. When every continuation of
//! the invocation is dropped without the final callback firing, the future
//! resolves to [`RelayError::Abandoned`] instead of pending forever.
//!
//! # Examples
//!
//! ```
//! use relay::{Combine, Task, TaskOutput};
//!
//! # futures::executor::block_on(async {
//! let combine: Combine<&str, String> = Combine::new([
//!     Task::new(|_, k| k.succeed(vec!["a1", "a2"])),
//!     Task::new(|_, k| k.succeed(vec!["b"])),
//! ]);
//!
//! let outcome = combine.run(vec![]).await.unwrap();
//! assert!(outcome.error.is_none());
//! assert_eq!(
//!     outcome.results,
//!     vec![
//!         Some(TaskOutput::Multiple(vec!["a1", "a2"])),
//!         Some(TaskOutput::Single("b")),
//!     ]
//! );
//! # });
//! ```

use futures::channel::oneshot;
use std::future::Future;

use crate::continuation::{ErrorSlots, Slots, TaskOutput};
use crate::error::RelayError;

/// What the final callback of a [`Combine`](crate::Combine) invocation received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineOutcome<T, E> {
    /// The first reported error, if any
    pub error: Option<E>,
    /// Results in task order; holes for tasks that had not reported when the
    /// first error arrived
    pub results: Slots<T>,
}

impl<T, E> CombineOutcome<T, E> {
    /// Whether every task completed without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse into the results of a fully successful invocation, or the error
    pub fn into_result(self) -> Result<Vec<TaskOutput<T>>, E> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.results.into_iter().flatten().collect()),
        }
    }
}

/// What the final callback of a [`Parallel`](crate::Parallel) invocation received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelOutcome<T, E> {
    /// Errors by task position, or `None` when no task failed
    pub errors: Option<ErrorSlots<E>>,
    /// Results in task order, including values reported alongside errors
    pub results: Slots<T>,
}

impl<T, E> ParallelOutcome<T, E> {
    /// Whether every task completed without error
    pub fn is_success(&self) -> bool {
        self.errors.is_none()
    }

    /// Indices of the tasks that reported an error
    pub fn failed_indices(&self) -> Vec<usize> {
        self.errors
            .iter()
            .flatten()
            .enumerate()
            .filter_map(|(index, error)| error.as_ref().map(|_| index))
            .collect()
    }
}

/// A sender for the final callback to complete, and the future awaiting it
pub(crate) fn bridge<O>(
    combinator: &'static str,
) -> (
    oneshot::Sender<O>,
    impl Future<Output = Result<O, RelayError>> + Send + 'static,
)
where
    O: Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let outcome = async move {
        receiver
            .await
            .map_err(|_| RelayError::Abandoned { combinator })
    };
    (sender, outcome)
}

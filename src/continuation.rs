//! The continuation convention shared by every combinator
//!
//! A [`Task`] is invoked with its positional inputs and exactly one
//! [`Continuation`]. The task reports through the continuation with an
//! optional error followed by zero or more values. Combinators hand each task
//! a continuation they synthesize, and expose the same convention at the
//! outer level through their final callback.
//!
//! # Examples
//!
//! ```
//! use relay::{Continuation, Task};
//!
//! let double: Task<i32, String> = Task::new(|inputs: Vec<i32>, k| {
//!     k.succeed(inputs.into_iter().map(|v| v * 2).collect());
//! });
//!
//! double.invoke(
//!     vec![1, 2],
//!     Continuation::new(|error, values| {
//!         assert!(error.is_none());
//!         assert_eq!(values, vec![2, 4]);
//!     }),
//! );
//! ```

use std::fmt;
use std::sync::Arc;

type ResumeFn<T, E> = Box<dyn FnOnce(Option<E>, Vec<T>) + Send>;
type TaskFn<T, E> = Arc<dyn Fn(Vec<T>, Continuation<T, E>) + Send + Sync>;

/// Results buffer: one slot per task, `None` for a task that never reported
pub type Slots<T> = Vec<Option<TaskOutput<T>>>;

/// Error record: `Some` at every index whose task reported an error
pub type ErrorSlots<E> = Vec<Option<E>>;

/// One-shot completion handle given to a task.
///
/// Resuming consumes the handle, so a task reports at most once per
/// continuation. Dropping it without resuming means the task never
/// completes.
pub struct Continuation<T, E> {
    resume: ResumeFn<T, E>,
}

impl<T, E> Continuation<T, E> {
    /// Wrap a completion function
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Option<E>, Vec<T>) + Send + 'static,
    {
        Self {
            resume: Box::new(f),
        }
    }

    /// Report an optional error followed by the yielded values
    pub fn resume(self, error: Option<E>, values: Vec<T>) {
        (self.resume)(error, values);
    }

    /// Report success with the yielded values
    pub fn succeed(self, values: Vec<T>) {
        self.resume(None, values);
    }

    /// Report an error with no accompanying values
    pub fn fail(self, error: E) {
        self.resume(Some(error), Vec::new());
    }

    /// Report an error together with values.
    ///
    /// Parallel keeps these values in the results buffer; combine keeps them
    /// in the partial results it delivers; chain drops them.
    pub fn fail_with(self, error: E, values: Vec<T>) {
        self.resume(Some(error), values);
    }
}

impl<T, E> fmt::Debug for Continuation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation").finish_non_exhaustive()
    }
}

/// A continuation-style operation.
///
/// Cloning is cheap: clones share the same underlying function.
pub struct Task<T, E> {
    inner: TaskFn<T, E>,
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create a task from a function taking inputs and a continuation
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<T>, Continuation<T, E>) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Create a task that completes synchronously from a fallible function
    ///
    /// # Examples
    ///
    /// ```
    /// use relay::{Continuation, Task};
    ///
    /// let parse: Task<String, String> = Task::from_fn(|inputs: Vec<String>| {
    ///     inputs
    ///         .into_iter()
    ///         .map(|s| s.parse::<i64>().map(|n| (n + 1).to_string()).map_err(|e| e.to_string()))
    ///         .collect()
    /// });
    ///
    /// parse.invoke(
    ///     vec!["41".to_string()],
    ///     Continuation::new(|error, values| {
    ///         assert!(error.is_none());
    ///         assert_eq!(values, vec!["42".to_string()]);
    ///     }),
    /// );
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Vec<T>) -> Result<Vec<T>, E> + Send + Sync + 'static,
    {
        Self::new(move |inputs, continuation| match f(inputs) {
            Ok(values) => continuation.succeed(values),
            Err(error) => continuation.fail(error),
        })
    }
}

impl<T, E> Task<T, E> {
    /// Invoke the task with its inputs and continuation
    pub fn invoke(&self, inputs: Vec<T>, continuation: Continuation<T, E>) {
        (self.inner)(inputs, continuation);
    }
}

impl<T, E> Clone for Task<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

/// Values one task yielded, shaped by how many it reported.
///
/// Exactly one value is kept as [`TaskOutput::Single`]; zero or several are
/// kept in order as [`TaskOutput::Multiple`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput<T> {
    /// The task yielded exactly one value
    Single(T),
    /// The task yielded zero or more than one value
    Multiple(Vec<T>),
}

impl<T> From<Vec<T>> for TaskOutput<T> {
    fn from(values: Vec<T>) -> Self {
        match <[T; 1]>::try_from(values) {
            Ok([value]) => Self::Single(value),
            Err(values) => Self::Multiple(values),
        }
    }
}

impl<T> TaskOutput<T> {
    /// Flatten back into the values the task reported
    pub fn into_values(self) -> Vec<T> {
        match self {
            Self::Single(value) => vec![value],
            Self::Multiple(values) => values,
        }
    }

    /// The value, if the task yielded exactly one
    pub fn as_single(&self) -> Option<&T> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(_) => None,
        }
    }

    /// Number of values the task reported
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(values) => values.len(),
        }
    }

    /// Whether the task reported no value at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Fan-out composition that waits for every task.
//!
//! [`Parallel`] invokes its tasks like [`Combine`](crate::Combine), but an
//! error never cuts the invocation short. The final callback fires once every
//! task has reported, with all errors laid out by task position and the values
//! of every task, failed or not.
//!
//! # Examples
//!
//! ```
//! use relay::{Parallel, Task, TaskOutput};
//!
//! let parallel: Parallel<u32, String> = Parallel::new([
//!     Task::new(|_, k| k.succeed(vec![1])),
//!     Task::new(|_, k| k.fail("disk full".to_string())),
//!     Task::new(|_, k| k.succeed(vec![3, 4])),
//! ]);
//!
//! parallel.call(vec![], |errors, results| {
//!     assert_eq!(errors, Some(vec![None, Some("disk full".to_string()), None]));
//!     assert_eq!(results[2], Some(TaskOutput::Multiple(vec![3, 4])));
//! });
//! ```

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

use crate::completion::SlotBuffer;
use crate::config::RelayConfig;
use crate::continuation::{Continuation, ErrorSlots, Slots, Task, TaskOutput};
use crate::error::Result;
use crate::outcome::{bridge, ParallelOutcome};

const COMBINATOR: &str = "parallel";

type ParallelCallback<T, E> = Box<dyn FnOnce(Option<ErrorSlots<E>>, Slots<T>) + Send>;

struct Invocation<T, E> {
    results: SlotBuffer<TaskOutput<T>>,
    errors: SlotBuffer<E>,
    callback: Option<ParallelCallback<T, E>>,
}

impl<T, E> Invocation<T, E> {
    /// Take the callback and both buffers once every task has reported
    #[allow(clippy::type_complexity)]
    fn take_completed(
        &mut self,
    ) -> Option<(ParallelCallback<T, E>, Option<ErrorSlots<E>>, Slots<T>)> {
        if !self.results.is_complete() {
            return None;
        }
        let callback = self.callback.take()?;
        let errors = self.errors.has_any().then(|| self.errors.take());
        Some((callback, errors, self.results.take()))
    }
}

/// Tasks invoked together; the callback fires once all of them reported,
/// whatever their outcome.
pub struct Parallel<T, E> {
    tasks: Arc<[Task<T, E>]>,
    name: Arc<str>,
    config: RelayConfig,
}

impl<T, E> Parallel<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Run `tasks` side by side; their order fixes the order of argument
    /// sets, error slots and result slots.
    pub fn new<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = Task<T, E>>,
    {
        Self {
            tasks: tasks.into_iter().collect(),
            name: Arc::from(COMBINATOR),
            config: RelayConfig::default(),
        }
    }

    /// Name used in log events (chainable)
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Arc::from(name.into());
        self
    }

    /// Replace the diagnostics configuration (chainable)
    #[must_use]
    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether there is no task to run
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Name used in log events
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke every task and deliver all outcomes once all have reported.
    ///
    /// `arg_sets[i]` holds the inputs of task `i`; a missing set means no
    /// inputs. The callback fires exactly once, after the last report, with:
    /// - `Some(errors)` where `errors[i]` is task `i`'s error, when at least one
    ///   task failed, or `None` when none did;
    /// - every task's values in task order, including values a failing task
    ///   reported alongside its error.
    pub fn call<F>(&self, arg_sets: Vec<Vec<T>>, callback: F)
    where
        F: FnOnce(Option<ErrorSlots<E>>, Slots<T>) + Send + 'static,
    {
        let count = self.tasks.len();
        let _span = self.config.invocation_span(COMBINATOR, &self.name, count);
        tracing::debug!(name = %self.name, tasks = count, "starting parallel");

        if arg_sets.len() > count {
            self.config
                .surplus_args(COMBINATOR, &self.name, count, arg_sets.len());
        }
        if count == 0 {
            callback(None, Vec::new());
            return;
        }

        let state = Arc::new(Mutex::new(Invocation {
            results: SlotBuffer::with_len(count),
            errors: SlotBuffer::with_len(count),
            callback: Some(Box::new(callback)),
        }));

        let mut arg_sets = arg_sets.into_iter();
        for (index, task) in self.tasks.iter().enumerate() {
            let inputs = arg_sets.next().unwrap_or_default();
            task.invoke(inputs, self.continuation(Arc::clone(&state), index));
        }
    }

    /// Invoke every task and await the payload the callback would receive.
    ///
    /// Fails with [`RelayError::Abandoned`](crate::RelayError::Abandoned)
    /// when the callback can no longer fire: some task dropped its
    /// continuation and every other continuation of the invocation has been
    /// consumed or dropped.
    pub fn run(
        &self,
        arg_sets: Vec<Vec<T>>,
    ) -> impl Future<Output = Result<ParallelOutcome<T, E>>> + Send {
        let (sender, outcome) = bridge(COMBINATOR);
        self.call(arg_sets, move |errors, results| {
            let _ = sender.send(ParallelOutcome { errors, results });
        });
        outcome
    }

    fn continuation(
        &self,
        state: Arc<Mutex<Invocation<T, E>>>,
        index: usize,
    ) -> Continuation<T, E> {
        let name = Arc::clone(&self.name);
        let config = self.config.clone();

        Continuation::new(move |error, values| {
            let completed = {
                let mut invocation = state.lock();
                if invocation.callback.is_none() {
                    drop(invocation);
                    config.late_report(COMBINATOR, &name, index);
                    return;
                }

                tracing::trace!(
                    name = %name,
                    task = index,
                    failed = error.is_some(),
                    values = values.len(),
                    "task reported"
                );
                invocation.results.fill(index, TaskOutput::from(values));
                if let Some(error) = error {
                    invocation.errors.fill(index, error);
                }
                invocation.take_completed()
            };

            if let Some((callback, errors, results)) = completed {
                tracing::debug!(
                    name = %name,
                    failed = errors.as_ref().map_or(0, |e| e.iter().flatten().count()),
                    "parallel completed"
                );
                callback(errors, results);
            }
        })
    }
}

impl<T, E> Clone for Parallel<T, E> {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            name: Arc::clone(&self.name),
            config: self.config.clone(),
        }
    }
}

impl<T, E> std::fmt::Debug for Parallel<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parallel")
            .field("name", &self.name)
            .field("tasks", &self.tasks.len())
            .field("config", &self.config)
            .finish()
    }
}

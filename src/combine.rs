//! Fan-out composition that reports the first error.
//!
//! [`Combine`] invokes all of its tasks at once, each with its own argument
//! set, and collects their results by task position. The final callback
//! fires once: either for the first error (with whatever results had arrived
//! by then) or after every task has reported successfully.
//!
//! # Examples
//!
//! ```
//! use relay::{Combine, Task, TaskOutput};
//!
//! let combine: Combine<&str, String> = Combine::new([
//!     Task::new(|_, k| k.succeed(vec!["a1", "a2"])),
//!     Task::new(|inputs, k| k.succeed(inputs)),
//! ]);
//!
//! combine.call(vec![vec![], vec!["b"]], |error, results| {
//!     assert!(error.is_none());
//!     assert_eq!(
//!         results,
//!         vec![
//!             Some(TaskOutput::Multiple(vec!["a1", "a2"])),
//!             Some(TaskOutput::Single("b")),
//!         ]
//!     );
//! });
//! ```

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

use crate::completion::SlotBuffer;
use crate::config::RelayConfig;
use crate::continuation::{Continuation, Slots, Task, TaskOutput};
use crate::error::Result;
use crate::outcome::{bridge, CombineOutcome};

const COMBINATOR: &str = "combine";

type CombineCallback<T, E> = Box<dyn FnOnce(Option<E>, Slots<T>) + Send>;

/// State of one outer invocation, shared by its task continuations
struct Invocation<T, E> {
    results: SlotBuffer<TaskOutput<T>>,
    /// Taken when the final callback fires
    callback: Option<CombineCallback<T, E>>,
}

/// Tasks invoked together; the callback fires for the first error or once
/// all tasks succeeded.
pub struct Combine<T, E> {
    tasks: Arc<[Task<T, E>]>,
    name: Arc<str>,
    config: RelayConfig,
}

impl<T, E> Combine<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Combine `tasks`; their order fixes the order of argument sets and
    /// result slots.
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

    /// Number of combined tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task was combined
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Name used in log events
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke every task and deliver their results.
    ///
    /// `arg_sets[i]` holds the inputs of task `i`; a missing set means no
    /// inputs. The callback fires exactly once:
    /// - with `(Some(error), results)` for the first reported error, where
    ///   `results` has `None` for every task that had not reported yet;
    /// - otherwise with `(None, results)` once every task reported, every slot
    ///   populated.
    ///
    /// Reports arriving after that are ignored. A task that never reports
    /// keeps the callback from firing unless another task fails first.
    pub fn call<F>(&self, arg_sets: Vec<Vec<T>>, callback: F)
    where
        F: FnOnce(Option<E>, Slots<T>) + Send + 'static,
    {
        let count = self.tasks.len();
        let _span = self.config.invocation_span(COMBINATOR, &self.name, count);
        tracing::debug!(name = %self.name, tasks = count, "starting combine");

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
    /// when the callback can no longer fire because continuations were
    /// dropped.
    pub fn run(
        &self,
        arg_sets: Vec<Vec<T>>,
    ) -> impl Future<Output = Result<CombineOutcome<T, E>>> + Send {
        let (sender, outcome) = bridge(COMBINATOR);
        self.call(arg_sets, move |error, results| {
            let _ = sender.send(CombineOutcome { error, results });
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
            let fire = {
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

                if error.is_some() || invocation.results.is_complete() {
                    invocation
                        .callback
                        .take()
                        .map(|callback| (callback, invocation.results.take()))
                } else {
                    None
                }
            };

            // The lock is released before user code runs
            if let Some((callback, results)) = fire {
                tracing::debug!(
                    name = %name,
                    task = index,
                    failed = error.is_some(),
                    "combine completed"
                );
                callback(error, results);
            }
        })
    }
}

impl<T, E> Clone for Combine<T, E> {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            name: Arc::clone(&self.name),
            config: self.config.clone(),
        }
    }
}

impl<T, E> std::fmt::Debug for Combine<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Combine")
            .field("name", &self.name)
            .field("tasks", &self.tasks.len())
            .field("config", &self.config)
            .finish()
    }
}

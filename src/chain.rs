//! Sequential composition of tasks.
//!
//! A [`Chain`] runs its tasks as a pipeline: the initial arguments go to the
//! first task, and every value a task yields becomes an input of the next
//! one. The first reported error stops the pipeline and is the only thing the
//! final callback receives.
//!
//! # Examples
//!
//! ```
//! use relay::{Chain, Task};
//!
//! let pipeline: Chain<i64, String> = Chain::new([
//!     Task::from_fn(|inputs: Vec<i64>| Ok(vec![inputs.iter().sum()])),
//!     Task::from_fn(|inputs: Vec<i64>| Ok(inputs.iter().map(|v| v * 10).collect())),
//! ])
//! .unwrap()
//! .named("sum-then-scale");
//!
//! pipeline.call(vec![1, 2, 3], |error, values| {
//!     assert!(error.is_none());
//!     assert_eq!(values, vec![60]);
//! });
//! ```

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

use crate::config::RelayConfig;
use crate::continuation::{Continuation, Task};
use crate::error::{RelayError, Result};
use crate::outcome::bridge;

const COMBINATOR: &str = "chain";

type ChainCallback<T, E> = Box<dyn FnOnce(Option<E>, Vec<T>) + Send>;

/// A pipeline of one or more tasks.
///
/// Cloning is cheap and every clone runs the same tasks. Each call is an
/// independent invocation.
pub struct Chain<T, E> {
    tasks: Arc<[Task<T, E>]>,
    name: Arc<str>,
    config: RelayConfig,
}

impl<T, E> Chain<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Build a pipeline running `tasks` in order.
    ///
    /// Returns [`RelayError::EmptyChain`] when `tasks` is empty.
    pub fn new<I>(tasks: I) -> Result<Self>
    where
        I: IntoIterator<Item = Task<T, E>>,
    {
        let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();
        if tasks.is_empty() {
            return Err(RelayError::EmptyChain);
        }
        Ok(Self {
            tasks,
            name: Arc::from(COMBINATOR),
            config: RelayConfig::default(),
        })
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

    /// Number of tasks in the pipeline
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Always false: a chain holds at least one task
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pipeline name used in log events
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the pipeline.
    ///
    /// `args` go to the first task. `callback` receives `(None, values)` with
    /// the last task's values, or `(Some(error), vec![])` for the first error
    /// any task reports. Tasks that report synchronously run one after
    /// another inside this call; once a task defers its report, the pipeline
    /// resumes from that task's continuation.
    pub fn call<F>(&self, args: Vec<T>, callback: F)
    where
        F: FnOnce(Option<E>, Vec<T>) + Send + 'static,
    {
        let _span = self
            .config
            .invocation_span(COMBINATOR, &self.name, self.tasks.len());
        tracing::debug!(
            name = %self.name,
            tasks = self.tasks.len(),
            args = args.len(),
            "starting chain"
        );

        Run::start(
            Arc::clone(&self.tasks),
            Arc::clone(&self.name),
            args,
            Box::new(callback),
        );
    }

    /// Run the pipeline and await its result.
    ///
    /// The outer `Result` fails with [`RelayError::Abandoned`] when a task
    /// drops its continuation; the inner one carries the pipeline's values or
    /// the first task-reported error.
    pub fn run(
        &self,
        args: Vec<T>,
    ) -> impl Future<Output = Result<std::result::Result<Vec<T>, E>>> + Send {
        let (sender, outcome) = bridge(COMBINATOR);
        self.call(args, move |error, values| {
            let _ = sender.send(match error {
                Some(error) => Err(error),
                None => Ok(values),
            });
        });
        outcome
    }
}

/// State of one pipeline invocation, shared by its continuations
struct Invocation<T, E> {
    /// Set while a driver loop is inside `Task::invoke`
    driving: bool,
    /// Values a task reported before its `invoke` call returned
    parked: Option<Vec<T>>,
    /// Taken when the final callback fires
    callback: Option<ChainCallback<T, E>>,
}

/// Drives one invocation through the pipeline.
///
/// A task that reports synchronously parks its values for the loop in
/// [`Run::drive`] instead of starting the next task from inside its own
/// `invoke` call, so stack depth stays constant however long the pipeline.
struct Run<T, E> {
    tasks: Arc<[Task<T, E>]>,
    name: Arc<str>,
    state: Arc<Mutex<Invocation<T, E>>>,
}

impl<T, E> Run<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn start(
        tasks: Arc<[Task<T, E>]>,
        name: Arc<str>,
        args: Vec<T>,
        callback: ChainCallback<T, E>,
    ) {
        let run = Self {
            tasks,
            name,
            state: Arc::new(Mutex::new(Invocation {
                driving: false,
                parked: None,
                callback: Some(callback),
            })),
        };
        run.drive(0, args);
    }

    /// Invoke tasks from `index` on, until one defers its report or the
    /// pipeline finishes
    fn drive(&self, mut index: usize, mut inputs: Vec<T>) {
        loop {
            let Some(task) = self.tasks.get(index).cloned() else {
                tracing::debug!(name = %self.name, "chain completed");
                self.finish(None, inputs);
                return;
            };

            tracing::trace!(
                name = %self.name,
                task = index,
                inputs = inputs.len(),
                "invoking task"
            );
            self.state.lock().driving = true;
            task.invoke(inputs, self.continuation(index));

            let mut invocation = self.state.lock();
            match invocation.parked.take() {
                Some(values) => {
                    index += 1;
                    inputs = values;
                },
                None => {
                    // The report is deferred; its continuation drives on
                    invocation.driving = false;
                    return;
                },
            }
        }
    }

    fn continuation(&self, index: usize) -> Continuation<T, E> {
        let run = self.clone();
        Continuation::new(move |error, values| {
            if let Some(error) = error {
                tracing::debug!(
                    name = %run.name,
                    task = index,
                    "task reported an error; chain aborted"
                );
                run.finish(Some(error), Vec::new());
                return;
            }

            {
                let mut invocation = run.state.lock();
                if invocation.driving {
                    invocation.parked = Some(values);
                    return;
                }
            }
            run.drive(index + 1, values);
        })
    }

    fn finish(&self, error: Option<E>, values: Vec<T>) {
        let callback = self.state.lock().callback.take();
        if let Some(callback) = callback {
            callback(error, values);
        }
    }
}

impl<T, E> Clone for Run<T, E> {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            name: Arc::clone(&self.name),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> Clone for Chain<T, E> {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            name: Arc::clone(&self.name),
            config: self.config.clone(),
        }
    }
}

impl<T, E> std::fmt::Debug for Chain<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("tasks", &self.tasks.len())
            .field("config", &self.config)
            .finish()
    }
}

/// A chain obeys the task convention at its outer level, so it can be
/// nested in another chain or fanned out by combine and parallel.
impl<T, E> From<Chain<T, E>> for Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn from(chain: Chain<T, E>) -> Self {
        Task::new(move |inputs, continuation: Continuation<T, E>| {
            chain.call(inputs, move |error, values| continuation.resume(error, values));
        })
    }
}

//! Test doubles shared by the integration tests.
//!
//! - [`Stub`]: records the inputs of every invocation and optionally reports a
//!   fixed outcome synchronously.
//! - [`Deferred`]: keeps each task's continuation so the test decides when,
//!   and in which order, tasks report.
//! - [`Recorder`]: records every invocation of a final callback.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use relay::{Continuation, Task};

pub type Value = &'static str;
pub type Failure = &'static str;

/// Records inputs; reports `outcome` when one is configured
#[derive(Clone)]
pub struct Stub {
    calls: Arc<Mutex<Vec<Vec<Value>>>>,
    outcome: Option<(Option<Failure>, Vec<Value>)>,
}

impl Stub {
    /// A stub that never reports
    pub fn silent() -> Self {
        Self {
            calls: Arc::default(),
            outcome: None,
        }
    }

    /// A stub that reports success with `values`
    pub fn yields(values: Vec<Value>) -> Self {
        Self {
            calls: Arc::default(),
            outcome: Some((None, values)),
        }
    }

    /// A stub that reports `error` along with `values`
    pub fn fails(error: Failure, values: Vec<Value>) -> Self {
        Self {
            calls: Arc::default(),
            outcome: Some((Some(error), values)),
        }
    }

    pub fn task(&self) -> Task<Value, Failure> {
        let calls = Arc::clone(&self.calls);
        let outcome = self.outcome.clone();
        Task::new(move |inputs, continuation: Continuation<Value, Failure>| {
            calls.lock().push(inputs);
            if let Some((error, values)) = outcome.clone() {
                continuation.resume(error, values);
            }
        })
    }

    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.calls.lock().clone()
    }

    pub fn called(&self) -> bool {
        !self.calls.lock().is_empty()
    }

    pub fn called_with(&self, inputs: &[Value]) -> bool {
        self.calls.lock().iter().any(|call| call == inputs)
    }
}

/// Holds continuations until the test resumes them
#[derive(Clone)]
pub struct Deferred {
    slots: Arc<Mutex<Vec<Option<Continuation<Value, Failure>>>>>,
}

impl Deferred {
    pub fn new(count: usize) -> Self {
        Self {
            slots: Arc::new(Mutex::new((0..count).map(|_| None).collect())),
        }
    }

    /// Task that parks its continuation in slot `index`
    pub fn task(&self, index: usize) -> Task<Value, Failure> {
        let slots = Arc::clone(&self.slots);
        Task::new(move |_, continuation| {
            slots.lock()[index] = Some(continuation);
        })
    }

    pub fn tasks(&self) -> Vec<Task<Value, Failure>> {
        let count = self.slots.lock().len();
        (0..count).map(|index| self.task(index)).collect()
    }

    /// Report for the task parked in slot `index`
    pub fn resume(&self, index: usize, error: Option<Failure>, values: Vec<Value>) {
        let continuation = self.slots.lock()[index]
            .take()
            .expect("task was not invoked or already reported");
        continuation.resume(error, values);
    }
}

/// Records every invocation of a final callback
pub struct Recorder<E, P> {
    calls: Arc<Mutex<Vec<(Option<E>, P)>>>,
}

impl<E, P> Default for Recorder<E, P> {
    fn default() -> Self {
        Self {
            calls: Arc::default(),
        }
    }
}

impl<E: Clone + Send + 'static, P: Clone + Send + 'static> Recorder<E, P> {
    pub fn callback(&self) -> impl FnOnce(Option<E>, P) + Send + 'static {
        let calls = Arc::clone(&self.calls);
        move |error: Option<E>, payload: P| {
            calls.lock().push((error, payload));
        }
    }

    pub fn calls(&self) -> Vec<(Option<E>, P)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn only_call(&self) -> (Option<E>, P) {
        let calls = self.calls.lock();
        assert_eq!(calls.len(), 1, "expected exactly one callback invocation");
        calls[0].clone()
    }
}

//! Property-based tests using proptest.
//!
//! Verify the combinator invariants under arbitrary task counts, argument
//! sets, yielded values and completion orders:
//! - combine and parallel hand argument set `i` to task `i`, in order
//! - result slots follow task position, never completion order
//! - the final callback fires exactly once, and only after the last report
//! - parallel reports an error at exactly the indices that failed
//! - a chain threads values through every task

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use relay::{Continuation, Slots, Task, TaskOutput};

type Parked = Arc<Mutex<Vec<Option<Continuation<u32, String>>>>>;

// ─── Strategies ─────────────────────────────────────────────────────────────

/// Values yielded per task, with a completion order over those tasks
fn arb_reports() -> impl Strategy<Value = (Vec<Vec<u32>>, Vec<usize>)> {
    (0usize..6).prop_flat_map(|count| {
        (
            prop::collection::vec(prop::collection::vec(any::<u32>(), 0..4), count),
            Just((0..count).collect::<Vec<_>>()).prop_shuffle(),
        )
    })
}

fn echo() -> Task<u32, String> {
    Task::new(|inputs, k| k.succeed(inputs))
}

fn parked(count: usize) -> (Parked, Vec<Task<u32, String>>) {
    let slots: Parked = Arc::new(Mutex::new((0..count).map(|_| None).collect()));
    let tasks = (0..count)
        .map(|index| {
            let slots = Arc::clone(&slots);
            Task::new(move |_, k| slots.lock()[index] = Some(k))
        })
        .collect();
    (slots, tasks)
}

fn resume(slots: &Parked, index: usize, error: Option<String>, values: Vec<u32>) {
    let continuation = slots.lock()[index].take();
    if let Some(continuation) = continuation {
        continuation.resume(error, values);
    }
}

// ─── Properties ─────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn combine_spreads_argument_sets_by_position(
        task_count in 0usize..6,
        arg_sets in prop::collection::vec(prop::collection::vec(any::<u32>(), 0..4), 0..8),
    ) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);

        relay::combine((0..task_count).map(|_| echo()))
            .call(arg_sets.clone(), move |error, results| sink.lock().push((error, results)));

        let expected: Slots<u32> = (0..task_count)
            .map(|i| Some(TaskOutput::from(arg_sets.get(i).cloned().unwrap_or_default())))
            .collect();
        prop_assert_eq!(calls.lock().clone(), vec![(None, expected)]);
    }

    #[test]
    fn output_is_single_exactly_for_one_value(
        values in prop::collection::vec(any::<u32>(), 0..5),
    ) {
        let output = TaskOutput::from(values.clone());
        prop_assert_eq!(output.as_single().is_some(), values.len() == 1);
        prop_assert_eq!(output.len(), values.len());
        prop_assert_eq!(output.into_values(), values);
    }

    #[test]
    fn combine_results_ignore_completion_order((reports, order) in arb_reports()) {
        let (slots, tasks) = parked(reports.len());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);

        relay::combine(tasks).call(vec![], move |error, results| sink.lock().push((error, results)));

        for (step, &index) in order.iter().enumerate() {
            prop_assert_eq!(calls.lock().len(), 0, "fired before report {}", step);
            resume(&slots, index, None, reports[index].clone());
        }

        let expected: Slots<u32> = reports.into_iter().map(|v| Some(TaskOutput::from(v))).collect();
        prop_assert_eq!(calls.lock().clone(), vec![(None, expected)]);
    }

    #[test]
    fn parallel_reports_errors_at_failed_indices(
        (reports, order) in arb_reports(),
        failures in prop::collection::vec(any::<bool>(), 6),
    ) {
        let (slots, tasks) = parked(reports.len());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);

        relay::parallel(tasks).call(vec![], move |errors, results| sink.lock().push((errors, results)));

        for &index in &order {
            prop_assert_eq!(calls.lock().len(), 0);
            let error = failures[index].then(|| format!("task {index}"));
            resume(&slots, index, error, reports[index].clone());
        }

        let calls = calls.lock().clone();
        prop_assert_eq!(calls.len(), 1);
        let (errors, results) = calls.into_iter().next().unwrap();

        let expected_errors: Vec<Option<String>> = (0..reports.len())
            .map(|i| failures[i].then(|| format!("task {i}")))
            .collect();
        if expected_errors.iter().any(Option::is_some) {
            prop_assert_eq!(errors, Some(expected_errors));
        } else {
            prop_assert_eq!(errors, None);
        }
        let expected: Slots<u32> = reports.into_iter().map(|v| Some(TaskOutput::from(v))).collect();
        prop_assert_eq!(results, expected);
    }

    #[test]
    fn chain_threads_values_through_every_task(
        stages in 1usize..8,
        args in prop::collection::vec(0u32..1000, 0..5),
    ) {
        let increment: Task<u32, String> =
            Task::from_fn(|inputs: Vec<u32>| Ok(inputs.into_iter().map(|v| v + 1).collect()));
        let chain = relay::chain(std::iter::repeat(increment).take(stages)).unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);

        chain.call(args.clone(), move |error, values| sink.lock().push((error, values)));

        let expected: Vec<u32> = args.iter().map(|v| v + stages as u32).collect();
        prop_assert_eq!(calls.lock().clone(), vec![(None, expected)]);
    }
}

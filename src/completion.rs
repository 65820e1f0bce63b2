//! Completion detection shared by combine and parallel

/// Fixed-length buffer with one slot per task.
///
/// A slot is either a hole (the task has not reported) or populated. The
/// buffer is complete only when every index holds a value, so a populated
/// later slot never hides an unpopulated earlier one.
#[derive(Debug)]
pub(crate) struct SlotBuffer<V> {
    slots: Vec<Option<V>>,
}

impl<V> SlotBuffer<V> {
    pub(crate) fn with_len(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
        }
    }

    /// Populate the slot at `index`, replacing any earlier value
    pub(crate) fn fill(&mut self, index: usize, value: V) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(value);
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub(crate) fn has_any(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// Move the slots out, leaving an empty buffer behind
    pub(crate) fn take(&mut self) -> Vec<Option<V>> {
        std::mem::take(&mut self.slots)
    }
}

//! Mutable per-area search state.
//!
//! Proposals mutate the aggregate in place by a symmetric
//! subtract/add delta; a rejected proposal is undone by the inverse
//! delta over the same cells in the same element order, so the
//! bookkeeping never drifts from the selection it mirrors.

/// The current selection and its aggregate.
#[derive(Debug, Clone)]
pub(crate) struct SearchState {
    /// Indices into the microdata pool, one per drawn individual.
    pub selection: Vec<usize>,
    /// Element-wise sum of the selected records' attribute rows.
    pub aggregate: Vec<f64>,
    /// Divergence of `aggregate` from the area's targets.
    pub fitness: f64,
}

impl SearchState {
    /// Applies the delta of replacing one `old` row with one `new` row.
    #[inline]
    pub fn apply_swap(&mut self, old_row: &[f64], new_row: &[f64]) {
        for ((slot, &old), &new) in self.aggregate.iter_mut().zip(old_row).zip(new_row) {
            *slot = *slot - old + new;
        }
    }

    /// Undoes [`apply_swap`](Self::apply_swap): the exact inverse
    /// delta, over the same cells in the same order.
    #[inline]
    pub fn revert_swap(&mut self, old_row: &[f64], new_row: &[f64]) {
        for ((slot, &old), &new) in self.aggregate.iter_mut().zip(old_row).zip(new_row) {
            *slot = *slot - new + old;
        }
    }
}

/// Fixed-size ring of the most recent fitness observations.
#[derive(Debug)]
pub(crate) struct FitnessWindow {
    values: Vec<f64>,
    index: usize,
}

impl FitnessWindow {
    /// Creates a zero-filled window holding `initial` at position 0.
    pub fn new(size: usize, initial: f64) -> Self {
        debug_assert!(size > 0);
        let mut values = vec![0.0; size];
        values[0] = initial;
        Self {
            values,
            index: 1 % size,
        }
    }

    /// Records an observation at the rolling index.
    pub fn push(&mut self, fitness: f64) {
        self.values[self.index] = fitness;
        self.index = (self.index + 1) % self.values.len();
    }

    /// Relative spread `(max - min) / max` of the window; 0 when the
    /// maximum is not positive, so a degenerate window reads as fully
    /// stagnated rather than producing a sign-flipped ratio.
    pub fn range_ratio(&self) -> f64 {
        let mut min = self.values[0];
        let mut max = self.values[0];
        for &v in &self.values[1..] {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        if max <= 0.0 {
            0.0
        } else {
            (max - min) / max
        }
    }
}

/// Deep copy of the best state observed so far.
#[derive(Debug)]
pub(crate) struct BestSnapshot {
    pub selection: Vec<usize>,
    pub aggregate: Vec<f64>,
    pub fitness: f64,
}

impl BestSnapshot {
    pub fn capture(state: &SearchState) -> Self {
        Self {
            selection: state.selection.clone(),
            aggregate: state.aggregate.clone(),
            fitness: state.fitness,
        }
    }

    /// Overwrites the snapshot in place. Callers only invoke this on
    /// strict improvement, so the snapshot fitness never increases.
    pub fn update(&mut self, state: &SearchState) {
        self.selection.copy_from_slice(&state.selection);
        self.aggregate.copy_from_slice(&state.aggregate);
        self.fitness = state.fitness;
    }
}

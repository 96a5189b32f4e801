//! Per-area annealing loop.
//!
//! # Algorithm
//!
//! 1. Filter the pool down to the records feasible for the area;
//!    draw the initial selection uniformly with replacement from it
//! 2. At each iteration:
//!    a. Propose replacing one uniformly chosen selection slot with a
//!    uniformly drawn feasible record
//!    b. Apply the aggregate delta and score the result
//!    c. Accept by the Metropolis criterion, otherwise revert the
//!    delta exactly and charge the change budget
//!    d. Track the best state seen; reheat when the fitness window
//!    flatlines
//! 3. Terminate on the iteration cap, an exhausted change budget, a
//!    cold temperature, the fitness threshold, or deep stagnation
//! 4. Return the best snapshot, never the final state
//!
//! # Reference
//!
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated
//! Annealing"

use rand::Rng;
use tracing::debug;

use super::config::AnnealerConfig;
use super::state::{BestSnapshot, FitnessWindow, SearchState};
use crate::error::{SynthError, SynthResult};
use crate::population::{is_feasible, AreaConstraint, AreaResult, MicrodataPool};

/// Proposal draws per iteration before the iteration is skipped.
const MAX_PROPOSAL_ATTEMPTS: usize = 100;

/// Result of one area's anneal.
#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    /// The best solution found, resolved to record identifiers.
    pub result: AreaResult,

    /// Total iterations executed.
    pub iterations: usize,

    /// Number of accepted moves (including improvements).
    pub accepted_moves: usize,

    /// Number of strictly improving moves.
    pub improving_moves: usize,

    /// Number of reheat events triggered by stagnation.
    pub reheats: usize,

    /// Temperature when the anneal stopped.
    pub final_temperature: f64,
}

/// Executes the annealing search for one area.
pub struct AnnealRunner;

impl AnnealRunner {
    /// Runs the anneal for `area` against the shared `pool`.
    ///
    /// The caller supplies the random source; the coordinator hands
    /// each worker its own seeded generator.
    pub fn run<R: Rng>(
        pool: &MicrodataPool,
        area: &AreaConstraint,
        config: &AnnealerConfig,
        rng: &mut R,
    ) -> SynthResult<AnnealOutcome> {
        config.validate()?;
        if area.population == 0 {
            return Err(SynthError::Configuration(format!(
                "area '{}' has a zero population count",
                area.id
            )));
        }

        let feasible: Vec<usize> = (0..pool.len())
            .filter(|&i| is_feasible(pool.row(i), &area.values))
            .collect();
        if feasible.is_empty() {
            return Err(SynthError::NoFeasibleRecords {
                areas: vec![area.id.clone()],
            });
        }

        // Initial selection: uniform with replacement from the
        // feasible set.
        let count = area.population as usize;
        let mut selection = Vec::with_capacity(count);
        let mut aggregate = vec![0.0; pool.width()];
        for _ in 0..count {
            let index = feasible[rng.random_range(0..feasible.len())];
            selection.push(index);
            for (slot, value) in aggregate.iter_mut().zip(pool.row(index)) {
                *slot += value;
            }
        }

        let fitness = config.distance.evaluate(&area.values, &aggregate);
        let mut state = SearchState {
            selection,
            aggregate,
            fitness,
        };
        let mut best = BestSnapshot::capture(&state);
        let mut window = FitnessWindow::new(config.window_size, fitness);

        let mut temperature = config.initial_temp;
        let mut remaining_changes = config.change;
        let mut iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut reheats = 0usize;

        'search: while iterations < config.max_iterations
            && remaining_changes > 0
            && temperature > config.min_temp
        {
            iterations += 1;

            // Candidates come from the whole pool; infeasible draws
            // are retried. A fully failed scan skips the proposal but
            // leaves the change budget untouched.
            let mut candidate = None;
            for _ in 0..MAX_PROPOSAL_ATTEMPTS {
                let index = rng.random_range(0..pool.len());
                if is_feasible(pool.row(index), &area.values) {
                    candidate = Some(index);
                    break;
                }
            }

            if let Some(new_index) = candidate {
                let slot = rng.random_range(0..state.selection.len());
                let old_index = state.selection[slot];

                state.apply_swap(pool.row(old_index), pool.row(new_index));
                let new_fitness = config.distance.evaluate(&area.values, &state.aggregate);

                // Metropolis: improvements always pass; worsening
                // moves pass with probability exp(-delta / T).
                let improving = new_fitness < state.fitness;
                let accept = improving
                    || ((state.fitness - new_fitness) / temperature).exp() >= rng.random::<f64>();

                if accept {
                    state.selection[slot] = new_index;
                    state.fitness = new_fitness;
                    accepted_moves += 1;
                    if improving {
                        improving_moves += 1;
                    }
                } else {
                    state.revert_swap(pool.row(old_index), pool.row(new_index));
                    remaining_changes -= 1;
                }

                if state.fitness < best.fitness {
                    best.update(&state);
                }
                if best.fitness <= config.fitness_threshold {
                    break 'search;
                }
            }

            window.push(state.fitness);

            if iterations >= config.window_size {
                let ratio = window.range_ratio();
                if ratio < config.min_improvement {
                    temperature =
                        (temperature * (1.0 + config.reheat_factor)).max(config.initial_temp * 0.1);
                    reheats += 1;
                    debug!(area = %area.id, temperature, "reheat after stagnation");
                    if ratio < config.min_improvement / 10.0 {
                        break 'search;
                    }
                }
            }

            temperature *= config.cooling_rate;
        }

        let record_ids = best
            .selection
            .iter()
            .map(|&index| pool.id(index).to_string())
            .collect();
        let result = AreaResult {
            area: area.id.clone(),
            population: area.population,
            totals: best.aggregate,
            target: area.values.clone(),
            record_ids,
            fitness: best.fitness,
        };

        Ok(AnnealOutcome {
            result,
            iterations,
            accepted_moves,
            improving_moves,
            reheats,
            final_temperature: temperature,
        })
    }
}

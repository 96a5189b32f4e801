//! Parallel fan-out of per-area anneals and result streaming.
//!
//! Scheduling is parallel across areas, sequential within an area.
//! Worker threads claim areas from a shared cursor and send finished
//! results over a bounded channel; the coordinator thread doubles as
//! the writer, handing each result to the sinks as one contiguous
//! group of rows. The first sink error stops the feed, lets in-flight
//! anneals finish, drains the channel, and surfaces the error.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::progress::ProgressObserver;
use super::sink::{AggregateSink, AssignmentSink};
use crate::annealer::{AnnealOutcome, AnnealRunner, AnnealerConfig};
use crate::error::{SynthError, SynthResult};
use crate::population::{ensure_matching_schema, ConstraintSet, MicrodataPool};
use crate::random::{create_rng, derive_worker_seeds};

/// Statistics of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of areas written to the sinks.
    pub areas: usize,
    /// Worker threads used.
    pub workers: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Runs the annealer for every area and streams results to the sinks.
///
/// # Examples
///
/// ```no_run
/// use synthpop::annealer::AnnealerConfig;
/// use synthpop::coordinator::{Coordinator, MemoryAggregateSink, MemoryAssignmentSink};
/// # fn demo(pool: synthpop::population::MicrodataPool,
/// #         constraints: synthpop::population::ConstraintSet) -> synthpop::error::SynthResult<()> {
/// let mut assignments = MemoryAssignmentSink::new();
/// let mut aggregates = MemoryAggregateSink::new();
///
/// let summary = Coordinator::new(AnnealerConfig::default().with_seed(42))
///     .run(&pool, &constraints, &mut assignments, &mut aggregates)?;
/// println!("wrote {} areas", summary.areas);
/// # Ok(())
/// # }
/// ```
pub struct Coordinator {
    config: AnnealerConfig,
    max_workers: Option<usize>,
    progress: Option<Arc<dyn ProgressObserver>>,
}

impl Coordinator {
    pub fn new(config: AnnealerConfig) -> Self {
        Self {
            config,
            max_workers: None,
            progress: None,
        }
    }

    /// Caps the worker count below the hardware parallelism.
    ///
    /// A cap of 1 makes a seeded run fully deterministic.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers.max(1));
        self
    }

    /// Registers an observer notified after each area is written.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Synthesises every area and streams the results.
    ///
    /// Results reach the sinks in arbitrary area order; within one
    /// area the assignment rows and the aggregate row form one
    /// contiguous group.
    pub fn run<A, G>(
        &self,
        pool: &MicrodataPool,
        constraints: &ConstraintSet,
        assignments: &mut A,
        aggregates: &mut G,
    ) -> SynthResult<RunSummary>
    where
        A: AssignmentSink,
        G: AggregateSink,
    {
        let started = Instant::now();
        self.config.validate()?;
        ensure_matching_schema(constraints, pool)?;

        assignments.write_header()?;
        aggregates.write_header(pool.attributes())?;

        let areas = constraints.areas();
        if areas.is_empty() {
            assignments.flush()?;
            aggregates.flush()?;
            return Ok(RunSummary {
                areas: 0,
                workers: 0,
                elapsed: started.elapsed(),
            });
        }

        let hardware = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let workers = hardware
            .min(areas.len())
            .min(self.max_workers.unwrap_or(usize::MAX));

        let mut master = match self.config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };
        let seeds = derive_worker_seeds(&mut master, workers);

        info!(workers, areas = areas.len(), "starting population synthesis");

        let cursor = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let (sender, receiver) = mpsc::sync_channel::<SynthResult<AnnealOutcome>>(workers * 2);

        let mut written = 0usize;
        let mut sink_error: Option<SynthError> = None;
        let mut infeasible_areas: Vec<String> = Vec::new();

        thread::scope(|scope| {
            for seed in seeds {
                let worker_sender = sender.clone();
                let cursor = &cursor;
                let stop = &stop;
                let config = &self.config;
                scope.spawn(move || {
                    let mut rng = create_rng(seed);
                    loop {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        if index >= areas.len() {
                            break;
                        }
                        let outcome = AnnealRunner::run(pool, &areas[index], config, &mut rng);
                        if worker_sender.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(sender);

            // The coordinator thread is the writer: one result is
            // processed to completion before the next, so each area's
            // rows stay contiguous. After a sink error the channel is
            // still drained so workers never block on a full queue.
            for received in receiver {
                if sink_error.is_some() {
                    continue;
                }
                match received {
                    Ok(outcome) => {
                        if let Err(error) = write_result(assignments, aggregates, &outcome) {
                            stop.store(true, Ordering::Relaxed);
                            sink_error = Some(SynthError::SinkWrite(error));
                            continue;
                        }
                        written += 1;
                        debug!(
                            area = %outcome.result.area,
                            fitness = outcome.result.fitness,
                            iterations = outcome.iterations,
                            "area written"
                        );
                        if let Some(progress) = &self.progress {
                            progress.on_area_done(written, areas.len());
                        }
                    }
                    Err(SynthError::NoFeasibleRecords { areas: failed }) => {
                        infeasible_areas.extend(failed);
                    }
                    Err(other) => {
                        stop.store(true, Ordering::Relaxed);
                        sink_error = Some(other);
                    }
                }
            }
        });

        if let Some(error) = sink_error {
            return Err(error);
        }
        if !infeasible_areas.is_empty() {
            infeasible_areas.sort();
            return Err(SynthError::NoFeasibleRecords {
                areas: infeasible_areas,
            });
        }

        assignments.flush()?;
        aggregates.flush()?;

        let summary = RunSummary {
            areas: written,
            workers,
            elapsed: started.elapsed(),
        };
        info!(
            areas = summary.areas,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "population synthesis complete"
        );
        Ok(summary)
    }
}

fn write_result<A, G>(
    assignments: &mut A,
    aggregates: &mut G,
    outcome: &AnnealOutcome,
) -> std::io::Result<()>
where
    A: AssignmentSink,
    G: AggregateSink,
{
    let result = &outcome.result;
    for record_id in &result.record_ids {
        assignments.write_row(&result.area, record_id)?;
    }
    aggregates.write_row(&result.area, &result.totals)
}

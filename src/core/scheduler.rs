use crate::core::radials::RadialTable;
use crate::core::sweep::{sweep_radial, sweep_sector, SweepContext};
use crate::types::SightResult;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Work-unit size for the sweep jobs
///
/// Sector jobs run all radials of one octant in a single unit; radial
/// jobs are finer-grained and balance better across many short radials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobGranularity {
    Sector,
    Radial,
}

/// Drive the sweep over every included sector of the radial table
///
/// One worker thread (or a build without the `parallel` feature) runs
/// the nested loops inline with no pool. Otherwise the jobs go through a
/// rayon pool sized by `threads` (0 = autodetect) and this call blocks
/// until the pool has drained. Each job owns its radials exclusively;
/// the only cross-job state is the output buffer inside the context.
///
/// The abort flag is polled between work units. An aborted run leaves
/// the buffer partially painted; it is the caller's decision whether to
/// keep it.
pub fn run_sweep(
    ctx: &SweepContext<'_>,
    table: &mut RadialTable,
    granularity: JobGranularity,
    threads: usize,
    abort: &AtomicBool,
) -> SightResult<()> {
    let sectors = table.sectors.iter().filter(|s| s.is_some()).count();
    log::info!(
        "Sweeping {} sectors ({:?} granularity, {} threads)",
        sectors,
        granularity,
        if threads == 0 { num_default_threads() } else { threads }
    );

    if threads == 1 {
        run_inline(ctx, table, granularity, abort);
        return Ok(());
    }

    run_pooled(ctx, table, granularity, threads, abort)
}

#[cfg(feature = "parallel")]
fn num_default_threads() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
fn num_default_threads() -> usize {
    1
}

/// Inline single-threaded mode: iterate sectors, then radials, no queue
fn run_inline(
    ctx: &SweepContext<'_>,
    table: &mut RadialTable,
    granularity: JobGranularity,
    abort: &AtomicBool,
) {
    'sectors: for (sector, slot) in table.sectors.iter_mut().enumerate() {
        if abort.load(Ordering::Relaxed) {
            log::warn!("Sweep aborted before sector {}", sector);
            break;
        }
        let Some(radials) = slot else { continue };
        match granularity {
            JobGranularity::Sector => sweep_sector(ctx, sector, radials),
            JobGranularity::Radial => {
                for radial in radials.iter_mut() {
                    if abort.load(Ordering::Relaxed) {
                        log::warn!("Sweep aborted inside sector {}", sector);
                        break 'sectors;
                    }
                    sweep_radial(ctx, sector, radial);
                }
            }
        }
    }
}

/// Pooled mode: one rayon task per work unit, blocking join on drain
#[cfg(feature = "parallel")]
fn run_pooled(
    ctx: &SweepContext<'_>,
    table: &mut RadialTable,
    granularity: JobGranularity,
    threads: usize,
    abort: &AtomicBool,
) -> SightResult<()> {
    use crate::types::SightError;
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SightError::Processing(format!("Failed to build worker pool: {}", e)))?;

    pool.install(|| match granularity {
        JobGranularity::Sector => {
            table
                .sectors
                .par_iter_mut()
                .enumerate()
                .for_each(|(sector, slot)| {
                    if abort.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(radials) = slot {
                        sweep_sector(ctx, sector, radials);
                    }
                });
        }
        JobGranularity::Radial => {
            table
                .sectors
                .par_iter_mut()
                .enumerate()
                .for_each(|(sector, slot)| {
                    if let Some(radials) = slot {
                        radials.par_iter_mut().for_each(|radial| {
                            if abort.load(Ordering::Relaxed) {
                                return;
                            }
                            sweep_radial(ctx, sector, radial);
                        });
                    }
                });
        }
    });

    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn run_pooled(
    ctx: &SweepContext<'_>,
    table: &mut RadialTable,
    granularity: JobGranularity,
    _threads: usize,
    abort: &AtomicBool,
) -> SightResult<()> {
    // Fall back to inline processing when the pool is compiled out
    run_inline(ctx, table, granularity, abort);
    Ok(())
}

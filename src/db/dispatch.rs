//! Concurrent fan-out of partition-scoped scans.
//!
//! Both modes run a fixed number of scoped worker threads that pull units of
//! work (ranges, or whole partitions when paginating) from a shared index and
//! are joined before returning. Results and bookkeeping are accumulated under
//! a single mutex.

use super::scanner::RangeScanner;
use crate::cancel::CancellationToken;
use crate::config::ScanErrorPolicy;
use crate::error::{GeoKvError, Result};
use crate::storage::{GeoStore, Item};
use crate::types::{GeoHashRange, PartitionRange};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Where a paginated query resumes inside one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionCursor {
    /// Lower bound of the partition range to resume.
    pub range_min: u64,
    /// Store continuation token within that range; `None` starts at its beginning.
    pub exclusive_start_key: Option<Item>,
}

/// Per-partition resume state of a paginated query.
///
/// A missing partition starts fresh, `Some(cursor)` resumes, and `None`
/// marks a partition that is fully drained.
pub type ResumeMap = BTreeMap<u64, Option<PartitionCursor>>;

/// Work done by one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStats {
    /// Cells in the covering.
    pub cells: usize,
    /// Partition-scoped ranges derived from the covering.
    pub ranges: usize,
    /// Distinct partitions touched by those ranges.
    pub partitions: usize,
    /// Range scans issued.
    pub scans: usize,
    /// Store pages read.
    pub pages: usize,
    /// Scans cut short by a store error under the best-effort policy.
    pub failed_scans: usize,
}

impl QueryStats {
    /// Some scan failed and the result may be incomplete.
    pub fn is_partial(&self) -> bool {
        self.failed_scans > 0
    }
}

#[derive(Default)]
struct Accumulator {
    items: Vec<Item>,
    next: ResumeMap,
    scans: usize,
    pages: usize,
    failed_scans: usize,
    error: Option<GeoKvError>,
}

impl Accumulator {
    fn record_error(&mut self, error: GeoKvError, fan_out: &CancellationToken) {
        self.error.get_or_insert(error);
        fan_out.cancel();
    }
}

#[derive(Debug)]
pub(crate) struct FanOut {
    pub items: Vec<Item>,
    pub stats: QueryStats,
}

#[derive(Debug)]
pub(crate) struct PaginatedFanOut {
    pub items: Vec<Item>,
    pub next: ResumeMap,
    pub stats: QueryStats,
}

fn partition_count(ranges: &[PartitionRange]) -> usize {
    ranges
        .iter()
        .map(|range| range.hash_key)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Run `work` on every element of `units` using at most `workers` threads.
///
/// Workers stop taking new units once `token` fires.
fn run_pooled<T: Sync>(
    units: &[T],
    workers: usize,
    token: &CancellationToken,
    work: impl Fn(&T) + Sync,
) {
    if units.is_empty() {
        return;
    }
    let workers = workers.clamp(1, units.len());
    let next = AtomicUsize::new(0);
    debug!("Fanning out {} units over {} workers", units.len(), workers);

    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| {
                while !token.is_cancelled() {
                    let Some(unit) = units.get(next.fetch_add(1, Ordering::Relaxed)) else {
                        break;
                    };
                    work(unit);
                }
            });
        }
    });
}

/// Scan every range to exhaustion on at most `workers` threads.
pub(crate) fn fan_out<S: GeoStore + ?Sized>(
    scanner: &RangeScanner<'_, S>,
    ranges: &[PartitionRange],
    policy: ScanErrorPolicy,
    workers: usize,
) -> Result<FanOut> {
    let caller = scanner.cancel_token();
    let token = caller.child_token();
    let scanner = scanner.with_cancel(&token);
    let acc = Mutex::new(Accumulator::default());

    run_pooled(ranges, workers, &token, |range| {
        let result = scanner.scan(range, None, None);
        let mut acc = acc.lock();
        acc.scans += 1;
        match result {
            Ok(outcome) => {
                acc.pages += outcome.pages.len();
                if outcome.failed {
                    acc.failed_scans += 1;
                }
                acc.items.extend(outcome.into_items());
            }
            Err(e) => acc.record_error(e, &token),
        }
    });

    let acc = acc.into_inner();
    finish(caller, policy, acc.error)?;

    Ok(FanOut {
        items: acc.items,
        stats: QueryStats {
            ranges: ranges.len(),
            partitions: partition_count(ranges),
            scans: acc.scans,
            pages: acc.pages,
            failed_scans: acc.failed_scans,
            ..QueryStats::default()
        },
    })
}

/// Read at most `page_budget` pages per partition, resuming from `resume`.
///
/// Each partition's ranges are walked in ascending order by one worker that
/// shares the page budget across them; at most `workers` partitions are
/// walked at once.
pub(crate) fn fan_out_paginated<S: GeoStore + ?Sized>(
    scanner: &RangeScanner<'_, S>,
    ranges: &[PartitionRange],
    resume: &ResumeMap,
    page_budget: usize,
    policy: ScanErrorPolicy,
    workers: usize,
) -> Result<PaginatedFanOut> {
    let mut partitions: BTreeMap<u64, Vec<GeoHashRange>> = BTreeMap::new();
    for range in ranges {
        partitions.entry(range.hash_key).or_default().push(range.range);
    }
    for list in partitions.values_mut() {
        list.sort_unstable();
        list.dedup();
    }

    let caller = scanner.cancel_token();
    let token = caller.child_token();
    let scanner = scanner.with_cancel(&token);

    // Drained partitions stay drained.
    let drained = resume
        .iter()
        .filter(|(_, cursor)| cursor.is_none())
        .map(|(hash_key, _)| (*hash_key, None))
        .collect();
    let acc = Mutex::new(Accumulator {
        next: drained,
        ..Accumulator::default()
    });

    let pending: Vec<_> = partitions
        .iter()
        .filter_map(|(hash_key, list)| {
            let start = match (resume.get(hash_key), list.first()) {
                (Some(None), _) | (None, None) => return None,
                (Some(Some(cursor)), _) => cursor.clone(),
                (None, Some(first)) => PartitionCursor {
                    range_min: first.range_min,
                    exclusive_start_key: None,
                },
            };
            Some((*hash_key, list.as_slice(), start))
        })
        .collect();

    run_pooled(&pending, workers, &token, |(hash_key, list, start)| {
        walk_partition(
            &scanner,
            *hash_key,
            list,
            start.clone(),
            page_budget,
            &acc,
            &token,
        )
    });

    let acc = acc.into_inner();
    finish(caller, policy, acc.error)?;

    Ok(PaginatedFanOut {
        items: acc.items,
        next: acc.next,
        stats: QueryStats {
            ranges: ranges.len(),
            partitions: partitions.len(),
            scans: acc.scans,
            pages: acc.pages,
            failed_scans: acc.failed_scans,
            ..QueryStats::default()
        },
    })
}

fn walk_partition<S: GeoStore + ?Sized>(
    scanner: &RangeScanner<'_, S>,
    hash_key: u64,
    ranges: &[GeoHashRange],
    start: PartitionCursor,
    page_budget: usize,
    acc: &Mutex<Accumulator>,
    token: &CancellationToken,
) {
    // Resume at the cursor's range, or at the first range not yet passed.
    let mut idx = ranges
        .iter()
        .position(|range| range.range_max >= start.range_min)
        .unwrap_or(ranges.len());
    let mut start_key = match ranges.get(idx) {
        Some(range) if range.range_min == start.range_min => start.exclusive_start_key,
        _ => None,
    };
    let mut remaining = page_budget;
    let mut items = Vec::new();
    let (mut scans, mut pages) = (0, 0);

    let cursor = loop {
        let Some(range) = ranges.get(idx) else {
            break None;
        };
        let partition_range = PartitionRange {
            hash_key,
            range: *range,
        };
        scans += 1;
        let outcome = match scanner.scan(&partition_range, start_key.clone(), Some(remaining)) {
            Ok(outcome) => outcome,
            Err(e) => {
                let mut acc = acc.lock();
                acc.scans += scans;
                acc.pages += pages;
                acc.record_error(e, token);
                return;
            }
        };

        pages += outcome.pages.len();
        remaining = remaining.saturating_sub(outcome.pages.len());

        if outcome.failed {
            let key = outcome.last_evaluated_key().cloned().or(start_key);
            items.extend(outcome.into_items());
            let mut acc = acc.lock();
            acc.failed_scans += 1;
            let cursor = PartitionCursor {
                range_min: range.range_min,
                exclusive_start_key: key,
            };
            break_with(acc, hash_key, scans, pages, items, Some(cursor));
            return;
        }

        let next_key = outcome.last_evaluated_key().cloned();
        items.extend(outcome.into_items());

        if let Some(key) = next_key {
            break Some(PartitionCursor {
                range_min: range.range_min,
                exclusive_start_key: Some(key),
            });
        }

        idx += 1;
        start_key = None;
        match ranges.get(idx) {
            None => break None,
            Some(next) if remaining == 0 => {
                break Some(PartitionCursor {
                    range_min: next.range_min,
                    exclusive_start_key: None,
                });
            }
            Some(_) => {}
        }
    };

    break_with(acc.lock(), hash_key, scans, pages, items, cursor);
}

fn break_with(
    mut acc: parking_lot::MutexGuard<'_, Accumulator>,
    hash_key: u64,
    scans: usize,
    pages: usize,
    items: Vec<Item>,
    cursor: Option<PartitionCursor>,
) {
    debug!(
        "Partition {} paused after {} scans, {} pages, {} items (drained: {})",
        hash_key,
        scans,
        pages,
        items.len(),
        cursor.is_none()
    );
    acc.scans += scans;
    acc.pages += pages;
    acc.items.extend(items);
    acc.next.insert(hash_key, cursor);
}

fn finish(
    caller: &CancellationToken,
    policy: ScanErrorPolicy,
    error: Option<GeoKvError>,
) -> Result<()> {
    if caller.is_cancelled() {
        warn!("Query cancelled; discarding partial results");
        return Err(GeoKvError::Cancelled);
    }
    match error {
        Some(e) => {
            debug!("Fan-out aborted under {:?}: {}", policy, e);
            Err(e)
        }
        None => Ok(()),
    }
}

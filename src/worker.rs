//! `WorkerSet`: a fixed pool of workers draining the job queue, invoking
//! matchers, racing each invocation against its deadline, and re-projecting
//! match offsets before delivering the outcome to the per-check aggregator.

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PoolError;
use crate::queue::JobQueueReceiver;
use crate::transform::reproject_offset;
use crate::types::{Job, RuleMatch, TextRange};

/// Spawns `worker_count` tasks sharing one receiver. Each worker takes a
/// job, arms the deadline, invokes the matcher (as its own detached task so
/// a timeout never forcibly interrupts it), and delivers the outcome.
///
/// Returns the workers' join handles so the pool can keep them alive for its
/// own lifetime and abort them on shutdown.
pub(crate) fn spawn(worker_count: usize, receiver: JobQueueReceiver) -> Vec<JoinHandle<()>> {
    let receiver = Arc::new(AsyncMutex::new(receiver));
    (0..worker_count)
        .map(|idx| {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(worker_loop(idx, receiver))
        })
        .collect()
}

async fn worker_loop(idx: usize, receiver: Arc<AsyncMutex<JobQueueReceiver>>) {
    loop {
        let job = {
            let mut guard = receiver.lock().await;
            guard.recv().await
        };
        let Some(job) = job else {
            debug!(worker = idx, "job queue closed, worker exiting");
            return;
        };
        run_job(job).await;
    }
}

async fn run_job(job: Job) {
    let Job {
        check_id,
        matcher,
        request,
        deadline,
        timeout_duration,
        skip_ranges_by_block,
        response_tx,
        ..
    } = job;

    // Each block in a request keeps its own elided coordinate space, so a
    // match must be re-projected using only the skip ranges of the block it
    // actually falls within, not every block's ranges flattened together.
    let block_ranges: Vec<(usize, usize, Vec<TextRange>)> = request
        .blocks
        .iter()
        .map(|b| {
            (
                b.from,
                b.to,
                skip_ranges_by_block.get(&b.id).cloned().unwrap_or_default(),
            )
        })
        .collect();

    let handle = tokio::spawn(async move { matcher.check(request).await });
    let remaining = deadline.saturating_duration_since(std::time::Instant::now());

    let outcome = match tokio::time::timeout(remaining, handle).await {
        Ok(Ok(Ok(matches))) => Ok(reproject_by_block(matches, &block_ranges)),
        Ok(Ok(Err(matcher_err))) => {
            warn!(check_id = %check_id, "matcher failed: {}", matcher_err);
            Err(PoolError::MatcherFailure(matcher_err.to_string()))
        }
        Ok(Err(join_err)) => {
            warn!(check_id = %check_id, "matcher task panicked: {}", join_err);
            Err(PoolError::MatcherFailure(join_err.to_string()))
        }
        Err(_elapsed) => {
            // The JoinHandle is dropped here, not aborted: the spawned
            // matcher task keeps running to completion in the background
            // and its eventual result is simply discarded.
            warn!(check_id = %check_id, "job timed out after {:?}", timeout_duration);
            Err(PoolError::timeout(timeout_duration))
        }
    };

    // The receiver may already be gone (check failed earlier on another
    // job, or the queue was full and this job's result is unwanted); that's
    // a harmless no-op, matching the spec's "results are discarded" clause.
    let _ = response_tx.send(outcome);
}

/// Re-project every match using the skip ranges of the specific block its
/// (elided-coordinate) position falls within. A match that doesn't land in
/// any known block's span is passed through unchanged rather than shifted by
/// a neighboring block's ranges.
fn reproject_by_block(
    matches: Vec<RuleMatch>,
    block_ranges: &[(usize, usize, Vec<TextRange>)],
) -> Vec<RuleMatch> {
    matches
        .into_iter()
        .map(|mut m| {
            if let Some((_, _, ranges)) = block_ranges
                .iter()
                .find(|(from, to, _)| *from <= m.from_pos && m.from_pos <= *to)
            {
                m.from_pos = reproject_offset(m.from_pos, ranges);
                m.to_pos = reproject_offset(m.to_pos, ranges);
            }
            m
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_match(from: usize, to: usize) -> RuleMatch {
        RuleMatch {
            rule: "r".into(),
            from_pos: from,
            to_pos: to,
            matched_text: String::new(),
            match_context: None,
            message: String::new(),
            preceding_text: None,
            subsequent_text: None,
            matcher_type: "mock".into(),
        }
    }

    #[test]
    fn reprojects_each_match_using_only_its_own_blocks_ranges() {
        // Two blocks dispatched in one job (documentPerCategory strategy):
        // b0 = "BDF" (elided from "ABCDEF", skipping (0,0),(2,2),(4,4)) at [0,3)
        // b1 = "XY"  (elided from "XYZ", skipping (103,103)) at [100,102)
        let block_ranges = vec![
            (0, 3, vec![TextRange::new(0, 0), TextRange::new(2, 2), TextRange::new(4, 4)]),
            (100, 102, vec![TextRange::new(103, 103)]),
        ];
        let matches = vec![rule_match(0, 0), rule_match(100, 100)];
        let out = reproject_by_block(matches, &block_ranges);
        // b0's match re-projects using only b0's ranges: 0 -> 1.
        assert_eq!((out[0].from_pos, out[0].to_pos), (1, 1));
        // b1's match must not be shifted by b0's ranges; only b1's own range
        // at 103 applies, which doesn't precede 100, so it's unchanged.
        assert_eq!((out[1].from_pos, out[1].to_pos), (100, 100));
    }
}

/// Continuous drilling interval reconstruction
///
/// Core runs are logged as disjoint (start, end) pairs. Runs that touch or
/// overlap within a small gap tolerance belong to one continuous drilled
/// interval. The resolver merges them and keeps a lookup from every valid
/// run start to its enclosing interval.

use tracing::debug;

use crate::state::data::Interval;
use crate::state::dataset::Dataset;

/// Gap (m) still considered continuous drilling
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Merged intervals plus the start-value lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalIndex {
    /// Ascending, pairwise separated by more than the tolerance
    intervals: Vec<Interval>,
    /// (run start, index into `intervals`), ascending by start, no duplicates
    starts: Vec<(f64, usize)>,
}

impl IntervalIndex {
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Interval for a run start value. Only starts that took part in the
    /// merge resolve; anything else is `None` ("no interval").
    pub fn lookup(&self, start: f64) -> Option<Interval> {
        let key = normalize(start);
        self.starts
            .binary_search_by(|(s, _)| s.total_cmp(&key))
            .ok()
            .map(|pos| self.intervals[self.starts[pos].1])
    }
}

/// Merge raw (start, end) pairs into continuous intervals.
///
/// Pairs with a missing or non-finite value are dropped. Inverted runs
/// (end < start) take part with their start only: they join the interval
/// their start falls in and never extend it, and one that opens an interval
/// opens it at its start. Bounds of a merged interval are the extremes of
/// its runs.
pub fn resolve_intervals<I>(pairs: I, tolerance: f64) -> IntervalIndex
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    let mut dropped = 0usize;
    let mut valid: Vec<(f64, f64)> = pairs
        .into_iter()
        .filter_map(|pair| match pair {
            (Some(s), Some(e)) if s.is_finite() && e.is_finite() => Some((normalize(s), normalize(e))),
            _ => {
                dropped += 1;
                None
            }
        })
        .collect();

    if dropped > 0 {
        debug!("Interval merge skipped {} incomplete runs", dropped);
    }
    if valid.is_empty() {
        return IntervalIndex::default();
    }

    valid.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut intervals = Vec::new();
    let mut current = Interval::new(valid[0].0, valid[0].1.max(valid[0].0));
    for &(start, end) in &valid[1..] {
        if start <= current.end + tolerance {
            current.end = current.end.max(end);
        } else {
            intervals.push(current);
            current = Interval::new(start, end.max(start));
        }
    }
    intervals.push(current);

    // Starts are sorted, so a single forward sweep assigns each one
    let mut starts: Vec<(f64, usize)> = Vec::with_capacity(valid.len());
    let mut idx = 0;
    for &(start, _) in &valid {
        while idx < intervals.len() && intervals[idx].end < start {
            idx += 1;
        }
        let is_new = starts.last().map_or(true, |(s, _)| *s != start);
        if idx < intervals.len() && intervals[idx].contains(start) && is_new {
            starts.push((start, idx));
        }
    }

    debug!("Merged {} runs into {} intervals", valid.len(), intervals.len());
    IntervalIndex { intervals, starts }
}

/// Resolve intervals over a dataset and stamp each record with its interval
pub fn apply_intervals(dataset: Dataset, tolerance: f64) -> (Dataset, IntervalIndex) {
    let index = resolve_intervals(
        dataset.records().iter().map(|r| (r.start, r.end)),
        tolerance,
    );
    let dataset = dataset.map_records(|mut record| {
        record.interval = record.start.and_then(|s| index.lookup(s));
        record
    });
    (dataset, index)
}

/// Fold -0.0 into 0.0 so lookups by value agree with comparisons
fn normalize(value: f64) -> f64 {
    value + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::Record;

    fn pairs(raw: &[(f64, f64)]) -> Vec<(Option<f64>, Option<f64>)> {
        raw.iter().map(|&(s, e)| (Some(s), Some(e))).collect()
    }

    /// Small deterministic generator so property checks stay reproducible
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    fn random_runs(rng: &mut Lcg, count: usize) -> Vec<(f64, f64)> {
        (0..count)
            .map(|_| {
                let start = (rng.next_f64() * 500.0).round() / 100.0;
                let length = (rng.next_f64() * 80.0).round() / 100.0;
                (start, start + length)
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let index = resolve_intervals(Vec::new(), DEFAULT_TOLERANCE);
        assert!(index.is_empty());
        assert_eq!(index.lookup(1.0), None);
    }

    #[test]
    fn test_merges_touching_and_small_gaps() {
        let index = resolve_intervals(
            pairs(&[(1.0, 2.0), (0.0, 1.0), (2.05, 3.0), (5.0, 6.0)]),
            DEFAULT_TOLERANCE,
        );
        assert_eq!(
            index.intervals(),
            &[Interval::new(0.0, 3.0), Interval::new(5.0, 6.0)]
        );
        assert_eq!(index.lookup(2.05), Some(Interval::new(0.0, 3.0)));
        assert_eq!(index.lookup(5.0), Some(Interval::new(5.0, 6.0)));
    }

    #[test]
    fn test_overlap_takes_extremes() {
        let index = resolve_intervals(pairs(&[(0.0, 4.0), (1.0, 2.0), (3.5, 3.8)]), DEFAULT_TOLERANCE);
        assert_eq!(index.intervals(), &[Interval::new(0.0, 4.0)]);
    }

    #[test]
    fn test_gap_beyond_tolerance_splits() {
        let index = resolve_intervals(pairs(&[(0.0, 1.0), (1.2, 2.0)]), DEFAULT_TOLERANCE);
        assert_eq!(index.intervals().len(), 2);
    }

    #[test]
    fn test_invalid_pairs_dropped() {
        let index = resolve_intervals(
            vec![
                (Some(0.0), None),
                (None, Some(1.0)),
                (Some(f64::NAN), Some(1.0)),
                (Some(3.0), Some(f64::INFINITY)),
                (Some(10.0), Some(11.0)),
            ],
            DEFAULT_TOLERANCE,
        );
        assert_eq!(index.intervals(), &[Interval::new(10.0, 11.0)]);
        assert_eq!(index.lookup(0.0), None);
        assert_eq!(index.lookup(3.0), None);
    }

    #[test]
    fn test_inverted_run_maps_by_start() {
        let index = resolve_intervals(pairs(&[(0.0, 2.0), (1.0, 0.5)]), DEFAULT_TOLERANCE);
        assert_eq!(index.intervals(), &[Interval::new(0.0, 2.0)]);
        assert_eq!(index.lookup(1.0), Some(Interval::new(0.0, 2.0)));
    }

    #[test]
    fn test_inverted_run_on_its_own() {
        let index = resolve_intervals(pairs(&[(0.0, 1.0), (5.0, 4.0)]), DEFAULT_TOLERANCE);
        assert_eq!(index.intervals(), &[Interval::new(0.0, 1.0), Interval::new(5.0, 5.0)]);
        assert_eq!(index.lookup(5.0), Some(Interval::new(5.0, 5.0)));
    }

    #[test]
    fn test_unknown_start_is_unmapped() {
        let index = resolve_intervals(pairs(&[(0.0, 1.0)]), DEFAULT_TOLERANCE);
        // Inside the interval but never a run start
        assert_eq!(index.lookup(0.5), None);
        assert_eq!(index.lookup(-0.0), Some(Interval::new(0.0, 1.0)));
    }

    #[test]
    fn test_every_point_in_exactly_one_separated_interval() {
        let mut rng = Lcg(7);
        for _ in 0..200 {
            let count = 1 + (rng.next_f64() * 20.0) as usize;
            let runs = random_runs(&mut rng, count);
            let index = resolve_intervals(pairs(&runs), DEFAULT_TOLERANCE);
            let intervals = index.intervals();

            for &(start, end) in &runs {
                let holders = intervals
                    .iter()
                    .filter(|iv| iv.contains(start) && iv.contains(end))
                    .count();
                assert_eq!(holders, 1, "run {}-{} in {:?}", start, end, intervals);
                assert!(index.lookup(start).is_some());
            }
            for pair in intervals.windows(2) {
                assert!(pair[1].start > pair[0].end + DEFAULT_TOLERANCE);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let mut rng = Lcg(42);
        for _ in 0..200 {
            let runs = random_runs(&mut rng, 12);
            let first = resolve_intervals(pairs(&runs), DEFAULT_TOLERANCE);
            let again = resolve_intervals(
                first.intervals().iter().map(|iv| (Some(iv.start), Some(iv.end))),
                DEFAULT_TOLERANCE,
            );
            assert_eq!(first.intervals(), again.intervals());
        }
    }

    #[test]
    fn test_apply_intervals_stamps_records() {
        let dataset = Dataset::new(vec![
            Record::new(0, Some(1), Some(0.0), Some(1.0)),
            Record::new(1, Some(1), Some(1.0), Some(1.9)),
            Record::new(2, Some(2), None, Some(3.0)),
            Record::new(3, Some(2), Some(4.0), Some(5.0)),
        ]);
        let (dataset, index) = apply_intervals(dataset, DEFAULT_TOLERANCE);
        let records = dataset.records();

        assert_eq!(index.intervals().len(), 2);
        assert_eq!(records[0].interval, Some(Interval::new(0.0, 1.9)));
        assert_eq!(records[1].interval, Some(Interval::new(0.0, 1.9)));
        assert_eq!(records[2].interval, None);
        assert_eq!(records[3].interval, Some(Interval::new(4.0, 5.0)));
    }
}

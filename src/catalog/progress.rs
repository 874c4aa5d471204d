/// Receives the completed fraction in [0, 1], never decreasing within a run
pub trait ProgressSink {
    fn report(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f64) {}
}

/// Fraction after `done` of `total` steps, clamped to [0, 1]
pub fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        (done as f64 / total as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |f: f64| seen.push(f);
            for done in 1..=4 {
                sink.report(fraction(done, 4));
            }
        }
        assert_eq!(seen, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_empty_run_is_complete() {
        assert_eq!(fraction(0, 0), 1.0);
    }
}

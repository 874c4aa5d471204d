/// Depth derivations over the core log: merged drilling intervals and
/// core recovery.

pub mod intervals;
pub mod recovery;

pub use intervals::{apply_intervals, resolve_intervals, IntervalIndex, DEFAULT_TOLERANCE};
pub use recovery::{apply_recovery, recovery_text};

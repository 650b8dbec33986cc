//! Spike rejection policy for analog samples.

use super::history::HistoryBuffer;
use crate::error::ConfigError;

/// Hysteresis-based spike filter.
///
/// A candidate is compared against the newest sample of a full history
/// window. Anything further away than `tolerance` counts as a spike. A run of
/// `reject_limit` consecutive spikes is treated as a genuine step change and
/// the sample that completes the run is admitted anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpikeFilter {
    tolerance: u16,
    reject_limit: u8,
}

impl SpikeFilter {
    /// Build a filter from a tolerance already expressed in raw ADC counts.
    ///
    /// `reject_limit` must be at least 1, otherwise every spike would be
    /// admitted and the filter would do nothing.
    pub const fn new(tolerance: u16, reject_limit: u8) -> Result<Self, ConfigError> {
        if reject_limit == 0 {
            return Err(ConfigError::ZeroRejectLimit);
        }
        Ok(Self {
            tolerance,
            reject_limit,
        })
    }

    /// Build a filter whose tolerance is a voltage margin converted to ADC
    /// counts, see [`tolerance_counts`].
    pub const fn from_margin(
        full_scale: u16,
        margin_mv: u16,
        reference_mv: u16,
        reject_limit: u8,
    ) -> Result<Self, ConfigError> {
        match tolerance_counts(full_scale, margin_mv, reference_mv) {
            Ok(tolerance) => Self::new(tolerance, reject_limit),
            Err(e) => Err(e),
        }
    }

    pub const fn tolerance(&self) -> u16 {
        self.tolerance
    }

    pub const fn reject_limit(&self) -> u8 {
        self.reject_limit
    }

    /// Whether `candidate` is plausible given the history.
    ///
    /// Always true while the window is still filling. Once full, true iff
    /// `last - tolerance <= candidate <= last + tolerance`, both ends inclusive.
    pub fn is_valid<const CAP: usize>(&self, history: &HistoryBuffer<CAP>, candidate: u16) -> bool {
        if !history.is_full() {
            return true;
        }
        let Some(last) = history.last() else {
            return true;
        };
        let last = i32::from(last);
        let tolerance = i32::from(self.tolerance);
        let candidate = i32::from(candidate);
        (last - tolerance..=last + tolerance).contains(&candidate)
    }

    /// Whether a reject streak of `streak` lets the sample into the history.
    pub const fn admits(&self, streak: u8) -> bool {
        streak == 0 || streak >= self.reject_limit
    }
}

/// Convert a millivolt noise margin into raw ADC counts.
///
/// `full_scale * margin_mv / reference_mv`, truncated. With a 12-bit ADC
/// (4095), a 3320 mV reference and a 300 mV margin this gives 370 counts.
pub const fn tolerance_counts(
    full_scale: u16,
    margin_mv: u16,
    reference_mv: u16,
) -> Result<u16, ConfigError> {
    if reference_mv == 0 {
        return Err(ConfigError::ZeroReference);
    }
    let counts = full_scale as u32 * margin_mv as u32 / reference_mv as u32;
    if counts > u16::MAX as u32 {
        return Err(ConfigError::ToleranceOverflow { counts });
    }
    Ok(counts as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_history(last: u16) -> HistoryBuffer<4> {
        let mut history = HistoryBuffer::new();
        for value in [last, last, last, last] {
            history.insert(value);
        }
        history
    }

    #[test]
    fn test_reference_tolerance() {
        assert_eq!(tolerance_counts(4095, 300, 3320), Ok(370));
    }

    #[test]
    fn test_tolerance_rejects_zero_reference() {
        assert_eq!(tolerance_counts(4095, 300, 0), Err(ConfigError::ZeroReference));
    }

    #[test]
    fn test_tolerance_overflow() {
        assert!(matches!(
            tolerance_counts(u16::MAX, 1000, 1),
            Err(ConfigError::ToleranceOverflow { .. })
        ));
    }

    #[test]
    fn test_zero_reject_limit_is_rejected() {
        assert_eq!(SpikeFilter::new(300, 0), Err(ConfigError::ZeroRejectLimit));
    }

    #[test]
    fn test_anything_is_valid_while_filling() {
        let filter = SpikeFilter::new(10, 3).unwrap();
        let mut history = HistoryBuffer::<4>::new();
        assert!(filter.is_valid(&history, 4000));
        history.insert(0);
        history.insert(0);
        history.insert(0);
        assert!(filter.is_valid(&history, 4000));
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let filter = SpikeFilter::new(300, 3).unwrap();
        let history = full_history(2000);

        assert!(filter.is_valid(&history, 1700));
        assert!(filter.is_valid(&history, 2000));
        assert!(filter.is_valid(&history, 2300));
        assert!(!filter.is_valid(&history, 1699));
        assert!(!filter.is_valid(&history, 2301));
    }

    #[test]
    fn test_window_near_zero_does_not_wrap() {
        let filter = SpikeFilter::new(300, 3).unwrap();
        let history = full_history(100);

        assert!(filter.is_valid(&history, 0));
        assert!(filter.is_valid(&history, 400));
        assert!(!filter.is_valid(&history, 401));
    }

    #[test]
    fn test_window_is_measured_from_newest_sample() {
        let filter = SpikeFilter::new(300, 3).unwrap();
        let mut history = HistoryBuffer::<4>::new();
        for value in [0, 0, 0, 3000] {
            history.insert(value);
        }
        assert!(filter.is_valid(&history, 3100));
        assert!(!filter.is_valid(&history, 100));
    }

    #[test]
    fn test_admission_rule() {
        let filter = SpikeFilter::new(300, 3).unwrap();
        assert!(filter.admits(0));
        assert!(!filter.admits(1));
        assert!(!filter.admits(2));
        assert!(filter.admits(3));
        assert!(filter.admits(4));
    }
}

//! Error types for configuration and external collaborators.
//!
//! Table operations never return errors: bounds and inactive-channel
//! violations degrade to neutral values. These types only cover the edges of
//! the system where a collaborator can genuinely fail.

use thiserror_no_std::Error;

/// Rejected [`MonitorConfig`](crate::config::MonitorConfig) values.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("reference voltage must be non-zero")]
    ZeroReference,
    #[error("ADC full scale must be non-zero")]
    ZeroFullScale,
    #[error("reject limit must be at least 1")]
    ZeroRejectLimit,
    #[error("noise margin converts to {counts} counts, beyond the sample range")]
    ToleranceOverflow { counts: u32 },
    #[error("task '{task}' has a zero period")]
    ZeroPeriod { task: &'static str },
}

/// Failures reported by a sensor driver.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: failed to {operation} ({details})")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
}

/// Failures reported by the wireless link.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    #[error("no peer connected")]
    NotConnected,
    #[error("outgoing queue is full")]
    QueueFull,
}

/// Failures reported by the display.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    #[error("display not available")]
    Unavailable,
    #[error("display rejected frame: {0}")]
    Rejected(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_part() {
        let sensor = SensorError::ReadFailed {
            sensor: "SHT40",
            operation: "measure temperature",
            details: "no acknowledge",
        };
        assert_eq!(
            sensor.to_string(),
            "SHT40: failed to measure temperature (no acknowledge)"
        );
        assert_eq!(
            ConfigError::ZeroPeriod { task: "transmit" }.to_string(),
            "task 'transmit' has a zero period"
        );
        assert_eq!(
            ConfigError::ToleranceOverflow { counts: 70000 }.to_string(),
            "noise margin converts to 70000 counts, beyond the sample range"
        );
        assert_eq!(LinkError::QueueFull.to_string(), "outgoing queue is full");
        assert_eq!(
            DisplayError::Rejected("clear").to_string(),
            "display rejected frame: clear"
        );
    }
}

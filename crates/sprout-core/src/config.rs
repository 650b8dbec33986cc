//! Runtime configuration for the monitor.
//!
//! [`MonitorConfig::default`] is the reference board: 12-bit ADC on a 3.32 V
//! reference, soil probe on GPIO32, alarm LED on GPIO4, solar status on GPIO5.

use serde::{Deserialize, Serialize};

use crate::analog::SpikeFilter;
use crate::error::ConfigError;

/// Scheduling parameters for one periodic workload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTiming {
    /// Scheduler hint, higher runs first.
    pub priority: u8,
    pub period_ms: u32,
}

/// Hardware pin ids.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub humidity_adc: u8,
    pub alarm_led: u8,
    pub solar_input: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            humidity_adc: 32,
            alarm_led: 4,
            solar_input: 5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// Largest raw value the ADC can return.
    pub adc_full_scale: u16,
    pub reference_mv: u16,
    /// Largest sample-to-sample jump, in millivolts, that is not a spike.
    pub noise_margin_mv: u16,
    /// Consecutive spikes after which a sample is admitted as a new baseline.
    pub reject_limit: u8,
    /// The alarm LED lights above this temperature.
    pub alarm_threshold_c: f32,
    pub monitor_task: TaskTiming,
    pub transmit_task: TaskTiming,
    pub pins: PinConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            adc_full_scale: 4095,
            reference_mv: 3320,
            noise_margin_mv: 300,
            reject_limit: 3,
            alarm_threshold_c: 30.0,
            monitor_task: TaskTiming {
                priority: 1,
                period_ms: 1000,
            },
            transmit_task: TaskTiming {
                priority: 2,
                period_ms: 3000,
            },
            pins: PinConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Spike filter derived from the voltage margin and the ADC geometry.
    pub fn spike_filter(&self) -> Result<SpikeFilter, ConfigError> {
        if self.adc_full_scale == 0 {
            return Err(ConfigError::ZeroFullScale);
        }
        SpikeFilter::from_margin(
            self.adc_full_scale,
            self.noise_margin_mv,
            self.reference_mv,
            self.reject_limit,
        )
    }

    /// Check every field a running monitor depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spike_filter()?;
        if self.monitor_task.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod { task: "monitor" });
        }
        if self.transmit_task.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod { task: "transmit" });
        }
        Ok(())
    }

    /// Convert a mean raw reading into percent of full scale.
    pub fn humidity_percent(&self, raw_mean: u16) -> f32 {
        if self.adc_full_scale == 0 {
            return 0.0;
        }
        f32::from(raw_mean) * 100.0 / f32::from(self.adc_full_scale)
    }
}

//! The derived plant reading and the forms it is published in.

use core::cell::Cell;
use core::fmt::{self, Write};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::{String, Vec};
use log::debug;
use serde::{Deserialize, Serialize};

/// Lines on the report display.
pub const REPORT_LINES: usize = 4;

/// Longest line the report display takes.
pub const REPORT_LINE_LEN: usize = 32;

pub type ReportLine = String<REPORT_LINE_LEN>;

/// Solar exposure as reported by the comparator on the solar cell.
///
/// The comparator output is active low: a high input means little light.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolarLevel {
    Low,
    High,
    #[default]
    Unknown,
}

impl SolarLevel {
    /// Interpret the solar input, `None` when it could not be read.
    pub const fn from_input(level: Option<bool>) -> Self {
        match level {
            Some(true) => Self::Low,
            Some(false) => Self::High,
            None => Self::Unknown,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }

    /// Raw input level as sent over the link, `u16::MAX` when unknown.
    pub const fn link_value(&self) -> u16 {
        match self {
            Self::Low => 1,
            Self::High => 0,
            Self::Unknown => u16::MAX,
        }
    }
}

/// Everything the monitor knows about the plant after one cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct PlantReading {
    pub temperature_c: f32,
    /// Filtered probe reading as percent of ADC full scale.
    pub soil_humidity_pct: f32,
    pub solar: SolarLevel,
    pub alarm: bool,
}

impl PlantReading {
    pub const fn new() -> Self {
        Self {
            temperature_c: 0.0,
            soil_humidity_pct: 0.0,
            solar: SolarLevel::Unknown,
            alarm: false,
        }
    }

    /// Text for the report display.
    pub fn report_lines(&self) -> ReportLines {
        let mut lines = ReportLines::default();
        lines.push(format_args!("Smart Plant Monitor"));
        lines.push(format_args!("Temp: {:.2} C", self.temperature_c));
        lines.push(format_args!("Solar intensity {}", self.solar.label()));
        lines.push(format_args!("Sand Humidity: {:.2}%", self.soil_humidity_pct));
        lines
    }

    /// Values for the wireless link, truncated to whole units.
    pub fn link_payload(&self) -> LinkPayload {
        LinkPayload {
            temperature: self.temperature_c as u16,
            humidity: self.soil_humidity_pct as u16,
            solar: self.solar.link_value(),
        }
    }
}

/// Fixed set of short text lines for the display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportLines {
    lines: Vec<ReportLine, REPORT_LINES>,
}

impl ReportLines {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn push(&mut self, args: fmt::Arguments<'_>) {
        let mut line = ReportLine::new();
        if line.write_fmt(args).is_err() {
            debug!("report line truncated: {:?}", line.as_str());
        }
        if self.lines.push(line).is_err() {
            debug!("report is limited to {} lines", REPORT_LINES);
        }
    }
}

impl fmt::Display for ReportLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// One transmission over the wireless link.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPayload {
    /// Whole degrees Celsius.
    pub temperature: u16,
    /// Whole percent.
    pub humidity: u16,
    /// See [`SolarLevel::link_value`].
    pub solar: u16,
}

/// Latest [`PlantReading`], shared between the producing and consuming tasks.
///
/// Readers always get a complete record from a single publish.
pub struct SharedReading {
    inner: Mutex<CriticalSectionRawMutex, Cell<PlantReading>>,
}

impl SharedReading {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(PlantReading::new())),
        }
    }

    pub fn publish(&self, reading: PlantReading) {
        self.inner.lock(|cell| cell.set(reading));
    }

    pub fn snapshot(&self) -> PlantReading {
        self.inner.lock(|cell| cell.get())
    }
}

impl Default for SharedReading {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reading() -> PlantReading {
        PlantReading {
            temperature_c: 24.5,
            soil_humidity_pct: 40.0,
            solar: SolarLevel::Low,
            alarm: false,
        }
    }

    #[test]
    fn test_report_lines() {
        let lines = sample_reading().report_lines();
        let lines: Vec<&str, 4> = lines.iter().collect();
        assert_eq!(
            lines.as_slice(),
            [
                "Smart Plant Monitor",
                "Temp: 24.50 C",
                "Solar intensity Low",
                "Sand Humidity: 40.00%",
            ]
        );
    }

    #[test]
    fn test_oversized_value_is_truncated_not_dropped() {
        let reading = PlantReading {
            temperature_c: 1.0e30,
            ..sample_reading()
        };
        let lines = reading.report_lines();
        assert_eq!(lines.len(), REPORT_LINES);
        assert!(lines.iter().nth(1).unwrap().len() <= REPORT_LINE_LEN);
    }

    #[test]
    fn test_link_payload_truncates() {
        let reading = PlantReading {
            temperature_c: 31.9,
            soil_humidity_pct: 57.99,
            solar: SolarLevel::High,
            alarm: true,
        };
        assert_eq!(
            reading.link_payload(),
            LinkPayload {
                temperature: 31,
                humidity: 57,
                solar: 0,
            }
        );
    }

    #[test]
    fn test_solar_level_from_input() {
        assert_eq!(SolarLevel::from_input(Some(true)), SolarLevel::Low);
        assert_eq!(SolarLevel::from_input(Some(false)), SolarLevel::High);
        assert_eq!(SolarLevel::from_input(None), SolarLevel::Unknown);
        assert_eq!(SolarLevel::Unknown.link_value(), u16::MAX);
    }

    #[test]
    fn test_shared_reading_returns_last_publish() {
        let shared = SharedReading::new();
        assert_eq!(shared.snapshot(), PlantReading::new());

        shared.publish(sample_reading());
        assert_eq!(shared.snapshot(), sample_reading());
    }
}

//! Narrow interfaces to the hardware collaborators.
//!
//! Pin ids are plain numbers: the board layer owns the typed peripherals and
//! maps ids to them. All calls are synchronous and bounded.

use crate::error::{DisplayError, LinkError, SensorError};
use crate::reading::{LinkPayload, ReportLines};

/// Pin id that is never a valid binding.
pub const UNBOUND_PIN: u8 = 0xFF;

/// One-shot analog conversion.
pub trait AnalogInput {
    /// Read one raw sample from `pin`. Assumed to always succeed.
    fn read_raw(&mut self, pin: u8) -> u16;
}

/// Direction of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Input,
    Output,
}

/// Digital pin access by id.
pub trait DigitalIo {
    /// Switch `pin` to `direction`.
    fn configure(&mut self, pin: u8, direction: Direction);
    /// Drive an output pin.
    fn write(&mut self, pin: u8, high: bool);
    /// Sample an input pin.
    fn read(&mut self, pin: u8) -> bool;
}

/// Ambient temperature source.
pub trait TemperatureSensor {
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}

/// Text display for the periodic report.
pub trait ReportDisplay {
    fn show(&mut self, lines: &ReportLines) -> Result<(), DisplayError>;
}

/// Wireless link carrying the derived readings.
pub trait ReadingLink {
    /// Whether a peer is currently listening.
    fn is_connected(&self) -> bool;
    /// Hand one payload to the link for delivery.
    fn transmit(&mut self, payload: &LinkPayload) -> Result<(), LinkError>;
}

//! ESP32 firmware-specific modules for sprout
//!
//! This crate contains the code that cannot compile on desktop targets: the
//! board's ADC and GPIO bindings, the SHT40 driver glue, the LCD report and
//! the BLE link, plus the embassy tasks that run the two workloads.

#![no_std]

pub mod ble;
pub mod board;
pub mod display;
pub mod sensors;
pub mod tasks;

/// Device name advertised over BLE, set at build time.
pub const BLE_NAME: &str = env!("SPROUT_BLE_NAME");

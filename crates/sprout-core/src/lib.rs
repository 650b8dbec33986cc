//! Hardware-independent core library for sprout
//!
//! This crate contains the platform-agnostic logic of the sprout plant
//! monitor: outlier-tolerant analog acquisition, digital channel bindings,
//! the periodic task table, the derived plant reading, its text report and
//! the two workload cycles that tie them together. Hardware is reached
//! through the traits in [`hal`].
//!
//! It is `#![no_std]` so it compiles on both the ESP32 target and desktop
//! hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod analog;
pub mod config;
pub mod digital;
pub mod display;
pub mod error;
pub mod hal;
pub mod monitor;
pub mod reading;
pub mod tasks;

//! Desktop simulator for the sprout plant monitor.
//!
//! Plays the part of the RTOS: every scheduled entry of the task table gets
//! its own thread that wakes at the entry's period. The hardware is replaced
//! by deterministic generators, with electrical glitches and watering steps
//! injected into the soil probe so the spike filter has something to do.
//!
//! # Environment
//!
//! | Variable                  | Field                         |
//! |---------------------------|-------------------------------|
//! | `SPROUT_NOISE_MARGIN_MV`  | spike tolerance in millivolts |
//! | `SPROUT_REJECT_LIMIT`     | spikes before a forced admit  |
//! | `SPROUT_ALARM_C`          | alarm threshold in °C         |
//! | `SPROUT_MONITOR_MS`       | monitor task period           |
//! | `SPROUT_TRANSMIT_MS`      | transmit task period          |
//! | `SPROUT_RUN_SECS`         | stop after this long (0 = run forever) |
//!
//! Set `RUST_LOG=debug` to see the channel dump on every cycle.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use sprout_core::analog::AcquisitionOutcome;
use sprout_core::config::MonitorConfig;
use sprout_core::error::{DisplayError, LinkError, SensorError};
use sprout_core::hal::{
    AnalogInput, DigitalIo, Direction, ReadingLink, ReportDisplay, TemperatureSensor,
};
use sprout_core::monitor::{Monitor, transmit_cycle};
use sprout_core::reading::{LinkPayload, ReportLines, SharedReading};
use sprout_core::tasks::{ScheduledTask, Workload, build_task_table};

/// Latest reading, written by the monitor thread and read by the transmit thread.
static SHARED: SharedReading = SharedReading::new();

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Every n-th probe sample is a single-sample electrical spike.
const GLITCH_EVERY: u64 = 11;

/// Watering cycle length in samples, and how many of them read wet.
const WATERING_EVERY: u64 = 60;
const WATERING_SAMPLES: u64 = 20;

/// Every n-th temperature read fails.
const THERMOMETER_FAIL_EVERY: u64 = 23;

/// Soil probe on the ADC: slow drift, some noise, spikes and watering steps.
struct SimulatedProbe {
    pin: u8,
    full_scale: u16,
    samples: u64,
}

impl SimulatedProbe {
    fn new(pin: u8, full_scale: u16) -> Self {
        Self {
            pin,
            full_scale,
            samples: 0,
        }
    }
}

impl AnalogInput for SimulatedProbe {
    fn read_raw(&mut self, pin: u8) -> u16 {
        if pin != self.pin {
            warn!("ADC read on unwired pin {}", pin);
            return 0;
        }
        self.samples += 1;
        let t = self.samples as f64;

        let mut value = 1600.0 + 250.0 * (t / 90.0).sin() + 20.0 * (t / 7.0).cos();
        if self.samples % WATERING_EVERY >= WATERING_EVERY - WATERING_SAMPLES {
            value += 900.0;
        }
        if self.samples % GLITCH_EVERY == 0 {
            value += 1800.0;
        }
        value.clamp(0.0, f64::from(self.full_scale)) as u16
    }
}

/// Air temperature drifting across the alarm threshold.
struct SimulatedThermometer {
    reads: u64,
}

impl TemperatureSensor for SimulatedThermometer {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.reads += 1;
        if self.reads % THERMOMETER_FAIL_EVERY == 0 {
            return Err(SensorError::ReadFailed {
                sensor: "sim-thermometer",
                operation: "read temperature",
                details: "no acknowledge",
            });
        }
        let t = self.reads as f64;
        Ok((27.0 + 4.0 * (t / 45.0).sin()) as f32)
    }
}

/// GPIO bank: logs LED changes, toggles the solar input every 20 reads.
struct SimulatedGpio {
    directions: HashMap<u8, Direction>,
    levels: HashMap<u8, bool>,
    reads: u64,
}

impl SimulatedGpio {
    fn new() -> Self {
        Self {
            directions: HashMap::new(),
            levels: HashMap::new(),
            reads: 0,
        }
    }
}

impl DigitalIo for SimulatedGpio {
    fn configure(&mut self, pin: u8, direction: Direction) {
        info!("GPIO{} configured as {:?}", pin, direction);
        self.directions.insert(pin, direction);
    }

    fn write(&mut self, pin: u8, high: bool) {
        if self.directions.get(&pin) != Some(&Direction::Output) {
            warn!("GPIO{} written while not an output", pin);
        }
        let previous = self.levels.insert(pin, high);
        if previous != Some(high) {
            info!("GPIO{} -> {}", pin, if high { "high" } else { "low" });
        }
    }

    fn read(&mut self, pin: u8) -> bool {
        self.reads += 1;
        let level = (self.reads / 20) % 2 == 0;
        self.levels.insert(pin, level);
        level
    }
}

/// Prints the report instead of drawing it.
struct LogDisplay;

impl ReportDisplay for LogDisplay {
    fn show(&mut self, lines: &ReportLines) -> Result<(), DisplayError> {
        info!("display: {}", lines);
        Ok(())
    }
}

/// Link whose peer drops out for two out of every ten transmit cycles.
struct SimulatedLink {
    cycles: u64,
}

impl SimulatedLink {
    fn tick(&mut self) {
        self.cycles += 1;
    }
}

impl ReadingLink for SimulatedLink {
    fn is_connected(&self) -> bool {
        self.cycles % 10 >= 2
    }

    fn transmit(&mut self, payload: &LinkPayload) -> Result<(), LinkError> {
        info!(
            "link notify: temperature {} C, humidity {} %, solar {}",
            payload.temperature, payload.humidity, payload.solar
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Replace `field` with the parsed value of `key`, if set.
fn override_from_env<T>(key: &str, field: &mut T)
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = std::env::var(key) else {
        return;
    };
    match raw.parse() {
        Ok(value) => {
            info!("{} = {}", key, value);
            *field = value;
        }
        Err(e) => warn!("ignoring {}={:?}: {}", key, raw, e),
    }
}

fn config_from_env() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    override_from_env("SPROUT_NOISE_MARGIN_MV", &mut config.noise_margin_mv);
    override_from_env("SPROUT_REJECT_LIMIT", &mut config.reject_limit);
    override_from_env("SPROUT_ALARM_C", &mut config.alarm_threshold_c);
    override_from_env("SPROUT_MONITOR_MS", &mut config.monitor_task.period_ms);
    override_from_env("SPROUT_TRANSMIT_MS", &mut config.transmit_task.period_ms);
    config
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Everything the monitor thread owns.
struct MonitorTask {
    monitor: Monitor,
    thermometer: SimulatedThermometer,
    probe: SimulatedProbe,
    gpio: SimulatedGpio,
    display: LogDisplay,
}

impl MonitorTask {
    fn run_cycle(&mut self) {
        let report = self.monitor.cycle(
            &mut self.thermometer,
            &mut self.probe,
            &mut self.gpio,
            &mut self.display,
            &SHARED,
        );
        match report.humidity {
            AcquisitionOutcome::Dropped { sample, streak } => {
                info!("probe spike {} dropped (streak {})", sample, streak)
            }
            AcquisitionOutcome::ForcedAdmit { sample, mean, .. } => {
                info!("probe stepped to {}, mean now {}", sample, mean)
            }
            AcquisitionOutcome::Accepted { .. } | AcquisitionOutcome::Skipped => {}
        }
    }
}

/// Call `body` every `period` until `deadline`, catching up on overruns
/// instead of bursting.
fn run_periodic(period: Duration, deadline: Option<Instant>, mut body: impl FnMut()) {
    let mut next_wake = Instant::now();
    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        body();

        next_wake += period;
        let now = Instant::now();
        if next_wake > now {
            thread::sleep(next_wake - now);
        } else {
            next_wake = now;
        }
    }
}

fn spawn_task(
    task: ScheduledTask<Workload>,
    deadline: Option<Instant>,
    body: impl FnMut() + Send + 'static,
) -> Option<JoinHandle<()>> {
    let period = Duration::from_millis(u64::from(task.period_ms));
    info!(
        "starting task {} '{}' every {:?} (priority hint {})",
        task.index,
        task.work.name(),
        period,
        task.priority
    );
    thread::Builder::new()
        .name(task.work.name().into())
        .spawn(move || run_periodic(period, deadline, body))
        .inspect_err(|e| error!("failed to spawn task '{}': {}", task.work.name(), e))
        .ok()
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting sprout simulator");

    let config = config_from_env();
    let tasks = match build_task_table(&config) {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut gpio = SimulatedGpio::new();
    let monitor = match Monitor::new(config, &mut gpio) {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut run_secs: u64 = 0;
    override_from_env("SPROUT_RUN_SECS", &mut run_secs);
    let deadline = (run_secs > 0).then(|| Instant::now() + Duration::from_secs(run_secs));

    let mut monitor_task = Some(MonitorTask {
        monitor,
        thermometer: SimulatedThermometer { reads: 0 },
        probe: SimulatedProbe::new(config.pins.humidity_adc, config.adc_full_scale),
        gpio,
        display: LogDisplay,
    });
    let mut link = Some(SimulatedLink { cycles: 0 });

    let mut handles = Vec::new();
    for task in tasks.scheduled() {
        let handle = match task.work {
            Workload::Monitor => {
                let Some(mut state) = monitor_task.take() else {
                    warn!("monitor workload scheduled twice, ignoring task {}", task.index);
                    continue;
                };
                spawn_task(task, deadline, move || state.run_cycle())
            }
            Workload::Transmit => {
                let Some(mut link) = link.take() else {
                    warn!("transmit workload scheduled twice, ignoring task {}", task.index);
                    continue;
                };
                spawn_task(task, deadline, move || {
                    link.tick();
                    transmit_cycle(&mut link, &SHARED);
                })
            }
        };
        handles.extend(handle);
    }

    for handle in handles {
        if handle.join().is_err() {
            error!("task thread panicked");
        }
    }

    info!("Simulator exiting");
}

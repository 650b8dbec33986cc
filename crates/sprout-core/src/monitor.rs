//! The two periodic workloads.
//!
//! [`Monitor::cycle`] is the body of the monitor task and the only writer of
//! the channel tables. [`transmit_cycle`] is the body of the transmit task and
//! only ever reads the published [`SharedReading`].

use log::{debug, trace, warn};

use crate::analog::{AcquisitionOutcome, AnalogTable, HUMIDITY_CHANNEL};
use crate::config::MonitorConfig;
use crate::digital::{ALARM_LED_CHANNEL, BoardDigitalTable, SOLAR_CHANNEL};
use crate::error::ConfigError;
use crate::hal::{AnalogInput, DigitalIo, Direction, ReadingLink, ReportDisplay, TemperatureSensor};
use crate::reading::{PlantReading, SharedReading, SolarLevel};

/// Result of one monitor cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub reading: PlantReading,
    pub humidity: AcquisitionOutcome,
}

/// Owns the channel tables and the working copy of the reading.
#[derive(Debug, Clone)]
pub struct Monitor {
    config: MonitorConfig,
    analog: AnalogTable,
    digital: BoardDigitalTable,
    reading: PlantReading,
}

impl Monitor {
    /// Validate `config`, bind the board's channels and configure the pins.
    pub fn new<IO: DigitalIo>(config: MonitorConfig, io: &mut IO) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut analog = AnalogTable::new(config.spike_filter()?);
        analog.set_pin(HUMIDITY_CHANNEL, config.pins.humidity_adc);

        let mut digital = BoardDigitalTable::new();
        digital.set_pin(ALARM_LED_CHANNEL, config.pins.alarm_led, io);
        digital.set_direction(ALARM_LED_CHANNEL, Direction::Output, io);
        digital.set_value(ALARM_LED_CHANNEL, false, io);
        digital.set_pin(SOLAR_CHANNEL, config.pins.solar_input, io);
        digital.set_direction(SOLAR_CHANNEL, Direction::Input, io);

        debug!(
            "monitor ready: tolerance {} counts, reject limit {}",
            analog.filter().tolerance(),
            analog.filter().reject_limit()
        );

        Ok(Self {
            config,
            analog,
            digital,
            reading: PlantReading::new(),
        })
    }

    pub fn analog(&self) -> &AnalogTable {
        &self.analog
    }

    pub fn analog_mut(&mut self) -> &mut AnalogTable {
        &mut self.analog
    }

    /// Run one monitor cycle.
    ///
    /// A failing temperature sensor keeps the previous temperature, a failing
    /// display only costs the frame. Neither stops the cycle.
    pub fn cycle<T, A, IO, D>(
        &mut self,
        thermometer: &mut T,
        adc: &mut A,
        io: &mut IO,
        display: &mut D,
        shared: &SharedReading,
    ) -> CycleReport
    where
        T: TemperatureSensor,
        A: AnalogInput,
        IO: DigitalIo,
        D: ReportDisplay,
    {
        match thermometer.read_celsius() {
            Ok(celsius) => self.reading.temperature_c = celsius,
            Err(e) => warn!(
                "temperature read failed, keeping {:.2} C: {}",
                self.reading.temperature_c, e
            ),
        }

        self.reading.solar = SolarLevel::from_input(self.digital.read(SOLAR_CHANNEL, io));

        let humidity = self.analog.acquire(HUMIDITY_CHANNEL, adc);
        let mean = self.analog.cached_mean(HUMIDITY_CHANNEL);
        self.reading.soil_humidity_pct = self.config.humidity_percent(mean);
        if let Some(report) = self.analog.describe(HUMIDITY_CHANNEL) {
            debug!("{}", report);
        }

        self.reading.alarm = self.reading.temperature_c > self.config.alarm_threshold_c;
        self.digital.set_value(ALARM_LED_CHANNEL, self.reading.alarm, io);

        shared.publish(self.reading);

        if let Err(e) = display.show(&self.reading.report_lines()) {
            warn!("display update failed: {}", e);
        }

        trace!("monitor cycle: {:?}", self.reading);
        CycleReport {
            reading: self.reading,
            humidity,
        }
    }
}

/// Run one transmit cycle: send the latest snapshot if a peer is listening.
///
/// Returns whether the payload was handed to the link.
pub fn transmit_cycle<L: ReadingLink>(link: &mut L, shared: &SharedReading) -> bool {
    if !link.is_connected() {
        trace!("transmit cycle: no peer");
        return false;
    }

    let payload = shared.snapshot().link_payload();
    match link.transmit(&payload) {
        Ok(()) => {
            trace!("transmit cycle: sent {:?}", payload);
            true
        }
        Err(e) => {
            warn!("transmit failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DisplayError, LinkError, SensorError};
    use crate::reading::{LinkPayload, ReportLines};

    const HUMIDITY_PIN: u8 = 32;
    const LED_PIN: u8 = 4;
    const SOLAR_PIN: u8 = 5;

    struct ScriptedThermometer {
        readings: Vec<Result<f32, SensorError>>,
    }

    impl TemperatureSensor for ScriptedThermometer {
        fn read_celsius(&mut self) -> Result<f32, SensorError> {
            if self.readings.is_empty() {
                return Err(SensorError::ReadFailed {
                    sensor: "test",
                    operation: "read",
                    details: "script exhausted",
                });
            }
            self.readings.remove(0)
        }
    }

    struct FixedAdc(u16);

    impl AnalogInput for FixedAdc {
        fn read_raw(&mut self, pin: u8) -> u16 {
            assert_eq!(pin, HUMIDITY_PIN);
            self.0
        }
    }

    #[derive(Default)]
    struct BoardIo {
        solar_input: bool,
        led: Option<bool>,
        configured: Vec<(u8, Direction)>,
    }

    impl DigitalIo for BoardIo {
        fn configure(&mut self, pin: u8, direction: Direction) {
            self.configured.push((pin, direction));
        }

        fn write(&mut self, pin: u8, high: bool) {
            assert_eq!(pin, LED_PIN);
            self.led = Some(high);
        }

        fn read(&mut self, pin: u8) -> bool {
            assert_eq!(pin, SOLAR_PIN);
            self.solar_input
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        frames: Vec<ReportLines>,
        fail: bool,
    }

    impl ReportDisplay for RecordingDisplay {
        fn show(&mut self, lines: &ReportLines) -> Result<(), DisplayError> {
            if self.fail {
                return Err(DisplayError::Unavailable);
            }
            self.frames.push(lines.clone());
            Ok(())
        }
    }

    struct RecordingLink {
        connected: bool,
        reject: bool,
        sent: Vec<LinkPayload>,
    }

    impl ReadingLink for RecordingLink {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn transmit(&mut self, payload: &LinkPayload) -> Result<(), LinkError> {
            if self.reject {
                return Err(LinkError::QueueFull);
            }
            self.sent.push(*payload);
            Ok(())
        }
    }

    fn thermometer(readings: &[Result<f32, SensorError>]) -> ScriptedThermometer {
        ScriptedThermometer {
            readings: readings.to_vec(),
        }
    }

    fn monitor(io: &mut BoardIo) -> Monitor {
        Monitor::new(MonitorConfig::default(), io).unwrap()
    }

    #[test]
    fn test_new_configures_board_pins() {
        let mut io = BoardIo::default();
        let monitor = monitor(&mut io);

        assert!(io.configured.contains(&(LED_PIN, Direction::Output)));
        assert_eq!(io.configured.last(), Some(&(SOLAR_PIN, Direction::Input)));
        assert_eq!(io.led, Some(false));
        assert_eq!(
            monitor.analog().descriptor(HUMIDITY_CHANNEL).and_then(|d| d.pin()),
            Some(HUMIDITY_PIN)
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut io = BoardIo::default();
        let config = MonitorConfig {
            reject_limit: 0,
            ..MonitorConfig::default()
        };
        assert_eq!(
            Monitor::new(config, &mut io).err(),
            Some(ConfigError::ZeroRejectLimit)
        );
    }

    #[test]
    fn test_cycle_publishes_reading_and_report() {
        let mut io = BoardIo {
            solar_input: true,
            ..Default::default()
        };
        let mut monitor = monitor(&mut io);
        let shared = SharedReading::new();
        let mut display = RecordingDisplay::default();

        let report = monitor.cycle(
            &mut thermometer(&[Ok(24.5)]),
            &mut FixedAdc(1638),
            &mut io,
            &mut display,
            &shared,
        );

        assert!(report.humidity.admitted());
        assert_eq!(report.reading.temperature_c, 24.5);
        assert!((report.reading.soil_humidity_pct - 40.0).abs() < 0.01);
        assert_eq!(report.reading.solar, SolarLevel::Low);
        assert!(!report.reading.alarm);
        assert_eq!(io.led, Some(false));
        assert_eq!(shared.snapshot(), report.reading);

        let frame: Vec<&str> = display.frames[0].iter().collect();
        assert_eq!(frame[0], "Smart Plant Monitor");
        assert_eq!(frame[1], "Temp: 24.50 C");
        assert_eq!(frame[2], "Solar intensity Low");
        assert_eq!(frame[3], "Sand Humidity: 40.00%");
    }

    #[test]
    fn test_alarm_follows_threshold() {
        let mut io = BoardIo::default();
        let mut monitor = monitor(&mut io);
        let shared = SharedReading::new();
        let mut display = RecordingDisplay::default();
        let mut sensor = thermometer(&[Ok(30.5), Ok(30.0)]);
        let mut adc = FixedAdc(2000);

        let hot = monitor.cycle(&mut sensor, &mut adc, &mut io, &mut display, &shared);
        assert!(hot.reading.alarm);
        assert_eq!(io.led, Some(true));

        // At the threshold is not above it.
        let edge = monitor.cycle(&mut sensor, &mut adc, &mut io, &mut display, &shared);
        assert!(!edge.reading.alarm);
        assert_eq!(io.led, Some(false));
    }

    #[test]
    fn test_failed_temperature_keeps_previous_value() {
        let mut io = BoardIo::default();
        let mut monitor = monitor(&mut io);
        let shared = SharedReading::new();
        let mut display = RecordingDisplay::default();
        let mut sensor = thermometer(&[Ok(31.0)]);
        let mut adc = FixedAdc(2000);

        monitor.cycle(&mut sensor, &mut adc, &mut io, &mut display, &shared);
        let report = monitor.cycle(&mut sensor, &mut adc, &mut io, &mut display, &shared);

        assert_eq!(report.reading.temperature_c, 31.0);
        assert!(report.reading.alarm);
        assert_eq!(display.frames.len(), 2);
    }

    #[test]
    fn test_display_failure_does_not_stop_publishing() {
        let mut io = BoardIo::default();
        let mut monitor = monitor(&mut io);
        let shared = SharedReading::new();
        let mut display = RecordingDisplay {
            fail: true,
            ..Default::default()
        };

        let report = monitor.cycle(
            &mut thermometer(&[Ok(20.0)]),
            &mut FixedAdc(4095),
            &mut io,
            &mut display,
            &shared,
        );

        assert_eq!(shared.snapshot(), report.reading);
        assert_eq!(shared.snapshot().soil_humidity_pct, 100.0);
    }

    #[test]
    fn test_glitch_does_not_reach_published_humidity() {
        let mut io = BoardIo::default();
        let mut monitor = monitor(&mut io);
        let shared = SharedReading::new();
        let mut display = RecordingDisplay::default();
        let mut sensor = thermometer(&[Ok(20.0); 6]);

        for _ in 0..4 {
            monitor.cycle(&mut sensor, &mut FixedAdc(2000), &mut io, &mut display, &shared);
        }
        let before = shared.snapshot().soil_humidity_pct;

        let report = monitor.cycle(&mut sensor, &mut FixedAdc(4000), &mut io, &mut display, &shared);

        assert_eq!(
            report.humidity,
            AcquisitionOutcome::Dropped {
                sample: 4000,
                streak: 1
            }
        );
        assert_eq!(shared.snapshot().soil_humidity_pct, before);
    }

    #[test]
    fn test_inactive_humidity_channel_is_skipped() {
        let mut io = BoardIo::default();
        let mut monitor = monitor(&mut io);
        monitor.analog_mut().set_active(HUMIDITY_CHANNEL, false);

        let report = monitor.cycle(
            &mut thermometer(&[Ok(20.0)]),
            &mut FixedAdc(2000),
            &mut io,
            &mut RecordingDisplay::default(),
            &SharedReading::new(),
        );

        assert_eq!(report.humidity, AcquisitionOutcome::Skipped);
        assert_eq!(report.reading.soil_humidity_pct, 0.0);
    }

    #[test]
    fn test_transmit_only_when_connected() {
        let shared = SharedReading::new();
        shared.publish(PlantReading {
            temperature_c: 24.5,
            soil_humidity_pct: 40.0,
            solar: SolarLevel::Low,
            alarm: false,
        });
        let mut link = RecordingLink {
            connected: false,
            reject: false,
            sent: Vec::new(),
        };

        assert!(!transmit_cycle(&mut link, &shared));
        assert!(link.sent.is_empty());

        link.connected = true;
        assert!(transmit_cycle(&mut link, &shared));
        assert_eq!(
            link.sent,
            [LinkPayload {
                temperature: 24,
                humidity: 40,
                solar: 1,
            }]
        );
    }

    #[test]
    fn test_transmit_error_is_absorbed() {
        let shared = SharedReading::new();
        let mut link = RecordingLink {
            connected: true,
            reject: true,
            sent: Vec::new(),
        };
        assert!(!transmit_cycle(&mut link, &shared));
    }
}

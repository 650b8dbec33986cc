//! Pin-id access to the board's ADC and GPIO.
//!
//! The core addresses hardware by pin number. The wiring is fixed, so each
//! type here owns the typed esp-hal peripheral for one pin and checks that the
//! requested id matches it.

use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::peripherals::{ADC1, GPIO4, GPIO5, GPIO32};
use esp_hal::Blocking;
use log::warn;

use sprout_core::hal::{AnalogInput, DigitalIo, Direction};

/// GPIO number of the soil probe input.
pub const HUMIDITY_PIN: u8 = 32;
/// GPIO number of the alarm LED.
pub const ALARM_LED_PIN: u8 = 4;
/// GPIO number of the solar comparator output.
pub const SOLAR_PIN: u8 = 5;

/// One-shot conversions on ADC1 for the soil probe.
pub struct BoardAdc {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    probe: AdcPin<GPIO32<'static>, ADC1<'static>>,
}

impl BoardAdc {
    pub fn new(adc1: ADC1<'static>, probe: GPIO32<'static>) -> Self {
        let mut config = AdcConfig::new();
        // 11 dB covers the probe's full 0..3.3 V swing.
        let probe = config.enable_pin(probe, Attenuation::_11dB);
        Self {
            adc: Adc::new(adc1, config),
            probe,
        }
    }
}

impl AnalogInput for BoardAdc {
    fn read_raw(&mut self, pin: u8) -> u16 {
        if pin != HUMIDITY_PIN {
            warn!("ADC read on unwired pin {}", pin);
            return 0;
        }
        match nb::block!(self.adc.read_oneshot(&mut self.probe)) {
            Ok(value) => value,
            Err(e) => {
                warn!("ADC conversion failed: {:?}", e);
                0
            }
        }
    }
}

/// The LED output and the solar input.
pub struct BoardGpio {
    led: Output<'static>,
    solar: Input<'static>,
}

impl BoardGpio {
    pub fn new(led: GPIO4<'static>, solar: GPIO5<'static>) -> Self {
        Self {
            led: Output::new(led, Level::Low, OutputConfig::default()),
            solar: Input::new(solar, InputConfig::default().with_pull(Pull::Up)),
        }
    }
}

impl DigitalIo for BoardGpio {
    fn configure(&mut self, pin: u8, direction: Direction) {
        let wired = match pin {
            ALARM_LED_PIN => Direction::Output,
            SOLAR_PIN => Direction::Input,
            _ => {
                warn!("GPIO{} is not wired on this board", pin);
                return;
            }
        };
        if direction != wired {
            warn!("GPIO{} is wired as {:?}, ignoring {:?}", pin, wired, direction);
        }
    }

    fn write(&mut self, pin: u8, high: bool) {
        if pin != ALARM_LED_PIN {
            warn!("write to GPIO{} ignored", pin);
            return;
        }
        self.led.set_level(Level::from(high));
    }

    fn read(&mut self, pin: u8) -> bool {
        match pin {
            SOLAR_PIN => self.solar.is_high(),
            ALARM_LED_PIN => self.led.is_set_high(),
            _ => {
                warn!("read of GPIO{} ignored", pin);
                false
            }
        }
    }
}

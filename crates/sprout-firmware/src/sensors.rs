use embedded_hal_async::i2c::I2c;
use sht4x::Sht4xAsync;

use sprout_core::error::SensorError;
use sprout_core::hal::TemperatureSensor;

/// SHT40 on the shared I2C bus, used for air temperature only.
pub struct Sht40Thermometer<I> {
    sensor: Sht4xAsync<I, embassy_time::Delay>,
}

impl<I: I2c> Sht40Thermometer<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            sensor: Sht4xAsync::<I, embassy_time::Delay>::new(i2c),
        }
    }

    pub async fn read(&mut self) -> Result<f32, SensorError> {
        let measurement = self
            .sensor
            .measure(sht4x::Precision::High, &mut embassy_time::Delay)
            .await
            .map_err(|e| {
                log::error!("SHT40 measurement failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: "SHT40",
                    operation: "measure temperature",
                    details: "I2C communication error or sensor not responding",
                }
            })?;

        Ok(measurement.temperature_celsius().to_num::<f32>())
    }
}

/// A temperature that was already measured this cycle.
///
/// The SHT40 is read asynchronously before the synchronous monitor cycle
/// runs, which then consumes the result through this adapter.
#[derive(Debug, Clone, Copy)]
pub struct Measured(pub Result<f32, SensorError>);

impl TemperatureSensor for Measured {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.0
    }
}

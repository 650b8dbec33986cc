//! Embassy tasks running the two workloads at their scheduled periods.

use embassy_time::{Duration, Ticker};
use esp_hal::Async;
use esp_hal::i2c::master::I2c;
use log::info;

use sprout_core::monitor::{Monitor, transmit_cycle};
use sprout_core::reading::SharedReading;

use crate::ble::BleLink;
use crate::board::{BoardAdc, BoardGpio};
use crate::display::LcdReport;
use crate::sensors::{Measured, Sht40Thermometer};

/// Latest reading, published by the monitor task and read by the transmit task.
pub static SHARED_READING: SharedReading = SharedReading::new();

/// Everything the monitor task owns.
pub struct MonitorResources {
    pub monitor: Monitor,
    pub thermometer: Sht40Thermometer<I2c<'static, Async>>,
    pub adc: BoardAdc,
    pub gpio: BoardGpio,
    pub display: LcdReport,
}

#[embassy_executor::task]
pub async fn monitor_task(mut res: MonitorResources, period: Duration) {
    info!("monitor task running every {} ms", period.as_millis());
    let mut ticker = Ticker::every(period);
    loop {
        let mut temperature = Measured(res.thermometer.read().await);
        res.monitor.cycle(
            &mut temperature,
            &mut res.adc,
            &mut res.gpio,
            &mut res.display,
            &SHARED_READING,
        );
        ticker.next().await;
    }
}

#[embassy_executor::task]
pub async fn transmit_task(mut link: BleLink, period: Duration) {
    info!("transmit task running every {} ms", period.as_millis());
    let mut ticker = Ticker::every(period);
    loop {
        transmit_cycle(&mut link, &SHARED_READING);
        ticker.next().await;
    }
}

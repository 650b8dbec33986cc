#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use bt_hci::controller::ExternalController;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::timer::timg::TimerGroup;
use esp_radio::ble::controller::BleConnector;
use log::{error, info, warn};
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ILI9342CRgb565};
use static_cell::StaticCell;

use sprout_core::config::MonitorConfig;
use sprout_core::monitor::Monitor;
use sprout_core::tasks::{Workload, build_task_table};
use sprout_firmware::BLE_NAME;
use sprout_firmware::ble::{BleLink, Server, ble_task};
use sprout_firmware::board::{ALARM_LED_PIN, BoardAdc, BoardGpio, HUMIDITY_PIN, SOLAR_PIN};
use sprout_firmware::display::LcdReport;
use sprout_firmware::sensors::Sht40Thermometer;
use sprout_firmware::tasks::{MonitorResources, monitor_task, transmit_task};

const DISPLAY_WIDTH: u16 = 320;
const DISPLAY_HEIGHT: u16 = 240;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    // The pins below are soldered; the config has to agree with them.
    let monitor_config = MonitorConfig::default();
    let pins = monitor_config.pins;
    if (pins.humidity_adc, pins.alarm_led, pins.solar_input) != (HUMIDITY_PIN, ALARM_LED_PIN, SOLAR_PIN) {
        warn!("configured pins {:?} differ from the board wiring", pins);
    }

    let tasks = match build_task_table(&monitor_config) {
        Ok(tasks) => tasks,
        Err(e) => halt(e).await,
    };

    // Sensors and indicators
    let adc = BoardAdc::new(peripherals.ADC1, peripherals.GPIO32);
    let mut gpio = BoardGpio::new(peripherals.GPIO4, peripherals.GPIO5);
    let monitor = match Monitor::new(monitor_config, &mut gpio) {
        Ok(monitor) => monitor,
        Err(e) => halt(e).await,
    };

    let i2c = I2c::new(peripherals.I2C0, I2cConfig::default())
        .expect("Failed to initialize I2C")
        .with_sda(peripherals.GPIO21)
        .with_scl(peripherals.GPIO22)
        .into_async();
    let thermometer = Sht40Thermometer::new(i2c);

    // Display
    let spi_bus = Spi::new(peripherals.SPI2, SpiConfig::default())
        .expect("Failed to initialize SPI")
        .with_sck(peripherals.GPIO18)
        .with_mosi(peripherals.GPIO23);
    let cs = Output::new(peripherals.GPIO15, Level::High, OutputConfig::default());
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, cs).expect("Failed to claim SPI bus");
    let dc = Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default());
    let spi_buffer = {
        static SPI_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();
        SPI_BUFFER.init([0; 64])
    };
    let di = SpiInterface::new(spi_device, dc, spi_buffer);
    let lcd = MipidsiBuilder::new(ILI9342CRgb565, di)
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .init(&mut embassy_time::Delay)
        .expect("Failed to initialize display");

    info!("Display initialized!");

    // BLE
    let radio = {
        static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
        RADIO.init(esp_radio::init().expect("Failed to initialize BLE controller"))
    };
    let connector = BleConnector::new(radio, peripherals.BT, Default::default())
        .expect("Failed to initialize BLE connector");
    let controller = ExternalController::new(connector);
    let (server, peripheral) = match Server::start_gatt(BLE_NAME, spawner, controller) {
        Ok(started) => started,
        Err(e) => halt(e).await,
    };
    spawner.must_spawn(ble_task(BLE_NAME, server, peripheral));

    // Hand the task table to the executor
    let mut monitor_resources = Some(MonitorResources {
        monitor,
        thermometer,
        adc,
        gpio,
        display: LcdReport::new(lcd),
    });
    let mut link = Some(BleLink);
    for task in tasks.scheduled() {
        let period = Duration::from_millis(u64::from(task.period_ms));
        info!(
            "starting task {} '{}' (priority hint {})",
            task.index,
            task.work.name(),
            task.priority
        );
        match task.work {
            Workload::Monitor => match monitor_resources.take() {
                Some(res) => spawner.must_spawn(monitor_task(res, period)),
                None => warn!("monitor workload scheduled twice, ignoring task {}", task.index),
            },
            Workload::Transmit => match link.take() {
                Some(link) => spawner.must_spawn(transmit_task(link, period)),
                None => warn!("transmit workload scheduled twice, ignoring task {}", task.index),
            },
        }
    }

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}

/// Log a fatal startup error and park.
async fn halt(e: impl core::fmt::Display) -> ! {
    error!("startup failed: {}", e);
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

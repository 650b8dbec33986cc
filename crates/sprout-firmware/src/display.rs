//! The SPI LCD the report is drawn on.

use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::Blocking;
use esp_hal::gpio::Output;
use esp_hal::spi::master::Spi;
use mipidsi::NoResetPin;
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9342CRgb565;

use sprout_core::display::TextReport;

/// The panel driver as wired on the board.
pub type Lcd = mipidsi::Display<
    SpiInterface<'static, ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, NoDelay>, Output<'static>>,
    ILI9342CRgb565,
    NoResetPin,
>;

pub type LcdReport = TextReport<Lcd>;

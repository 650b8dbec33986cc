//! Text rendering of the report on any RGB565 draw target.

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::error::DisplayError;
use crate::hal::ReportDisplay;
use crate::reading::ReportLines;

/// Vertical distance between report lines, in pixels.
const LINE_HEIGHT: i32 = 12;

/// Draws the report lines top-left, one per row, white on black.
pub struct TextReport<D> {
    target: D,
}

impl<D> TextReport<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &D {
        &self.target
    }
}

impl<D> ReportDisplay for TextReport<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn show(&mut self, lines: &ReportLines) -> Result<(), DisplayError> {
        let style = MonoTextStyle::new(&FONT_6X10, Rgb565::WHITE);

        self.target
            .clear(Rgb565::BLACK)
            .map_err(|_| DisplayError::Rejected("clear"))?;

        let mut y = 0;
        for line in lines.iter() {
            Text::with_baseline(line, Point::new(0, y), style, Baseline::Top)
                .draw(&mut self.target)
                .map_err(|_| DisplayError::Rejected("draw text"))?;
            y += LINE_HEIGHT;
        }
        Ok(())
    }
}

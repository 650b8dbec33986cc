//! Digital channel bindings: the alarm LED and the solar status input.
//!
//! Same gating rules as the analog table: an out of range index or an
//! inactive channel turns every call into a logged no-op.

use log::debug;

use crate::hal::{DigitalIo, Direction, UNBOUND_PIN};

/// Number of digital channels wired on the board.
pub const DIGITAL_CHANNELS: usize = 2;

/// Channel index of the alarm LED.
pub const ALARM_LED_CHANNEL: usize = 0;

/// Channel index of the solar status input.
pub const SOLAR_CHANNEL: usize = 1;

/// Digital table sized for the board.
pub type BoardDigitalTable = DigitalTable<DIGITAL_CHANNELS>;

/// Configuration and last written level of one digital channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalDescriptor {
    pub pin: Option<u8>,
    pub active: bool,
    pub direction: Direction,
    pub level: bool,
}

impl DigitalDescriptor {
    pub const fn new() -> Self {
        Self {
            pin: None,
            active: true,
            direction: Direction::Input,
            level: false,
        }
    }
}

impl Default for DigitalDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct DigitalTable<const N: usize> {
    channels: [DigitalDescriptor; N],
}

impl<const N: usize> DigitalTable<N> {
    pub const fn new() -> Self {
        Self {
            channels: [DigitalDescriptor::new(); N],
        }
    }

    pub fn descriptor(&self, channel: usize) -> Option<&DigitalDescriptor> {
        self.channels.get(channel)
    }

    /// Bind `channel` to `pin` and apply the channel's current direction.
    pub fn set_pin<IO: DigitalIo>(&mut self, channel: usize, pin: u8, io: &mut IO) {
        if pin == UNBOUND_PIN {
            debug!("digital channel {}: refusing unbound pin id", channel);
            return;
        }
        if let Some(descriptor) = self.active_mut(channel) {
            descriptor.pin = Some(pin);
            io.configure(pin, descriptor.direction);
        }
    }

    /// Change the direction of `channel`, reconfiguring the pin if bound.
    pub fn set_direction<IO: DigitalIo>(&mut self, channel: usize, direction: Direction, io: &mut IO) {
        if let Some(descriptor) = self.active_mut(channel) {
            descriptor.direction = direction;
            if let Some(pin) = descriptor.pin {
                io.configure(pin, direction);
            }
        }
    }

    /// Record `high` as the channel level and drive the pin.
    pub fn set_value<IO: DigitalIo>(&mut self, channel: usize, high: bool, io: &mut IO) {
        if let Some(descriptor) = self.active_mut(channel) {
            descriptor.level = high;
            match descriptor.pin {
                Some(pin) => io.write(pin, high),
                None => debug!("digital channel {} has no pin bound", channel),
            }
        }
    }

    /// Sample the pin of `channel`.
    ///
    /// `None` when the channel is out of range, inactive or unbound.
    pub fn read<IO: DigitalIo>(&self, channel: usize, io: &mut IO) -> Option<bool> {
        let descriptor = self.active(channel)?;
        let Some(pin) = descriptor.pin else {
            debug!("digital channel {} has no pin bound", channel);
            return None;
        };
        Some(io.read(pin))
    }

    /// Open or close the gate on `channel`.
    pub fn set_active(&mut self, channel: usize, active: bool) {
        match self.channels.get_mut(channel) {
            Some(descriptor) => descriptor.active = active,
            None => debug!("digital channel {} out of bounds", channel),
        }
    }

    fn active(&self, channel: usize) -> Option<&DigitalDescriptor> {
        match self.channels.get(channel) {
            Some(descriptor) if descriptor.active => Some(descriptor),
            Some(_) => {
                debug!("digital channel {} inactive", channel);
                None
            }
            None => {
                debug!("digital channel {} out of bounds", channel);
                None
            }
        }
    }

    fn active_mut(&mut self, channel: usize) -> Option<&mut DigitalDescriptor> {
        match self.channels.get_mut(channel) {
            Some(descriptor) if descriptor.active => Some(descriptor),
            Some(_) => {
                debug!("digital channel {} inactive", channel);
                None
            }
            None => {
                debug!("digital channel {} out of bounds", channel);
                None
            }
        }
    }
}

impl<const N: usize> Default for DigitalTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

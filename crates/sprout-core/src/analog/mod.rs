//! Outlier-tolerant analog acquisition.
//!
//! [`ChannelTable`] owns one [`ChannelDescriptor`] per analog input. Each
//! descriptor owns a [`HistoryBuffer`] and a reject streak, and the table
//! applies a shared [`SpikeFilter`] when a new sample arrives.
//!
//! Every operation takes a channel index. An index past the end of the table
//! or an inactive channel never panics: the call becomes a no-op returning a
//! neutral value (`false`, `0` or `None`) and a `debug!` line is logged.

mod history;
mod spike;

pub use history::HistoryBuffer;
pub use spike::{SpikeFilter, tolerance_counts};

use core::fmt;

use log::{debug, info, trace};

use crate::hal::{AnalogInput, UNBOUND_PIN};

/// Samples kept per channel.
pub const HISTORY_CAPACITY: usize = 4;

/// Number of analog inputs wired on the board.
pub const ANALOG_CHANNELS: usize = 1;

/// Channel index of the soil humidity probe.
pub const HUMIDITY_CHANNEL: usize = 0;

/// Channel table sized for the board.
pub type AnalogTable = ChannelTable<ANALOG_CHANNELS, HISTORY_CAPACITY>;

/// Per-channel acquisition state.
#[derive(Debug, Clone)]
pub struct ChannelDescriptor<const CAP: usize> {
    pin: Option<u8>,
    active: bool,
    history: HistoryBuffer<CAP>,
    reject_streak: u8,
}

impl<const CAP: usize> ChannelDescriptor<CAP> {
    /// Active, unbound, with an empty history.
    pub const fn new() -> Self {
        Self {
            pin: None,
            active: true,
            history: HistoryBuffer::new(),
            reject_streak: 0,
        }
    }

    pub fn pin(&self) -> Option<u8> {
        self.pin
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn history(&self) -> &HistoryBuffer<CAP> {
        &self.history
    }

    pub fn reject_streak(&self) -> u8 {
        self.reject_streak
    }
}

impl<const CAP: usize> Default for ChannelDescriptor<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

/// What one acquisition cycle did with the sample it read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    /// The sample passed the filter and entered the history.
    Accepted { sample: u16, mean: u16 },
    /// The sample was treated as a glitch and discarded.
    Dropped { sample: u16, streak: u8 },
    /// The sample completed a run of rejections and was admitted as a new
    /// baseline. `streak` is the run length that triggered admission.
    ForcedAdmit { sample: u16, streak: u8, mean: u16 },
    /// Nothing was read: the channel is out of range, inactive or unbound.
    Skipped,
}

impl AcquisitionOutcome {
    /// Whether the sample entered the history.
    pub fn admitted(&self) -> bool {
        matches!(self, Self::Accepted { .. } | Self::ForcedAdmit { .. })
    }
}

/// Fixed-size table of analog channels sharing one spike filter.
#[derive(Debug, Clone)]
pub struct ChannelTable<const N: usize, const CAP: usize> {
    channels: [ChannelDescriptor<CAP>; N],
    filter: SpikeFilter,
}

impl<const N: usize, const CAP: usize> ChannelTable<N, CAP> {
    /// Create a table with every channel active and unbound.
    pub fn new(filter: SpikeFilter) -> Self {
        Self {
            channels: core::array::from_fn(|_| ChannelDescriptor::new()),
            filter,
        }
    }

    /// Number of channels in the table.
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn filter(&self) -> &SpikeFilter {
        &self.filter
    }

    pub fn descriptor(&self, channel: usize) -> Option<&ChannelDescriptor<CAP>> {
        self.channels.get(channel)
    }

    /// Bind `channel` to a hardware pin. Ignored for [`UNBOUND_PIN`].
    pub fn set_pin(&mut self, channel: usize, pin: u8) {
        if pin == UNBOUND_PIN {
            debug!("analog channel {}: refusing unbound pin id", channel);
            return;
        }
        if let Some(descriptor) = self.active_mut(channel) {
            descriptor.pin = Some(pin);
        }
    }

    /// Open or close the gate on `channel`.
    ///
    /// This is the only setter that works on an inactive channel.
    pub fn set_active(&mut self, channel: usize, active: bool) {
        match self.channels.get_mut(channel) {
            Some(descriptor) => descriptor.active = active,
            None => debug!("analog channel {} out of bounds", channel),
        }
    }

    pub fn is_active(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.active)
    }

    /// Whether `candidate` would pass the spike filter on `channel`.
    ///
    /// Fails closed: out of range or inactive channels report `false`.
    pub fn is_sample_valid(&self, channel: usize, candidate: u16) -> bool {
        self.active(channel)
            .is_some_and(|c| self.filter.is_valid(&c.history, candidate))
    }

    /// Update the reject streak for `candidate` and return it.
    ///
    /// A valid candidate resets the streak to 0, an invalid one extends it by
    /// one. Returns `None` without touching anything for out of range or
    /// inactive channels.
    pub fn record_rejection_or_reset(&mut self, channel: usize, candidate: u16) -> Option<u8> {
        let filter = self.filter;
        let descriptor = self.active_mut(channel)?;
        if filter.is_valid(&descriptor.history, candidate) {
            descriptor.reject_streak = 0;
        } else {
            descriptor.reject_streak = descriptor.reject_streak.saturating_add(1);
        }
        Some(descriptor.reject_streak)
    }

    /// Push `value` into the history of `channel`, evicting the oldest sample
    /// when full. Does not refresh the cached mean.
    pub fn insert(&mut self, channel: usize, value: u16) {
        if let Some(descriptor) = self.active_mut(channel) {
            descriptor.history.insert(value);
        }
    }

    /// Truncating mean of the history of `channel`, 0 when empty or
    /// unavailable.
    pub fn mean(&self, channel: usize) -> u16 {
        self.active(channel).map_or(0, |c| c.history.mean())
    }

    /// Mean stored on the last admission, 0 before any sample or when
    /// unavailable.
    pub fn cached_mean(&self, channel: usize) -> u16 {
        self.active(channel).map_or(0, |c| c.history.cached_mean())
    }

    pub fn reject_streak(&self, channel: usize) -> Option<u8> {
        self.active(channel).map(|c| c.reject_streak)
    }

    /// Run one acquisition cycle on `channel`.
    ///
    /// Reads a sample, updates the reject streak and admits the sample when
    /// it passed the filter or when the streak reached the reject limit. A
    /// forced admission resets the streak so the next cycle is judged against
    /// the new baseline.
    pub fn acquire<A: AnalogInput>(&mut self, channel: usize, adc: &mut A) -> AcquisitionOutcome {
        let Some(descriptor) = self.active(channel) else {
            return AcquisitionOutcome::Skipped;
        };
        let Some(pin) = descriptor.pin else {
            debug!("analog channel {} has no pin bound", channel);
            return AcquisitionOutcome::Skipped;
        };

        let sample = adc.read_raw(pin);
        let Some(streak) = self.record_rejection_or_reset(channel, sample) else {
            return AcquisitionOutcome::Skipped;
        };

        if !self.filter.admits(streak) {
            trace!("analog channel {}: dropped {} (streak {})", channel, sample, streak);
            return AcquisitionOutcome::Dropped { sample, streak };
        }

        let descriptor = &mut self.channels[channel];
        descriptor.history.insert(sample);
        let mean = descriptor.history.refresh_mean();

        if streak == 0 {
            trace!("analog channel {}: accepted {} (mean {})", channel, sample, mean);
            AcquisitionOutcome::Accepted { sample, mean }
        } else {
            descriptor.reject_streak = 0;
            info!(
                "analog channel {}: {} rejections in a row, admitting {} as new baseline",
                channel, streak, sample
            );
            AcquisitionOutcome::ForcedAdmit {
                sample,
                streak,
                mean,
            }
        }
    }

    /// Printable snapshot of `channel` for diagnostics.
    pub fn describe(&self, channel: usize) -> Option<ChannelReport<'_, CAP>> {
        self.channels
            .get(channel)
            .map(|descriptor| ChannelReport {
                channel,
                descriptor,
            })
    }

    fn active(&self, channel: usize) -> Option<&ChannelDescriptor<CAP>> {
        match self.channels.get(channel) {
            Some(descriptor) if descriptor.active => Some(descriptor),
            Some(_) => {
                debug!("analog channel {} inactive", channel);
                None
            }
            None => {
                debug!("analog channel {} out of bounds", channel);
                None
            }
        }
    }

    fn active_mut(&mut self, channel: usize) -> Option<&mut ChannelDescriptor<CAP>> {
        match self.channels.get_mut(channel) {
            Some(descriptor) if descriptor.active => Some(descriptor),
            Some(_) => {
                debug!("analog channel {} inactive", channel);
                None
            }
            None => {
                debug!("analog channel {} out of bounds", channel);
                None
            }
        }
    }
}

/// Diagnostic view of one channel, see [`ChannelTable::describe`].
pub struct ChannelReport<'a, const CAP: usize> {
    channel: usize,
    descriptor: &'a ChannelDescriptor<CAP>,
}

impl<const CAP: usize> fmt::Display for ChannelReport<'_, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.descriptor;
        write!(f, "ch{} pin=", self.channel)?;
        match d.pin {
            Some(pin) => write!(f, "{}", pin)?,
            None => f.write_str("-")?,
        }
        write!(
            f,
            " active={} [{}/{} mean={}] [",
            d.active,
            d.history.len(),
            d.history.capacity(),
            d.history.cached_mean()
        )?;
        for (i, sample) in d.history.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", sample)?;
        }
        write!(f, "] streak={}", d.reject_streak)
    }
}

use core::sync::atomic::Ordering;

use sprout_core::error::LinkError;
use sprout_core::hal::ReadingLink;
use sprout_core::reading::LinkPayload;

use super::{CONNECTED, OUTBOX};

/// Hands payloads to the BLE task without waiting on the radio.
#[derive(Debug, Default, Clone, Copy)]
pub struct BleLink;

impl ReadingLink for BleLink {
    fn is_connected(&self) -> bool {
        CONNECTED.load(Ordering::Relaxed)
    }

    fn transmit(&mut self, payload: &LinkPayload) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        OUTBOX.try_send(*payload).map_err(|_| LinkError::QueueFull)
    }
}

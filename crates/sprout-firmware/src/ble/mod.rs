//! BLE peripheral carrying the plant reading.
//!
//! The transmit workload never touches the radio. It queues payloads into
//! [`OUTBOX`] through [`BleLink`], and [`ble_task`] turns them into GATT
//! notifications while a central is connected.

pub mod advertiser;
pub mod gatt;
pub mod link;

use core::sync::atomic::{AtomicBool, Ordering};

use bt_hci::controller::ExternalController;
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use esp_radio::ble::controller::BleConnector;
use log::{error, info, warn};
use trouble_host::prelude::*;

pub use advertiser::*;
pub use gatt::*;
pub use link::*;

use sprout_core::reading::LinkPayload;

/// Max number of connections
const CONNECTIONS_MAX: usize = 1;

/// Max number of L2CAP channels.
const L2CAP_CHANNELS_MAX: usize = 2; // Signal + att

/// Payloads waiting for the BLE task.
const OUTBOX_DEPTH: usize = 2;

pub type BleController = ExternalController<BleConnector<'static>, 20>;

pub type BleResources = HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX>;

/// Set while a central is connected.
pub static CONNECTED: AtomicBool = AtomicBool::new(false);

/// Readings queued by the transmit workload.
pub static OUTBOX: Channel<CriticalSectionRawMutex, LinkPayload, OUTBOX_DEPTH> = Channel::new();

#[embassy_executor::task]
pub async fn runner_task(mut runner: Runner<'static, BleController, DefaultPacketPool>) {
    let res = runner.run().await;
    info!("BLE runner exited with: {:?}", res);
}

/// Advertise, serve one central at a time, forward queued readings.
#[embassy_executor::task]
pub async fn ble_task(
    name: &'static str,
    server: &'static Server<'static>,
    mut peripheral: Peripheral<'static, BleController, DefaultPacketPool>,
) {
    loop {
        match advertise(name, &mut peripheral, server).await {
            Ok(conn) => {
                // Anything queued while nobody listened is stale.
                OUTBOX.clear();
                CONNECTED.store(true, Ordering::Relaxed);
                select(gatt_events(&conn), notify_readings(server, &conn)).await;
                CONNECTED.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                error!("Advertisement error: {:?}", e);
                embassy_time::Timer::after_secs(1).await;
            }
        }
    }
}

/// Answer reads until the central disconnects.
async fn gatt_events(conn: &GattConnection<'_, '_, DefaultPacketPool>) {
    loop {
        match conn.next().await {
            GattConnectionEvent::Disconnected { reason } => {
                info!("[gatt] Disconnected: {:?}", reason);
                break;
            }
            GattConnectionEvent::Gatt { event } => match event.accept() {
                Ok(reply) => reply.send().await,
                Err(e) => warn!("[gatt] error sending response: {:?}", e),
            },
            _ => {}
        }
    }
}

/// Publish each queued payload on the three characteristics.
async fn notify_readings(server: &Server<'_>, conn: &GattConnection<'_, '_, DefaultPacketPool>) {
    let service = &server.environment;
    loop {
        let payload = OUTBOX.receive().await;
        let updates = [
            (&service.temperature, payload.temperature),
            (&service.humidity, payload.humidity),
            (&service.solar, payload.solar),
        ];
        for (characteristic, value) in updates {
            if let Err(e) = characteristic.notify(conn, &value).await {
                warn!("[gatt] notify failed: {:?}", e);
            }
        }
    }
}

use embassy_executor::Spawner;
use log::info;
use static_cell::StaticCell;
use trouble_host::prelude::*;

use super::{BleController, BleResources, runner_task};

/// Environmental Sensing Service (UUID: 0x181A)
///
/// Values are whole units as `u16`, not the 0.01 resolution the SIG
/// characteristics define.
#[gatt_service(uuid = "181a")]
pub struct EnvironmentalService {
    /// Temperature (UUID: 0x2A6E), whole degrees Celsius.
    #[characteristic(uuid = "2a6e", read, notify)]
    pub temperature: u16,
    /// Humidity (UUID: 0x2A6F), whole percent of probe full scale.
    #[characteristic(uuid = "2a6f", read, notify)]
    pub humidity: u16,
    /// Irradiance (UUID: 0x2A77), raw solar comparator level.
    #[characteristic(uuid = "2a77", read, notify)]
    pub solar: u16,
}

#[gatt_server]
pub struct Server {
    pub environment: EnvironmentalService,
}

impl Server<'static> {
    /// Build the host stack and GATT server and spawn the BLE runner.
    pub fn start_gatt(
        name: &'static str,
        spawner: Spawner,
        controller: BleController,
    ) -> Result<(&'static Self, Peripheral<'static, BleController, DefaultPacketPool>), &'static str>
    {
        let address = Address::random([0x53, 0x50, 0x52, 0x4f, 0x55, 0xd4]);
        info!("Our address = {:?}", address);

        let resources = {
            static RESOURCES: StaticCell<BleResources> = StaticCell::new();
            RESOURCES.init(BleResources::new())
        };
        let stack = {
            static STACK: StaticCell<Stack<'static, BleController, DefaultPacketPool>> =
                StaticCell::new();
            STACK.init(trouble_host::new(controller, resources).set_random_address(address))
        };
        let host = stack.build();

        let server = Server::new_with_config(GapConfig::Peripheral(PeripheralConfig {
            name,
            appearance: &appearance::sensor::GENERIC_SENSOR,
        }))?;
        let server = {
            static SERVER: StaticCell<Server<'static>> = StaticCell::new();
            SERVER.init(server)
        };

        info!("Starting Gatt Server");
        spawner.must_spawn(runner_task(host.runner));
        Ok((server, host.peripheral))
    }
}

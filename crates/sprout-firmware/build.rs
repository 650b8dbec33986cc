//! Bakes the BLE device name into the binary.
//!
//! Reads `SPROUT_BLE_NAME` from the environment or from a `.env` file next to
//! the workspace root, falling back to the stock name.

const DEFAULT_BLE_NAME: &str = "SmartPlantMonitor";

fn main() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-changed=../../.env");
    println!("cargo:rerun-if-env-changed=SPROUT_BLE_NAME");

    // A missing .env is fine, the default name is used.
    let _ = dotenvy::dotenv();

    let name = std::env::var("SPROUT_BLE_NAME").unwrap_or_else(|_| DEFAULT_BLE_NAME.into());
    if name.is_empty() || name.len() > 29 {
        panic!("SPROUT_BLE_NAME must be 1 to 29 bytes to fit the advertising packet");
    }
    println!("cargo:rustc-env=SPROUT_BLE_NAME={name}");
}

mod handlers;
mod render;
mod state;
mod udev;
mod utils;

use smithay::utils::SerialCounter;

pub static SERIAL_COUNTER: SerialCounter = SerialCounter::new();

fn main() -> Result<(), Box<dyn std::error::Error>> {
    utils::logs::init_logs();

    let config_path = std::env::args()
        .collect::<Vec<_>>()
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].clone());

    if let Some(path) = config_path {
        // SAFETY: single-threaded at this point, before the event loop starts.
        unsafe { std::env::set_var("KOWINWM_CONFIG", path) };
    }

    udev::init_udev();
    Ok(())
}

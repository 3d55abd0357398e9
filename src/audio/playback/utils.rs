use rodio::{
    cpal::{default_host, traits::HostTrait},
    Device, DeviceTrait,
};
use tracing::{info, warn};

pub fn setup_output_device() -> anyhow::Result<Device> {
    let host = default_host();
    let device = host
        .default_output_device()
        .ok_or(anyhow::Error::msg("No audio output device"))?;

    match device.name() {
        Ok(name) => info!("using output device {name}"),
        Err(err) => warn!("output device has no name: {err}"),
    }

    Ok(device)
}

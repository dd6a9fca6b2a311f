//! Advisory checks on the host. Nothing here blocks a run.
use crate::config::SpiSettings;

/// `true` if the process runs with root privileges, which GPIO access usually needs.
///
/// Always `true` off Linux, where the check does not apply.
pub fn is_privileged() -> bool {
    #[cfg(target_os = "linux")]
    {
        nix::unistd::geteuid().is_root()
    }
    #[cfg(not(target_os = "linux"))]
    {
        true
    }
}

/// `true` if the spidev node for these settings exists, i.e. the SPI interface is enabled.
pub fn spi_device_present(settings: &SpiSettings) -> bool {
    settings.device_path().exists()
}

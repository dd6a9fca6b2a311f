//! Wiring, bus settings and timings used by the probes.
//!
//! Everything here is static configuration: it is built once, from the command line or from
//! [`WiretestConfig::default()`], and passed by reference into every probe.
//!
//! # Examples
//! ```
//! use nrf24_wiretest::config::WiretestConfig;
//!
//! let config = WiretestConfig::default().ce_pin(25).clock_hz(4_000_000).strict_spi(true);
//! assert_eq!(config.wiring().ce_pin(), 25);
//! assert_eq!(config.wiring().csn_pin(), 8);
//! ```
use crate::hal::spi::{Mode, Phase, Polarity};
use crate::SPI_MODE;
use std::path::PathBuf;

/// BCM number of the SPI0 clock line. Printed for reference only.
pub const SCK_PIN: u8 = 11;
/// BCM number of the SPI0 MOSI line. Printed for reference only.
pub const MOSI_PIN: u8 = 10;
/// BCM number of the SPI0 MISO line. Printed for reference only.
pub const MISO_PIN: u8 = 9;

/// Complete probe configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiretestConfig {
    pub(crate) wiring: Wiring,
    pub(crate) spi: SpiSettings,
    pub(crate) timing: SettleDelays,
    pub(crate) strict_spi: bool,
}

impl WiretestConfig {
    /// BCM number of the chip enable line.
    pub fn ce_pin(mut self, pin: u8) -> Self {
        self.wiring.ce_pin = pin;
        self
    }

    /// BCM number of the chip select line.
    pub fn csn_pin(mut self, pin: u8) -> Self {
        self.wiring.csn_pin = pin;
        self
    }

    /// SPI bus number, as in `/dev/spidev<bus>.<channel>`.
    pub fn spi_bus(mut self, bus: u8) -> Self {
        self.spi.bus = bus;
        self
    }

    /// SPI chip select channel, as in `/dev/spidev<bus>.<channel>`.
    pub fn spi_channel(mut self, channel: u8) -> Self {
        self.spi.channel = channel;
        self
    }

    /// SPI clock in Hz.
    pub fn clock_hz(mut self, clock_hz: u32) -> Self {
        self.spi.clock_hz = clock_hz;
        self
    }

    /// Replaces all settle delays.
    pub fn timing(mut self, timing: SettleDelays) -> Self {
        self.timing = timing;
        self
    }

    /// When set, a CONFIG read of `0x00`/`0xFF` in the SPI probe fails the probe instead of
    /// only printing a warning.
    pub fn strict_spi(mut self, strict: bool) -> Self {
        self.strict_spi = strict;
        self
    }

    /// Line assignment.
    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    /// SPI session settings.
    pub fn spi(&self) -> &SpiSettings {
        &self.spi
    }

    /// Settle delays.
    pub fn settle_delays(&self) -> &SettleDelays {
        &self.timing
    }

    /// Whether the stuck-line heuristic is a hard failure.
    pub fn is_strict_spi(&self) -> bool {
        self.strict_spi
    }
}

/// The two GPIO lines the probes drive, BCM numbered.
///
/// Defaults to CE on GPIO 22 and CSN on GPIO 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiring {
    ce_pin: u8,
    csn_pin: u8,
}

impl Default for Wiring {
    fn default() -> Self {
        Self {
            ce_pin: 22,
            csn_pin: 8,
        }
    }
}

impl Wiring {
    /// Chip enable line.
    pub fn ce_pin(&self) -> u8 {
        self.ce_pin
    }
    /// Chip select line, active low.
    pub fn csn_pin(&self) -> u8 {
        self.csn_pin
    }
}

/// Settings of an SPI session.
///
/// Defaults to bus 0, channel 0, 10 MHz, mode 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiSettings {
    bus: u8,
    channel: u8,
    clock_hz: u32,
    mode: Mode,
}

impl Default for SpiSettings {
    fn default() -> Self {
        Self {
            bus: 0,
            channel: 0,
            clock_hz: 10_000_000,
            mode: SPI_MODE,
        }
    }
}

impl SpiSettings {
    /// Bus number.
    pub fn bus(&self) -> u8 {
        self.bus
    }
    /// Chip select channel on the bus.
    pub fn channel(&self) -> u8 {
        self.channel
    }
    /// Clock in Hz.
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }
    /// Clock polarity and phase.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Conventional mode number, 0 to 3.
    pub fn mode_number(&self) -> u8 {
        let cpol = match self.mode.polarity {
            Polarity::IdleLow => 0,
            Polarity::IdleHigh => 1,
        };
        let cpha = match self.mode.phase {
            Phase::CaptureOnFirstTransition => 0,
            Phase::CaptureOnSecondTransition => 1,
        };
        (cpol << 1) | cpha
    }

    /// The spidev character device backing this session.
    pub fn device_path(&self) -> PathBuf {
        PathBuf::from(format!("/dev/spidev{}.{}", self.bus, self.channel))
    }
}

/// Fixed waits, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    /// How long each level is held in the GPIO probe, long enough to read on a meter.
    pub toggle_hold_ms: u32,
    /// Wait after powering the chip down.
    pub power_down_ms: u32,
    /// Wait after powering the chip up. The datasheet asks for at least 4.5ms.
    pub power_up_ms: u32,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            toggle_hold_ms: 500,
            power_down_ms: 10,
            power_up_ms: 5,
        }
    }
}

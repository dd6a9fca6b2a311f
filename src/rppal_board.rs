//! Raspberry Pi implementation of [`Board`] using rppal.
//!
//! Pins are claimed through the GPIO peripheral and reset to their previous mode when dropped.
//! SPI sessions go through `/dev/spidevB.C` and are closed when dropped, so there is nothing to
//! release if opening failed.
use crate::board::{Board, Lines};
use crate::config::{SpiSettings, Wiring};
use crate::hal::spi::{Phase, Polarity};
use log::debug;
use rppal::gpio::{Gpio, OutputPin};
use rppal::hal::Delay;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use thiserror::Error;

/// Errors from claiming lines or opening SPI on the Pi.
#[derive(Debug, Error)]
pub enum HwError {
    /// GPIO peripheral or pin unavailable.
    #[error("{0}")]
    Gpio(#[from] rppal::gpio::Error),
    /// SPI device could not be opened or configured.
    #[error("{0}")]
    Spi(#[from] rppal::spi::Error),
    /// No such SPI bus on this SoC.
    #[error("SPI bus {0} is not available")]
    UnsupportedBus(u8),
    /// No such chip select on the bus.
    #[error("SPI channel {0} is not available")]
    UnsupportedChannel(u8),
}

/// The Pi's GPIO header and SPI controllers.
#[derive(Debug, Default)]
pub struct RppalBoard;

impl RppalBoard {
    /// Creates the board. Nothing is opened until a probe asks for it.
    pub fn new() -> Self {
        RppalBoard
    }
}

impl Board for RppalBoard {
    type Spi = Spi;
    type Pin = OutputPin;
    type Delay = Delay;
    type Error = HwError;

    fn claim_lines(&mut self, wiring: &Wiring) -> Result<Lines<OutputPin>, HwError> {
        let gpio = Gpio::new()?;
        let ce = gpio.get(wiring.ce_pin())?.into_output_low();
        let csn = gpio.get(wiring.csn_pin())?.into_output_high();
        debug!(
            "claimed CE on GPIO {} and CSN on GPIO {}",
            wiring.ce_pin(),
            wiring.csn_pin()
        );
        Ok(Lines { ce, csn })
    }

    fn open_spi(&mut self, settings: &SpiSettings) -> Result<Spi, HwError> {
        let spi = Spi::new(
            bus(settings.bus())?,
            slave_select(settings.channel())?,
            settings.clock_hz(),
            mode(settings),
        )?;
        debug!(
            "opened {} at {} Hz, mode {}",
            settings.device_path().display(),
            settings.clock_hz(),
            settings.mode_number()
        );
        Ok(spi)
    }

    fn delay(&mut self) -> Delay {
        Delay::new()
    }
}

fn bus(bus: u8) -> Result<Bus, HwError> {
    match bus {
        0 => Ok(Bus::Spi0),
        1 => Ok(Bus::Spi1),
        2 => Ok(Bus::Spi2),
        3 => Ok(Bus::Spi3),
        4 => Ok(Bus::Spi4),
        5 => Ok(Bus::Spi5),
        6 => Ok(Bus::Spi6),
        other => Err(HwError::UnsupportedBus(other)),
    }
}

fn slave_select(channel: u8) -> Result<SlaveSelect, HwError> {
    match channel {
        0 => Ok(SlaveSelect::Ss0),
        1 => Ok(SlaveSelect::Ss1),
        2 => Ok(SlaveSelect::Ss2),
        other => Err(HwError::UnsupportedChannel(other)),
    }
}

fn mode(settings: &SpiSettings) -> Mode {
    let mode = settings.mode();
    match (mode.polarity, mode.phase) {
        (Polarity::IdleLow, Phase::CaptureOnFirstTransition) => Mode::Mode0,
        (Polarity::IdleLow, Phase::CaptureOnSecondTransition) => Mode::Mode1,
        (Polarity::IdleHigh, Phase::CaptureOnFirstTransition) => Mode::Mode2,
        (Polarity::IdleHigh, Phase::CaptureOnSecondTransition) => Mode::Mode3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WiretestConfig;

    #[test]
    fn default_settings_map_to_spi0_ss0_mode0() {
        let config = WiretestConfig::default();
        assert!(matches!(bus(config.spi().bus()), Ok(Bus::Spi0)));
        assert!(matches!(slave_select(config.spi().channel()), Ok(SlaveSelect::Ss0)));
        assert_eq!(mode(config.spi()), Mode::Mode0);
    }

    #[test]
    fn out_of_range_bus_and_channel_are_rejected() {
        assert_eq!(bus(7).unwrap_err().to_string(), "SPI bus 7 is not available");
        assert_eq!(
            slave_select(9).unwrap_err().to_string(),
            "SPI channel 9 is not available"
        );
    }
}

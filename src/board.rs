//! Scoped access to the hardware the probes need.
//!
//! A [`Board`] hands out owned handles. Each handle gives its resource back when dropped, so a
//! probe releases its lines and session on every exit path, and an acquisition that failed
//! leaves nothing behind to release.
use crate::config::{SpiSettings, Wiring};
use crate::hal::delay::DelayNs;
use crate::hal::digital::OutputPin;
use crate::hal::spi::SpiBus;
use core::fmt;

/// The CE and CSN lines, configured as outputs.
#[derive(Debug)]
pub struct Lines<P> {
    /// Chip enable, starts low.
    pub ce: P,
    /// Chip select, starts high.
    pub csn: P,
}

/// Source of GPIO lines, SPI sessions and delays.
pub trait Board {
    /// An open SPI session. One `transfer_in_place` call is one chip select frame.
    type Spi: SpiBus<u8>;
    /// A claimed output line.
    type Pin: OutputPin;
    /// Blocking delay.
    type Delay: DelayNs;
    /// Why a line or session could not be acquired.
    type Error: fmt::Display;

    /// Claims CE and CSN as outputs, CE low and CSN high.
    fn claim_lines(&mut self, wiring: &Wiring) -> Result<Lines<Self::Pin>, Self::Error>;

    /// Opens an SPI session with the given settings.
    fn open_spi(&mut self, settings: &SpiSettings) -> Result<Self::Spi, Self::Error>;

    /// A delay source.
    fn delay(&mut self) -> Self::Delay;
}

//! This crate checks the wiring of an nRF24L01+ single chip 2.4 GHz transceiver attached to a
//! single-board computer, using the [`embedded-hal`] traits for every bus access.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//! Three probes run in order:
//!
//! 1. [`probe::gpio`] drives the CE and CSN lines high and low so the levels can be checked with
//!    a meter or an LED.
//! 2. [`probe::spi`] sends a NOP and reads the CONFIG register, flagging the stuck-line values
//!    `0x00` and `0xFF`.
//! 3. [`probe::presence`] powers the chip down, powers it back up and reads CONFIG back. Only a
//!    wired, powered and responsive chip reflects the written `PWR_UP` bit.
//!
//! # Usage
//!
//! ```no_run
//! use nrf24_wiretest::config::WiretestConfig;
//! use nrf24_wiretest::probe;
//! use nrf24_wiretest::report::Console;
//! use nrf24_wiretest::sim::{Fault, SimBoard};
//!
//! let mut board = SimBoard::new(Fault::None);
//! let mut console = Console::new(std::io::stdout());
//! let summary = probe::run_all(&mut board, &WiretestConfig::default(), &mut console);
//! summary.render(&mut console);
//! std::process::exit(summary.exit_status().into());
//! ```
//!
//! # Feature-flags
//!
//! - **pi-hardware** (default): provides [`rppal_board::RppalBoard`], the Raspberry Pi
//!   implementation of [`board::Board`] on top of the [rppal crate](https://docs.rs/rppal).
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts
)]
extern crate embedded_hal as hal;
use hal::spi;

pub mod board;
pub mod config;
mod error;
pub mod host;
mod nrf24;
pub mod probe;
pub mod register_acces;
pub mod report;
#[cfg(feature = "pi-hardware")]
pub mod rppal_board;
pub mod sim;
pub mod status;

pub use crate::error::{ProbeError, TransferError};
pub use crate::nrf24::{power_cycle, Nrf24Link, PowerCheck};

/// SPI mode the nRF24L01+ expects: clock idles low, data sampled on the leading edge.
pub const SPI_MODE: spi::Mode = spi::MODE_0;

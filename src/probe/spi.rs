//! Raw SPI exchange: a NOP and a CONFIG read over the hardware chip select.
//!
//! The CONFIG value is only checked against the two classic stuck-line readings. That is a
//! heuristic: a miswired bus can return other values, and a working bus can in principle read
//! either of these, so by default a stuck reading is a warning and not a failure.
use super::{ProbeKind, ProbeOutcome};
use crate::board::Board;
use crate::config::{SpiSettings, WiretestConfig};
use crate::error::ProbeError;
use crate::hal::spi::SpiBus;
use crate::register_acces::{Instruction, Register};
use crate::report::Console;
use crate::status::Status;
use std::io::Write;

/// A MISO line that reads constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuckLine {
    /// Every bit reads 0, typically MISO shorted to ground or an unpowered module.
    Low,
    /// Every bit reads 1, typically MISO floating or disconnected.
    High,
}

/// What came back from the NOP and the CONFIG read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiSample {
    /// Status shifted out during the NOP.
    pub status: Status,
    /// Second byte of the CONFIG read.
    pub config: u8,
}

impl SpiSample {
    /// Classifies the CONFIG reading.
    pub fn stuck_line(&self) -> Option<StuckLine> {
        match self.config {
            0x00 => Some(StuckLine::Low),
            0xFF => Some(StuckLine::High),
            _ => None,
        }
    }
}

/// Runs the SPI probe. The session is closed when this returns, whatever the outcome.
pub fn run<B: Board, W: Write>(
    board: &mut B,
    config: &WiretestConfig,
    console: &mut Console<W>,
) -> ProbeOutcome {
    console.heading("Testing SPI Communication");
    match exchange(board, config.spi(), console) {
        Ok(sample) => judge(&sample, config.is_strict_spi(), console),
        Err(e) => {
            console.line(format_args!("  ✗ SPI Error: {}", e));
            console.line("  Make sure SPI is enabled (sudo raspi-config)");
            ProbeOutcome::fail(ProbeKind::Spi, e.to_string())
        }
    }
}

fn exchange<B: Board, W: Write>(
    board: &mut B,
    settings: &SpiSettings,
    console: &mut Console<W>,
) -> Result<SpiSample, ProbeError> {
    let mut spi = board.open_spi(settings).map_err(ProbeError::unavailable)?;

    console.line("SPI Configuration:");
    console.line(format_args!("  Device: {}", settings.device_path().display()));
    console.line(format_args!(
        "  Speed: {:.1} MHz",
        f64::from(settings.clock_hz()) / 1_000_000.0
    ));
    console.line(format_args!("  Mode: {}", settings.mode_number()));

    console.line("\nTesting SPI communication with NRF24:");
    let status = nop(&mut spi).map_err(ProbeError::spi)?;
    console.line(format_args!("  NOP command response: 0x{:02X}", status.raw()));

    let config = read_config(&mut spi).map_err(ProbeError::spi)?;
    console.line(format_args!("  CONFIG register: 0x{:02X}", config));

    Ok(SpiSample { status, config })
}

fn judge<W: Write>(sample: &SpiSample, strict: bool, console: &mut Console<W>) -> ProbeOutcome {
    let suspicion = match sample.stuck_line() {
        Some(StuckLine::Low) => Some("CONFIG read 0x00, MISO may be stuck low".to_string()),
        Some(StuckLine::High) => Some("CONFIG read 0xFF, MISO may be floating".to_string()),
        None if !sample.status.is_valid() => Some(format!("status {}", sample.status)),
        None => None,
    };

    match suspicion {
        None => {
            console.line("  ✓ SPI communication appears to be working");
            ProbeOutcome::pass(ProbeKind::Spi, format!("CONFIG read 0x{:02X}", sample.config))
        }
        Some(detail) if strict => {
            console.line("  ✗ Stuck reading: Check NRF24 power and connections");
            ProbeOutcome::fail(ProbeKind::Spi, detail)
        }
        Some(detail) => {
            console.line("  ⚠ Possible issue: Check NRF24 power and connections");
            ProbeOutcome::warn(ProbeKind::Spi, detail)
        }
    }
}

/// Single byte NOP; the chip answers with its status.
pub fn nop<SPI: SpiBus<u8>>(spi: &mut SPI) -> Result<Status, SPI::Error> {
    let mut buf = [Instruction::NOP.opcode()];
    spi.transfer_in_place(&mut buf)?;
    spi.flush()?;
    Ok(Status::from(buf[0]))
}

/// Two byte CONFIG read; the status byte is dropped.
pub fn read_config<SPI: SpiBus<u8>>(spi: &mut SPI) -> Result<u8, SPI::Error> {
    let mut buf = [
        Instruction::RR.opcode() | Register::CONFIG.addr(),
        Instruction::NOP.opcode(),
    ];
    spi.transfer_in_place(&mut buf)?;
    spi.flush()?;
    Ok(buf[1])
}

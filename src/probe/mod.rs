//! The three wiring probes and their outcomes.
//!
//! Each probe acquires what it needs from the [`Board`], prints its steps as it goes, releases
//! everything and returns a [`ProbeOutcome`]. No error crosses a probe boundary.
use crate::board::Board;
use crate::config::WiretestConfig;
use crate::report::{Console, Summary};
use core::fmt;
use log::info;
use std::io::Write;

pub mod gpio;
pub mod presence;
pub mod spi;

/// Which probe produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// CE/CSN toggling.
    Gpio,
    /// NOP and raw CONFIG read.
    Spi,
    /// CONFIG write and read-back.
    Presence,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Gpio => f.write_str("GPIO"),
            ProbeKind::Spi => f.write_str("SPI"),
            ProbeKind::Presence => f.write_str("module presence"),
        }
    }
}

/// Pass/fail decision of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Everything looked right.
    Pass,
    /// Communication worked but the data looks suspicious. Counts as passed.
    Warn,
    /// The probe failed.
    Fail,
}

/// What a probe reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// The probe.
    pub kind: ProbeKind,
    /// Its decision.
    pub verdict: Verdict,
    /// One line diagnostic.
    pub detail: String,
}

impl ProbeOutcome {
    /// A passed outcome.
    pub fn pass(kind: ProbeKind, detail: impl Into<String>) -> Self {
        Self::new(kind, Verdict::Pass, detail)
    }

    /// A passed outcome carrying a warning.
    pub fn warn(kind: ProbeKind, detail: impl Into<String>) -> Self {
        Self::new(kind, Verdict::Warn, detail)
    }

    /// A failed outcome.
    pub fn fail(kind: ProbeKind, detail: impl Into<String>) -> Self {
        Self::new(kind, Verdict::Fail, detail)
    }

    fn new(kind: ProbeKind, verdict: Verdict, detail: impl Into<String>) -> Self {
        let outcome = Self {
            kind,
            verdict,
            detail: detail.into(),
        };
        info!("{} probe: {:?} ({})", outcome.kind, outcome.verdict, outcome.detail);
        outcome
    }

    /// `true` unless the verdict is [`Verdict::Fail`].
    pub fn passed(&self) -> bool {
        self.verdict != Verdict::Fail
    }
}

/// Runs the GPIO, SPI and presence probes in that order and tallies them.
pub fn run_all<B: Board, W: Write>(
    board: &mut B,
    config: &WiretestConfig,
    console: &mut Console<W>,
) -> Summary {
    let outcomes = vec![
        gpio::run(board, config, console),
        spi::run(board, config, console),
        presence::run(board, config, console),
    ];
    Summary::new(outcomes)
}

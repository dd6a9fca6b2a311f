//! Console output and the final tally.
//!
//! Lines are written and flushed as soon as a step completes, so a probe that hangs on a
//! settle delay or a dead bus still shows how far it got.
use crate::config::{WiretestConfig, MISO_PIN, MOSI_PIN, SCK_PIN};
use crate::probe::ProbeOutcome;
use core::fmt::Display;
use log::warn;
use std::io::Write;

/// Line oriented, immediately flushed writer for the human readable report.
#[derive(Debug)]
pub struct Console<W> {
    out: W,
}

impl<W: Write> Console<W> {
    /// Wraps a writer, usually `std::io::stdout()`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes one line and flushes.
    ///
    /// A broken stdout must not abort a probe halfway through a transaction, so write errors
    /// are logged and otherwise ignored.
    pub fn line<T: Display>(&mut self, text: T) {
        let written = writeln!(self.out, "{}", text).and_then(|()| self.out.flush());
        if let Err(e) = written {
            warn!("report output failed: {}", e);
        }
    }

    /// An empty line followed by `=== title ===`.
    pub fn heading(&mut self, title: &str) {
        self.line(format_args!("\n=== {} ===", title));
    }

    /// Gives back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the title block and the wiring being tested.
    pub fn banner(&mut self, config: &WiretestConfig) {
        let wiring = config.wiring();
        self.line("NRF24L01+ Wiring Test");
        self.line("=====================");
        self.line("Your configuration:");
        self.line(format_args!("  CE:   GPIO {}", wiring.ce_pin()));
        self.line(format_args!("  CSN:  GPIO {}", wiring.csn_pin()));
        self.line(format_args!("  SCK:  GPIO {}", SCK_PIN));
        self.line(format_args!("  MOSI: GPIO {}", MOSI_PIN));
        self.line(format_args!("  MISO: GPIO {}", MISO_PIN));
        self.line("  VCC:  3.3V");
        self.line("  GND:  Ground");
    }
}

/// Outcomes of every probe that ran, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    outcomes: Vec<ProbeOutcome>,
}

impl Summary {
    /// Exit status when every probe passed.
    pub const EXIT_PASSED: u8 = 0;
    /// Exit status when at least one probe failed.
    pub const EXIT_FAILED: u8 = 1;

    /// Summary of the given outcomes, in the order they ran.
    pub fn new(outcomes: Vec<ProbeOutcome>) -> Self {
        Self { outcomes }
    }

    /// Individual outcomes.
    pub fn outcomes(&self) -> &[ProbeOutcome] {
        &self.outcomes
    }

    /// Number of probes that passed, warnings included.
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of probes that ran.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// `true` if nothing failed.
    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }

    /// Process exit status for scripted use.
    pub fn exit_status(&self) -> u8 {
        if self.all_passed() {
            Self::EXIT_PASSED
        } else {
            Self::EXIT_FAILED
        }
    }

    /// Prints the tally, followed by the remediation checklist if anything failed.
    pub fn render<W: Write>(&self, console: &mut Console<W>) {
        console.line(format_args!("\n{}", "=".repeat(40)));
        console.line(format_args!("Tests passed: {}/{}", self.passed(), self.total()));

        if self.all_passed() {
            console.line("✓ All tests passed! Your wiring appears correct.");
        } else {
            console.line("✗ Some tests failed. Please check:");
            console.line("- All connections are secure");
            console.line("- NRF24 module has power (3.3V, not 5V!)");
            console.line("- SPI is enabled (sudo raspi-config)");
            console.line("- Capacitor is connected between VCC and GND");
        }
    }
}

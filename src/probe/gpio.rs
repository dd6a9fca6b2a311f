//! Drives CE and CSN high then low so the levels can be observed on the header.
use super::{ProbeKind, ProbeOutcome};
use crate::board::{Board, Lines};
use crate::config::WiretestConfig;
use crate::error::ProbeError;
use crate::hal::delay::DelayNs;
use crate::hal::digital::OutputPin;
use crate::report::Console;
use std::io::Write;

/// Runs the GPIO probe. The lines are released when this returns, whatever the outcome.
pub fn run<B: Board, W: Write>(
    board: &mut B,
    config: &WiretestConfig,
    console: &mut Console<W>,
) -> ProbeOutcome {
    console.heading("Testing GPIO Setup");
    match exercise(board, config, console) {
        Ok(()) => ProbeOutcome::pass(ProbeKind::Gpio, "CE and CSN accepted both levels"),
        Err(e) => {
            console.line(format_args!("  ✗ GPIO Error: {}", e));
            ProbeOutcome::fail(ProbeKind::Gpio, e.to_string())
        }
    }
}

fn exercise<B: Board, W: Write>(
    board: &mut B,
    config: &WiretestConfig,
    console: &mut Console<W>,
) -> Result<(), ProbeError> {
    let wiring = config.wiring();
    let hold_ms = config.settle_delays().toggle_hold_ms;
    let Lines { mut ce, mut csn } = board
        .claim_lines(wiring)
        .map_err(ProbeError::unavailable)?;
    let mut delay = board.delay();

    console.line(format_args!("\nTesting CE pin (GPIO {}):", wiring.ce_pin()));
    pulse(&mut ce, &mut delay, hold_ms, console)?;
    console.line("  ✓ CE pin working");

    console.line(format_args!("\nTesting CSN pin (GPIO {}):", wiring.csn_pin()));
    pulse(&mut csn, &mut delay, hold_ms, console)?;
    // back to idle
    csn.set_high().map_err(ProbeError::pin)?;
    console.line("  ✓ CSN pin working");

    Ok(())
}

/// High for `hold_ms`, then low for `hold_ms`.
fn pulse<P, D, W>(
    pin: &mut P,
    delay: &mut D,
    hold_ms: u32,
    console: &mut Console<W>,
) -> Result<(), ProbeError>
where
    P: OutputPin,
    D: DelayNs,
    W: Write,
{
    console.line("  Setting HIGH...");
    pin.set_high().map_err(ProbeError::pin)?;
    delay.delay_ms(hold_ms);

    console.line("  Setting LOW...");
    pin.set_low().map_err(ProbeError::pin)?;
    delay.delay_ms(hold_ms);
    Ok(())
}

//! Write/read-back check of the CONFIG register with manual CSN framing.
use super::{ProbeKind, ProbeOutcome};
use crate::board::{Board, Lines};
use crate::config::WiretestConfig;
use crate::error::ProbeError;
use crate::nrf24::{power_cycle, Nrf24Link, PowerCheck};
use crate::report::Console;
use std::io::Write;

/// Runs the presence probe.
///
/// Passes only if the `PWR_UP` bit written to CONFIG reads back set. Lines and session are
/// released when this returns, and a failed acquisition releases only what was acquired.
pub fn run<B: Board, W: Write>(
    board: &mut B,
    config: &WiretestConfig,
    console: &mut Console<W>,
) -> ProbeOutcome {
    console.heading("Testing NRF24 Module Presence");
    match check(board, config) {
        Ok(check) => {
            console.line(format_args!("CONFIG register value: 0x{:02X}", check.config));
            let detail = format!("CONFIG read back 0x{:02X}", check.config);
            if check.powered_up() {
                console.line("✓ NRF24 module is responding correctly!");
                ProbeOutcome::pass(ProbeKind::Presence, detail)
            } else {
                console.line("✗ NRF24 module not responding as expected");
                ProbeOutcome::fail(ProbeKind::Presence, detail)
            }
        }
        Err(e) => {
            console.line(format_args!("✗ Error: {}", e));
            ProbeOutcome::fail(ProbeKind::Presence, e.to_string())
        }
    }
}

fn check<B: Board>(board: &mut B, config: &WiretestConfig) -> Result<PowerCheck, ProbeError> {
    let Lines { ce, csn } = board
        .claim_lines(config.wiring())
        .map_err(ProbeError::unavailable)?;
    let spi = board
        .open_spi(config.spi())
        .map_err(ProbeError::unavailable)?;
    let mut delay = board.delay();

    let mut link = Nrf24Link::new(spi, ce, csn)?;
    Ok(power_cycle(&mut link, &mut delay, config.settle_delays())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettleDelays;
    use crate::sim::{Event, Fault, SimBoard};
    use std::time::Duration;

    fn run_on(board: &mut SimBoard) -> (ProbeOutcome, String) {
        let mut console = Console::new(Vec::new());
        let outcome = run(board, &WiretestConfig::default(), &mut console);
        (outcome, String::from_utf8(console.into_inner()).unwrap())
    }

    #[test]
    fn responsive_module_passes() {
        let mut board = SimBoard::new(Fault::None);
        let (outcome, text) = run_on(&mut board);

        assert!(outcome.passed());
        assert!(text.contains("CONFIG register value: 0x02"));
        assert!(text.contains("✓ NRF24 module is responding correctly!"));
        assert_eq!(board.register(0x00), 0x02);
        assert_eq!(board.level(8), Some(true));
        assert_eq!(board.level(22), Some(false));
        assert!(board.elapsed_ms() >= 15);
        assert_eq!((board.open_sessions(), board.claimed_lines()), (0, 0));
    }

    #[test]
    fn settle_delays_sit_between_the_writes_and_the_read() {
        let mut board = SimBoard::new(Fault::None);
        let (outcome, _) = run_on(&mut board);

        assert!(outcome.passed());
        assert_eq!(
            board.events(),
            [
                Event::Frame(vec![0x20, 0x00]),
                Event::Wait(Duration::from_millis(10)),
                Event::Frame(vec![0x20, 0x02]),
                Event::Wait(Duration::from_millis(5)),
                Event::Frame(vec![0x00, 0xFF]),
            ]
        );
    }

    #[test]
    fn configured_settle_delays_are_used() {
        let mut board = SimBoard::new(Fault::None);
        let config = WiretestConfig::default().timing(SettleDelays {
            power_down_ms: 15,
            power_up_ms: 7,
            ..SettleDelays::default()
        });
        let outcome = run(&mut board, &config, &mut Console::new(Vec::new()));

        assert!(outcome.passed());
        let waits: Vec<_> = board
            .events()
            .into_iter()
            .filter(|event| matches!(event, Event::Wait(_)))
            .collect();
        assert_eq!(
            waits,
            [
                Event::Wait(Duration::from_millis(15)),
                Event::Wait(Duration::from_millis(7)),
            ]
        );
    }

    #[test]
    fn stuck_power_bit_fails() {
        let mut board = SimBoard::new(Fault::StuckPowerBit);
        let (outcome, text) = run_on(&mut board);

        assert!(!outcome.passed());
        assert!(text.contains("CONFIG register value: 0x00"));
        assert!(text.contains("module not responding as expected"));
    }

    #[test]
    fn grounded_miso_fails() {
        let mut board = SimBoard::new(Fault::GroundedMiso);
        let (outcome, _) = run_on(&mut board);
        assert!(!outcome.passed());
    }

    #[test]
    fn dead_bus_fails_without_leaking_handles() {
        let mut board = SimBoard::new(Fault::DeadBus);
        let (outcome, text) = run_on(&mut board);

        assert!(!outcome.passed());
        assert!(text.contains("✗ Error: SPI transfer failed"));
        assert_eq!(board.level(8), Some(true));
        assert_eq!((board.open_sessions(), board.claimed_lines()), (0, 0));
    }

    #[test]
    fn failed_open_only_releases_the_lines() {
        let mut board = SimBoard::new(Fault::NoSpi);
        let (outcome, text) = run_on(&mut board);

        assert!(!outcome.passed());
        assert!(text.contains("✗ Error: SPI device unavailable"));
        assert_eq!((board.open_sessions(), board.claimed_lines()), (0, 0));
    }
}

use embedded_hal::spi::SpiBus;
use nrf24_wiretest::board::{Board, Lines};
use nrf24_wiretest::config::WiretestConfig;
use nrf24_wiretest::probe::{self, presence, ProbeKind, Verdict};
use nrf24_wiretest::register_acces::Register;
use nrf24_wiretest::report::{Console, Summary};
use nrf24_wiretest::sim::{Event, Fault, SimBoard};
use std::time::Duration;
use nrf24_wiretest::{power_cycle, Nrf24Link};

fn full_run(fault: Fault) -> (Summary, String, SimBoard) {
    let mut board = SimBoard::new(fault);
    let mut console = Console::new(Vec::new());
    let summary = probe::run_all(&mut board, &WiretestConfig::default(), &mut console);
    summary.render(&mut console);
    (summary, String::from_utf8(console.into_inner()).unwrap(), board)
}

#[test]
fn healthy_module_passes_everything() {
    let (summary, text, board) = full_run(Fault::None);

    assert_eq!((summary.passed(), summary.total()), (3, 3));
    assert_eq!(summary.exit_status(), 0);
    assert!(text.contains("Tests passed: 3/3"));
    assert_eq!((board.open_sessions(), board.claimed_lines()), (0, 0));

    let kinds: Vec<_> = summary.outcomes().iter().map(|o| o.kind).collect();
    assert_eq!(kinds, [ProbeKind::Gpio, ProbeKind::Spi, ProbeKind::Presence]);
}

#[test]
fn sections_print_in_order() {
    let (_, text, _) = full_run(Fault::None);
    let gpio = text.find("=== Testing GPIO Setup ===").unwrap();
    let spi = text.find("=== Testing SPI Communication ===").unwrap();
    let presence = text.find("=== Testing NRF24 Module Presence ===").unwrap();
    let tally = text.find("Tests passed:").unwrap();
    assert!(gpio < spi && spi < presence && presence < tally);
}

#[test]
fn power_up_sequence_reads_back_pwr_up() {
    let mut board = SimBoard::new(Fault::None);
    let config = WiretestConfig::default();
    let Lines { ce, csn } = board.claim_lines(config.wiring()).unwrap();
    let spi = board.open_spi(config.spi()).unwrap();
    let mut delay = board.delay();

    let mut link = Nrf24Link::new(spi, ce, csn).unwrap();
    let check = power_cycle(&mut link, &mut delay, config.settle_delays()).unwrap();

    assert_eq!(check.config, 0x02);
    assert_eq!(check.config & 0x02, 0x02);
    assert!(check.powered_up());
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
fn presence_alone_contributes_one_of_one() {
    let mut board = SimBoard::new(Fault::None);
    let mut console = Console::new(Vec::new());
    let outcome = presence::run(&mut board, &WiretestConfig::default(), &mut console);
    assert_eq!(outcome.verdict, Verdict::Pass);

    let summary = Summary::new(vec![outcome]);
    summary.render(&mut console);
    let text = String::from_utf8(console.into_inner()).unwrap();
    assert_eq!((summary.passed(), summary.total()), (1, 1));
    assert!(text.contains("Tests passed: 1/1"));
    assert!(text.contains("All tests passed"));
    assert_eq!(summary.exit_status(), Summary::EXIT_PASSED);
}

#[test]
fn module_that_never_powers_up_fails_presence() {
    let (summary, text, _) = full_run(Fault::StuckPowerBit);

    let presence = &summary.outcomes()[2];
    assert_eq!(presence.verdict, Verdict::Fail);
    assert!(text.contains("✗ NRF24 module not responding as expected"));
    assert!(text.contains("Tests passed: 2/3"));
    assert_eq!(summary.exit_status(), 1);
}

#[test]
fn floating_miso_warns_in_spi_probe_but_passes_it() {
    let (summary, text, _) = full_run(Fault::FloatingMiso);

    let spi = &summary.outcomes()[1];
    assert_eq!(spi.verdict, Verdict::Warn);
    assert!(spi.passed());
    assert!(text.contains("CONFIG register: 0xFF"));
    assert!(text.contains("⚠ Possible issue: Check NRF24 power and connections"));
}

#[test]
fn dead_bus_fails_spi_probes_and_cleans_up() {
    let (summary, text, board) = full_run(Fault::DeadBus);

    let verdicts: Vec<_> = summary.outcomes().iter().map(|o| o.verdict).collect();
    assert_eq!(verdicts, [Verdict::Pass, Verdict::Fail, Verdict::Fail]);
    assert!(text.contains("Some tests failed"));
    assert_eq!((board.open_sessions(), board.claimed_lines()), (0, 0));
    assert_eq!(board.level(8), Some(true));
}

#[test]
fn missing_gpio_and_spi_fail_without_secondary_errors() {
    let (summary, _, board) = full_run(Fault::NoGpio);
    assert_eq!(summary.outcomes()[0].verdict, Verdict::Fail);
    assert_eq!(summary.outcomes()[2].verdict, Verdict::Fail);
    assert_eq!((board.open_sessions(), board.claimed_lines()), (0, 0));

    let (summary, text, board) = full_run(Fault::NoSpi);
    assert_eq!(summary.passed(), 1);
    assert!(text.contains("✗ Error: SPI device unavailable (simulated)"));
    assert_eq!((board.open_sessions(), board.claimed_lines()), (0, 0));
}

#[test]
fn writes_read_back_across_sessions() {
    let mut board = SimBoard::new(Fault::None);
    let config = WiretestConfig::default();
    for (register, value) in [(Register::RF_CH, 0x28), (Register::SETUP_RETR, 0x5F)] {
        let mut spi = board.open_spi(config.spi()).unwrap();
        spi.transfer_in_place(&mut [0x20 | register.addr(), value]).unwrap();
        drop(spi);

        let mut spi = board.open_spi(config.spi()).unwrap();
        let mut read = [register.addr(), 0xFF];
        spi.transfer_in_place(&mut read).unwrap();
        assert_eq!(read[1], value);
    }
}

use clap::{Parser, ValueEnum};
use log::debug;
use nrf24_wiretest::config::{SettleDelays, WiretestConfig};
use nrf24_wiretest::probe;
use nrf24_wiretest::report::{Console, Summary};
use nrf24_wiretest::sim::{Fault, SimBoard};
use std::io::{self, Stdout};
use std::process::ExitCode;

/// Exit status when no board is available to run against.
const EXIT_NO_BOARD: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Checks the wiring of an nRF24L01+ module", long_about = None)]
struct Args {
    /// BCM number of the CE line
    #[arg(long, default_value_t = 22)]
    ce_pin: u8,

    /// BCM number of the CSN line
    #[arg(long, default_value_t = 8)]
    csn_pin: u8,

    /// SPI bus
    #[arg(long, default_value_t = 0)]
    bus: u8,

    /// SPI chip select channel
    #[arg(long, default_value_t = 0)]
    channel: u8,

    /// SPI clock in Hz
    #[arg(long, default_value_t = 10_000_000)]
    clock_hz: u32,

    /// How long each level is held during the GPIO test, in ms
    #[arg(long, default_value_t = 500)]
    hold_ms: u32,

    /// Fail the SPI test on a 0x00/0xFF CONFIG read instead of warning
    #[arg(long)]
    strict: bool,

    /// Run against a simulated module instead of the hardware
    #[arg(long, value_enum)]
    simulate: Option<SimulatedFault>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SimulatedFault {
    Healthy,
    StuckPowerBit,
    GroundedMiso,
    FloatingMiso,
    DeadBus,
    NoGpio,
    NoSpi,
}

impl From<SimulatedFault> for Fault {
    fn from(fault: SimulatedFault) -> Self {
        match fault {
            SimulatedFault::Healthy => Fault::None,
            SimulatedFault::StuckPowerBit => Fault::StuckPowerBit,
            SimulatedFault::GroundedMiso => Fault::GroundedMiso,
            SimulatedFault::FloatingMiso => Fault::FloatingMiso,
            SimulatedFault::DeadBus => Fault::DeadBus,
            SimulatedFault::NoGpio => Fault::NoGpio,
            SimulatedFault::NoSpi => Fault::NoSpi,
        }
    }
}

impl Args {
    fn config(&self) -> WiretestConfig {
        WiretestConfig::default()
            .ce_pin(self.ce_pin)
            .csn_pin(self.csn_pin)
            .spi_bus(self.bus)
            .spi_channel(self.channel)
            .clock_hz(self.clock_hz)
            .timing(SettleDelays {
                toggle_hold_ms: self.hold_ms,
                ..SettleDelays::default()
            })
            .strict_spi(self.strict)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    debug!("{:?}", args);

    let config = args.config();
    let mut console = Console::new(io::stdout());
    console.banner(&config);

    let summary = match args.simulate {
        Some(fault) => {
            console.line(format_args!("\n(simulated module: {:?})", fault));
            probe::run_all(&mut SimBoard::new(fault.into()), &config, &mut console)
        }
        None => match hardware_run(&config, &mut console) {
            Some(summary) => summary,
            None => return ExitCode::from(EXIT_NO_BOARD),
        },
    };

    summary.render(&mut console);
    ExitCode::from(summary.exit_status())
}

#[cfg(feature = "pi-hardware")]
fn hardware_run(config: &WiretestConfig, console: &mut Console<Stdout>) -> Option<Summary> {
    use nrf24_wiretest::host;
    use nrf24_wiretest::rppal_board::RppalBoard;

    if !host::is_privileged() {
        console.line("\n⚠ Warning: Running without root privileges.");
        console.line("If tests fail, try: sudo nrf24-wiretest");
    }
    if !host::spi_device_present(config.spi()) {
        console.line(format_args!(
            "\n⚠ Warning: {} not found. Is SPI enabled (sudo raspi-config)?",
            config.spi().device_path().display()
        ));
    }
    Some(probe::run_all(&mut RppalBoard::new(), config, console))
}

#[cfg(not(feature = "pi-hardware"))]
fn hardware_run(_config: &WiretestConfig, _console: &mut Console<Stdout>) -> Option<Summary> {
    log::error!("built without the pi-hardware feature, use --simulate");
    None
}

//! A simulated nRF24L01+ on a simulated board.
//!
//! Used for dry runs (`--simulate`) and as the test double for the probes. The chip keeps a
//! register file that survives across SPI sessions, and the board counts open sessions, claimed
//! lines and time spent in delays so release and settle behaviour can be checked.
use crate::board::{Board, Lines};
use crate::config::{SpiSettings, Wiring};
use crate::hal::delay::DelayNs;
use crate::hal::digital::{self, OutputPin};
use crate::hal::spi::{self, ErrorKind, SpiBus};
use crate::register_acces::{Instruction, Register, ADDR_MASK, PWR_UP};
use core::convert::Infallible;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

/// Fault injected into the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    /// A healthy, correctly wired module.
    #[default]
    None,
    /// CONFIG never keeps the `PWR_UP` bit, like a module that is not really powered.
    StuckPowerBit,
    /// MISO tied to ground: every byte reads `0x00`.
    GroundedMiso,
    /// MISO disconnected: every byte reads `0xFF`.
    FloatingMiso,
    /// Every transfer fails.
    DeadBus,
    /// The GPIO lines cannot be claimed.
    NoGpio,
    /// The SPI device cannot be opened.
    NoSpi,
}

/// Errors raised by the simulated board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// Injected by [`Fault::NoGpio`].
    #[error("GPIO unavailable (simulated)")]
    NoGpio,
    /// Injected by [`Fault::NoSpi`].
    #[error("SPI device unavailable (simulated)")]
    NoSpi,
    /// Injected by [`Fault::DeadBus`].
    #[error("no response on the bus (simulated)")]
    BusFault,
}

impl spi::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Something the chip saw, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One chip select frame, as clocked out on MOSI.
    Frame(Vec<u8>),
    /// Time spent in delays between frames. Back to back delays are merged.
    Wait(Duration),
}

const REGISTER_COUNT: usize = 32;

/// STATUS bits cleared by writing 1: RX_DR, TX_DS, MAX_RT.
const STATUS_IRQ_MASK: u8 = 0x70;

/// Power-on reset values of the single byte registers.
const RESET_VALUES: [(Register, u8); 9] = [
    (Register::CONFIG, 0x08),
    (Register::EN_AA, 0x3F),
    (Register::EN_RXADDR, 0x03),
    (Register::SETUP_AW, 0x03),
    (Register::SETUP_RETR, 0x03),
    (Register::RF_CH, 0x02),
    (Register::RF_SETUP, 0x0E),
    (Register::STATUS, 0x0E),
    (Register::FIFO_STATUS, 0x11),
];

#[derive(Debug)]
struct Chip {
    fault: Fault,
    registers: [u8; REGISTER_COUNT],
    levels: HashMap<u8, bool>,
    open_sessions: usize,
    claimed_lines: usize,
    elapsed_ns: u64,
    events: Vec<Event>,
}

impl Chip {
    fn new(fault: Fault) -> Self {
        let mut registers = [0; REGISTER_COUNT];
        for (register, value) in RESET_VALUES {
            registers[register.addr() as usize] = value;
        }
        Self {
            fault,
            registers,
            levels: HashMap::new(),
            open_sessions: 0,
            claimed_lines: 0,
            elapsed_ns: 0,
            events: Vec::new(),
        }
    }

    /// Clocks one chip select frame. `buf` holds MOSI on entry and MISO on return.
    fn clock(&mut self, buf: &mut [u8]) -> Result<(), SimError> {
        self.events.push(Event::Frame(buf.to_vec()));
        match self.fault {
            Fault::DeadBus => return Err(SimError::BusFault),
            Fault::GroundedMiso => {
                buf.fill(0x00);
                return Ok(());
            }
            Fault::FloatingMiso => {
                buf.fill(0xFF);
                return Ok(());
            }
            _ => {}
        }
        let Some((&command, payload)) = buf.split_first() else {
            return Ok(());
        };
        let status = self.registers[Register::STATUS.addr() as usize];
        let addr = (command & ADDR_MASK) as usize;

        let data = if command == Instruction::NOP.opcode() {
            0x00
        } else if command & !ADDR_MASK == Instruction::WR.opcode() {
            if let Some(&value) = payload.first() {
                self.write(addr, value);
            }
            0x00
        } else if command & !ADDR_MASK == Instruction::RR.opcode() {
            self.registers[addr]
        } else {
            0x00
        };

        buf[0] = status;
        buf[1..].fill(data);
        Ok(())
    }

    fn write(&mut self, addr: usize, value: u8) {
        let register = &mut self.registers[addr];
        if addr == Register::STATUS.addr() as usize {
            *register &= !(value & STATUS_IRQ_MASK);
        } else if addr == Register::CONFIG.addr() as usize && self.fault == Fault::StuckPowerBit {
            *register = value & !PWR_UP;
        } else {
            *register = value;
        }
    }

    fn wait(&mut self, ns: u32) {
        if ns == 0 {
            return;
        }
        self.elapsed_ns += u64::from(ns);
        let ns = Duration::from_nanos(u64::from(ns));
        match self.events.last_mut() {
            Some(Event::Wait(total)) => *total += ns,
            _ => self.events.push(Event::Wait(ns)),
        }
    }
}

/// A board with one simulated module attached.
///
/// # Examples
/// ```
/// use nrf24_wiretest::config::WiretestConfig;
/// use nrf24_wiretest::probe;
/// use nrf24_wiretest::report::Console;
/// use nrf24_wiretest::sim::{Fault, SimBoard};
///
/// let mut board = SimBoard::new(Fault::GroundedMiso);
/// let mut console = Console::new(Vec::new());
/// let summary = probe::run_all(&mut board, &WiretestConfig::default(), &mut console);
/// assert_eq!(summary.passed(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SimBoard {
    chip: Rc<RefCell<Chip>>,
}

impl SimBoard {
    /// A board with a fresh chip and the given fault.
    pub fn new(fault: Fault) -> Self {
        Self {
            chip: Rc::new(RefCell::new(Chip::new(fault))),
        }
    }

    /// Current content of a register.
    pub fn register(&self, addr: u8) -> u8 {
        self.chip.borrow().registers[(addr & ADDR_MASK) as usize]
    }

    /// Last level driven on a line, `None` if it was never driven.
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.chip.borrow().levels.get(&pin).copied()
    }

    /// SPI sessions not yet dropped.
    pub fn open_sessions(&self) -> usize {
        self.chip.borrow().open_sessions
    }

    /// Lines not yet dropped.
    pub fn claimed_lines(&self) -> usize {
        self.chip.borrow().claimed_lines
    }

    /// Total time requested from delays handed out by this board.
    pub fn elapsed_ms(&self) -> u64 {
        self.chip.borrow().elapsed_ns / 1_000_000
    }

    /// Frames and waits seen so far, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.chip.borrow().events.clone()
    }
}

impl Board for SimBoard {
    type Spi = SimSpi;
    type Pin = SimPin;
    type Delay = SimDelay;
    type Error = SimError;

    fn claim_lines(&mut self, wiring: &Wiring) -> Result<Lines<SimPin>, SimError> {
        if self.chip.borrow().fault == Fault::NoGpio {
            return Err(SimError::NoGpio);
        }
        let mut ce = SimPin::claim(&self.chip, wiring.ce_pin());
        let mut csn = SimPin::claim(&self.chip, wiring.csn_pin());
        ce.drive(false);
        csn.drive(true);
        Ok(Lines { ce, csn })
    }

    fn open_spi(&mut self, settings: &SpiSettings) -> Result<SimSpi, SimError> {
        if self.chip.borrow().fault == Fault::NoSpi {
            return Err(SimError::NoSpi);
        }
        debug!("sim: open {}", settings.device_path().display());
        self.chip.borrow_mut().open_sessions += 1;
        Ok(SimSpi {
            chip: Rc::clone(&self.chip),
        })
    }

    fn delay(&mut self) -> SimDelay {
        SimDelay {
            chip: Rc::clone(&self.chip),
        }
    }
}

/// An open session on the simulated bus. Each transfer is one chip select frame.
#[derive(Debug)]
pub struct SimSpi {
    chip: Rc<RefCell<Chip>>,
}

impl Drop for SimSpi {
    fn drop(&mut self) {
        self.chip.borrow_mut().open_sessions -= 1;
    }
}

impl spi::ErrorType for SimSpi {
    type Error = SimError;
}

impl SpiBus<u8> for SimSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), SimError> {
        words.fill(0x00);
        self.chip.borrow_mut().clock(words)
    }

    fn write(&mut self, words: &[u8]) -> Result<(), SimError> {
        let mut buf = words.to_vec();
        self.chip.borrow_mut().clock(&mut buf)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), SimError> {
        let mut buf = write.to_vec();
        buf.resize(read.len().max(write.len()), 0x00);
        self.chip.borrow_mut().clock(&mut buf)?;
        let n = read.len();
        read.copy_from_slice(&buf[..n]);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), SimError> {
        self.chip.borrow_mut().clock(words)
    }

    fn flush(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}

/// A claimed simulated output line.
#[derive(Debug)]
pub struct SimPin {
    chip: Rc<RefCell<Chip>>,
    pin: u8,
}

impl SimPin {
    fn claim(chip: &Rc<RefCell<Chip>>, pin: u8) -> Self {
        chip.borrow_mut().claimed_lines += 1;
        Self {
            chip: Rc::clone(chip),
            pin,
        }
    }

    fn drive(&mut self, high: bool) {
        self.chip.borrow_mut().levels.insert(self.pin, high);
    }
}

impl Drop for SimPin {
    fn drop(&mut self) {
        self.chip.borrow_mut().claimed_lines -= 1;
    }
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

/// Delay that returns immediately and records the requested time.
#[derive(Debug)]
pub struct SimDelay {
    chip: Rc<RefCell<Chip>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.chip.borrow_mut().wait(ns);
    }
}

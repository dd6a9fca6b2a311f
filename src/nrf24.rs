//! Register access over a manually framed SPI bus.

use crate::config::SettleDelays;
use crate::error::TransferError;
use crate::hal::delay::DelayNs;
use crate::hal::digital::OutputPin;
use crate::hal::spi::SpiBus;
use crate::register_acces::{Instruction, Register, PWR_UP};
use crate::status::Status;
use core::fmt;
use log::debug;

/// Register level link to an nRF24L01+.
///
/// Owns the bus and both control lines. Every transaction is framed by driving CSN low before
/// clocking and high afterwards, so CSN idles high between transactions.
///
/// # Examples
/// ```
/// use nrf24_wiretest::board::{Board, Lines};
/// use nrf24_wiretest::config::WiretestConfig;
/// use nrf24_wiretest::register_acces::Register;
/// use nrf24_wiretest::sim::{Fault, SimBoard};
/// use nrf24_wiretest::Nrf24Link;
///
/// let config = WiretestConfig::default();
/// let mut board = SimBoard::new(Fault::None);
/// let Lines { ce, csn } = board.claim_lines(config.wiring()).unwrap();
/// let spi = board.open_spi(config.spi()).unwrap();
///
/// let mut link = Nrf24Link::new(spi, ce, csn).unwrap();
/// link.write_register(Register::RF_CH, 76).unwrap();
/// assert_eq!(link.read_register(Register::RF_CH).unwrap(), 76);
/// ```
pub struct Nrf24Link<SPI, CE, NCS> {
    spi: SPI,
    // SPI Chip Select Pin, active low
    ncs: NCS,
    // Chip Enable Pin
    ce: CE,
    // Command byte followed by at most one data byte
    tx_buf: [u8; 2],
}

impl<SPI, CE, NCS, SPIErr, PinErr> Nrf24Link<SPI, CE, NCS>
where
    SPI: SpiBus<u8, Error = SPIErr>,
    NCS: OutputPin<Error = PinErr>,
    CE: OutputPin<Error = PinErr>,
{
    /// Takes ownership of the bus and lines and puts the lines in their idle state:
    /// CE low so the radio stays in standby, CSN high.
    pub fn new(spi: SPI, ce: CE, ncs: NCS) -> Result<Self, TransferError<SPIErr, PinErr>> {
        let mut link = Nrf24Link {
            spi,
            ncs,
            ce,
            tx_buf: [0; 2],
        };
        link.ce.set_low().map_err(TransferError::Pin)?;
        link.ncs.set_high().map_err(TransferError::Pin)?;
        Ok(link)
    }

    /// Reads the status register from device with a NOP. See [`Status`].
    pub fn status(&mut self) -> Result<Status, TransferError<SPIErr, PinErr>> {
        self.tx_buf[0] = Instruction::NOP.opcode();
        let r = self.transfer_tx_buf(1)?;
        Ok(Status::from(r[0]))
    }

    /// Writes a single byte register.
    ///
    /// Returns the status shifted out while the command byte was clocked.
    pub fn write_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<Status, TransferError<SPIErr, PinErr>> {
        self.tx_buf = [Instruction::WR.opcode() | register.addr(), value];
        let r = self.transfer_tx_buf(2)?;
        Ok(Status::from(r[0]))
    }

    /// Reads a single byte register. The status byte shifted out first is discarded.
    pub fn read_register(
        &mut self,
        register: Register,
    ) -> Result<u8, TransferError<SPIErr, PinErr>> {
        self.tx_buf = [
            Instruction::RR.opcode() | register.addr(),
            Instruction::NOP.opcode(),
        ];
        Ok(self.transfer_tx_buf(2)?[1])
    }

    /// Gives back the bus and both lines.
    pub fn release(self) -> (SPI, CE, NCS) {
        (self.spi, self.ce, self.ncs)
    }

    /// Clocks the first `len` bytes of the tx buffer inside one CSN frame and returns what the
    /// chip shifted out in their place.
    ///
    /// CSN is driven high again even if the transfer fails.
    fn transfer_tx_buf(&mut self, len: usize) -> Result<&[u8], TransferError<SPIErr, PinErr>> {
        debug!("nrf24 >> {:02X?}", &self.tx_buf[..len]);
        self.ncs.set_low().map_err(TransferError::Pin)?;
        let clocked = match self.spi.transfer_in_place(&mut self.tx_buf[..len]) {
            Ok(()) => self.spi.flush(),
            Err(e) => Err(e),
        };
        let released = self.ncs.set_high();
        clocked.map_err(TransferError::Spi)?;
        released.map_err(TransferError::Pin)?;
        debug!("nrf24 << {:02X?}", &self.tx_buf[..len]);
        Ok(&self.tx_buf[..len])
    }
}

impl<SPI, CE, NCS> fmt::Debug for Nrf24Link<SPI, CE, NCS>
where
    SPI: fmt::Debug,
    CE: fmt::Debug,
    NCS: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nrf24Link")
            .field("spi", &self.spi)
            .field("ncs", &self.ncs)
            .field("ce", &self.ce)
            .field("tx_buf", &self.tx_buf)
            .finish()
    }
}

/// Result of a power-down / power-up / read-back cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PowerCheck {
    /// CONFIG as read back after powering up.
    pub config: u8,
}

impl PowerCheck {
    /// `true` if the `PWR_UP` bit written before the read is observable.
    pub fn powered_up(&self) -> bool {
        self.config & PWR_UP != 0
    }
}

/// Powers the chip down, powers it up again and reads CONFIG back.
///
/// A read of power-on defaults cannot tell a working bus from one that returns a fixed
/// value which happens to match. Writing a bit and seeing it come back can.
pub fn power_cycle<SPI, CE, NCS, D, SPIErr, PinErr>(
    link: &mut Nrf24Link<SPI, CE, NCS>,
    delay: &mut D,
    timing: &SettleDelays,
) -> Result<PowerCheck, TransferError<SPIErr, PinErr>>
where
    SPI: SpiBus<u8, Error = SPIErr>,
    NCS: OutputPin<Error = PinErr>,
    CE: OutputPin<Error = PinErr>,
    D: DelayNs,
{
    link.write_register(Register::CONFIG, 0x00)?;
    delay.delay_ms(timing.power_down_ms);

    link.write_register(Register::CONFIG, PWR_UP)?;
    delay.delay_ms(timing.power_up_ms);

    let config = link.read_register(Register::CONFIG)?;
    Ok(PowerCheck { config })
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State, Transaction as PinTransaction},
        spi::{Mock as SpiMock, Transaction as SpiTransaction},
    };

    fn frame(expected: Vec<u8>, response: Vec<u8>) -> [SpiTransaction<u8>; 2] {
        [
            SpiTransaction::transfer_in_place(expected, response),
            SpiTransaction::flush(),
        ]
    }

    fn csn_frames(count: usize) -> Vec<PinTransaction> {
        let mut expectations = vec![PinTransaction::set(State::High)];
        for _ in 0..count {
            expectations.push(PinTransaction::set(State::Low));
            expectations.push(PinTransaction::set(State::High));
        }
        expectations
    }

    #[test]
    fn power_cycle_writes_then_reads_config() {
        let spi_expectations: Vec<_> = [
            frame(vec![0x20, 0x00], vec![0x0E, 0x00]),
            frame(vec![0x20, 0x02], vec![0x0E, 0x00]),
            frame(vec![0x00, 0xFF], vec![0x0E, 0x02]),
        ]
        .concat();
        let mut spi = SpiMock::new(&spi_expectations);
        let mut ce = PinMock::new(&[PinTransaction::set(State::Low)]);
        let mut ncs = PinMock::new(&csn_frames(3));

        let mut link = Nrf24Link::new(spi.clone(), ce.clone(), ncs.clone()).unwrap();
        let check = power_cycle(&mut link, &mut NoopDelay, &SettleDelays::default()).unwrap();

        assert_eq!(check.config & PWR_UP, PWR_UP);
        assert!(check.powered_up());

        spi.done();
        ce.done();
        ncs.done();
    }

    #[test]
    fn unset_power_bit_is_reported_not_raised() {
        let spi_expectations: Vec<_> = [
            frame(vec![0x20, 0x00], vec![0x0E, 0x00]),
            frame(vec![0x20, 0x02], vec![0x0E, 0x00]),
            frame(vec![0x00, 0xFF], vec![0x0E, 0x08]),
        ]
        .concat();
        let mut spi = SpiMock::new(&spi_expectations);
        let mut ce = PinMock::new(&[PinTransaction::set(State::Low)]);
        let mut ncs = PinMock::new(&csn_frames(3));

        let mut link = Nrf24Link::new(spi.clone(), ce.clone(), ncs.clone()).unwrap();
        let check = power_cycle(&mut link, &mut NoopDelay, &SettleDelays::default()).unwrap();

        assert_eq!(check, PowerCheck { config: 0x08 });
        assert!(!check.powered_up());

        spi.done();
        ce.done();
        ncs.done();
    }

    #[test]
    fn status_is_a_single_nop_byte() {
        let mut spi = SpiMock::new(&frame(vec![0xFF], vec![0x0E]));
        let mut ce = PinMock::new(&[PinTransaction::set(State::Low)]);
        let mut ncs = PinMock::new(&csn_frames(1));

        let mut link = Nrf24Link::new(spi.clone(), ce.clone(), ncs.clone()).unwrap();
        let status = link.status().unwrap();
        assert_eq!(status.raw(), 0x0E);

        let (_spi, _ce, _ncs) = link.release();
        spi.done();
        ce.done();
        ncs.done();
    }

    #[test]
    fn write_register_puts_address_in_command_byte() {
        let mut spi = SpiMock::new(&frame(vec![0x25, 0x4C], vec![0x0E, 0x00]));
        let mut ce = PinMock::new(&[PinTransaction::set(State::Low)]);
        let mut ncs = PinMock::new(&csn_frames(1));

        let mut link = Nrf24Link::new(spi.clone(), ce.clone(), ncs.clone()).unwrap();
        link.write_register(Register::RF_CH, 0x4C).unwrap();

        spi.done();
        ce.done();
        ncs.done();
    }
}

//! The STATUS byte the chip shifts out first in every SPI transaction.
use core::fmt;

/// Decoded STATUS register.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Status(u8);

impl Status {
    /// Bit 7 is reserved and always reads as 0 on a responding chip.
    pub fn is_valid(&self) -> bool {
        (self.0 & (1 << 7)) == 0
    }
    /// RX_DR interrupt flag.
    pub fn data_ready(&self) -> bool {
        (self.0 & (1 << 6)) != 0
    }
    /// TX_DS interrupt flag.
    pub fn data_sent(&self) -> bool {
        (self.0 & (1 << 5)) != 0
    }
    /// MAX_RT interrupt flag.
    pub fn reached_max_retries(&self) -> bool {
        (self.0 & (1 << 4)) != 0
    }
    /// Pipe number of the payload at the head of the RX FIFO. 7 means the FIFO is empty.
    pub fn rx_pipe(&self) -> u8 {
        (self.0 >> 1) & 0b111
    }
    /// TX FIFO full flag.
    pub fn tx_full(&self) -> bool {
        (self.0 & 0b1) != 0
    }
    /// The raw byte.
    pub fn raw(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Status {
    fn from(t: u8) -> Self {
        Status(t)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "0x{:02X} (reserved bit set)", self.0);
        }
        write!(f, "0x{:02X} (", self.0)?;
        match self.rx_pipe() {
            7 => write!(f, "RX FIFO empty")?,
            pipe => write!(f, "RX pipe {}", pipe)?,
        }
        if self.data_ready() {
            write!(f, ", RX_DR")?;
        }
        if self.data_sent() {
            write!(f, ", TX_DS")?;
        }
        if self.reached_max_retries() {
            write!(f, ", MAX_RT")?;
        }
        if self.tx_full() {
            write!(f, ", TX FIFO full")?;
        }
        write!(f, ")")
    }
}

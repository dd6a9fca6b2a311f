use core::fmt;
use log::warn;
use thiserror::Error;

/// Errors that can occur during a single register transaction.
#[derive(Copy, Clone, Debug, Error)]
pub enum TransferError<SPIError, PinError> {
    /// SPI communication error
    #[error("SPI transfer failed: {0:?}")]
    Spi(SPIError),
    /// Pin set error
    #[error("pin write failed: {0:?}")]
    Pin(PinError),
}

/// Why a probe could not complete.
///
/// Probes never hand an error to their caller; this is carried as text inside a failed
/// [`ProbeOutcome`](crate::probe::ProbeOutcome) instead.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The GPIO lines or SPI session could not be acquired.
    #[error("{0}")]
    Unavailable(String),
    /// A transfer on an open SPI session failed.
    #[error("SPI transfer failed: {0}")]
    Spi(String),
    /// Driving an output line failed.
    #[error("pin write failed: {0}")]
    Pin(String),
}

impl ProbeError {
    pub(crate) fn unavailable<E: fmt::Display>(e: E) -> Self {
        warn!("acquisition failed: {}", e);
        ProbeError::Unavailable(e.to_string())
    }

    pub(crate) fn spi<E: fmt::Debug>(e: E) -> Self {
        ProbeError::Spi(format!("{:?}", e))
    }

    pub(crate) fn pin<E: fmt::Debug>(e: E) -> Self {
        ProbeError::Pin(format!("{:?}", e))
    }
}

impl<SPIError, PinError> From<TransferError<SPIError, PinError>> for ProbeError
where
    SPIError: fmt::Debug,
    PinError: fmt::Debug,
{
    fn from(e: TransferError<SPIError, PinError>) -> Self {
        match e {
            TransferError::Spi(e) => ProbeError::spi(e),
            TransferError::Pin(e) => ProbeError::pin(e),
        }
    }
}

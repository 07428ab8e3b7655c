const EIO: i32 = 5;
const ENODEV: i32 = 19;
const EINVAL: i32 = 22;

/// Failure of a single bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<I2cE> {
    /// The adapter does not advertise plain I2C transfers; nothing was sent.
    UnsupportedBus,
    /// The transfer was attempted and failed (NACK, arbitration loss,
    /// timeout, ...).
    IoFailure(I2cE),
}

impl<I2cE> TransportError<I2cE> {
    pub fn errno(&self) -> i32 {
        match self {
            TransportError::UnsupportedBus => -ENODEV,
            TransportError::IoFailure(_) => -EIO,
        }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for TransportError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransportError::UnsupportedBus => {
                write!(f, "bus does not support I2C transfers")
            }
            TransportError::IoFailure(err) => {
                write!(f, "I2C communication error: {:?}", err)
            }
        }
    }
}

/// Failure of a read through the device node.
///
/// The caller's buffer is left untouched whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError<I2cE> {
    DeviceError(TransportError<I2cE>),
    BufferTooSmall { needed: usize, capacity: usize },
}

impl<I2cE> ReadError<I2cE> {
    /// Negative errno a character device returns for this error.
    pub fn errno(&self) -> i32 {
        match self {
            ReadError::DeviceError(err) => err.errno(),
            ReadError::BufferTooSmall { .. } => -EINVAL,
        }
    }
}

impl<I2cE> From<TransportError<I2cE>> for ReadError<I2cE> {
    fn from(e: TransportError<I2cE>) -> Self {
        ReadError::DeviceError(e)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for ReadError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReadError::DeviceError(err) => write!(f, "Device error: {}", err),
            ReadError::BufferTooSmall { needed, capacity } => write!(
                f,
                "Buffer too small: need {} bytes, got {}",
                needed, capacity
            ),
        }
    }
}

/// The text is not of the form `<integer>.<digit>`.
#[derive(derive_more::From, Debug, Clone, PartialEq, Eq)]
pub enum ParseTemperatureError {
    Integer(core::num::ParseIntError),
    MissingPoint,
    InvalidDigit,
}

impl core::fmt::Display for ParseTemperatureError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseTemperatureError::Integer(err) => {
                write!(f, "Invalid integer part: {}", err)
            }
            ParseTemperatureError::MissingPoint => {
                write!(f, "Missing decimal point")
            }
            ParseTemperatureError::InvalidDigit => {
                write!(f, "Fraction must be a single decimal digit")
            }
        }
    }
}

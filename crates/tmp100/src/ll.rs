//! Low level bus access
use bitflags::bitflags;
use embedded_hal::i2c::{self, Error as _};

use crate::errors::TransportError;
use crate::registers::{RawReading, Register};

/// 7-bit address with A0 and A1 tied low.
pub const DEFAULT_ADDRESS: u8 = 0b1001000;

bitflags! {
    /// Transfer types an I2C adapter advertises.
    ///
    /// Values follow the Linux `I2C_FUNC_*` bits so adapter capabilities can
    /// be passed through unchanged.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Functionality: u32 {
        /// Plain I2C messages, including combined write-read transfers.
        const I2C                    = 0x0000_0001;
        const TEN_BIT_ADDR           = 0x0000_0002;
        const SMBUS_QUICK            = 0x0001_0000;
        const SMBUS_READ_BYTE        = 0x0002_0000;
        const SMBUS_READ_BYTE_DATA   = 0x0008_0000;
        const SMBUS_READ_WORD_DATA   = 0x0020_0000;
    }
}

/// Register-level access to one sensor on the bus.
///
/// Not synchronized; callers that share it wrap it in a mutex.
#[derive(Debug)]
pub struct BusPort<I2C> {
    i2c: I2C,
    address: u8,
    functionality: Functionality,
}

impl<I2C: i2c::I2c> BusPort<I2C> {
    pub const fn new(
        i2c: I2C,
        address: u8,
        functionality: Functionality,
    ) -> Self {
        Self { i2c, address, functionality }
    }

    /// Whether the adapter can run the write-read transfer a register read
    /// needs.
    pub fn supports_register_access(&self) -> bool {
        self.functionality.contains(Functionality::I2C)
    }

    /// Read one 16-bit register.
    ///
    /// Writes the register pointer and reads two bytes back in a single
    /// combined transfer. Failures are not retried.
    pub fn read_register(
        &mut self,
        reg: Register,
    ) -> Result<RawReading, TransportError<I2C::Error>> {
        if !self.supports_register_access() {
            return Err(TransportError::UnsupportedBus);
        }

        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg.addr()], &mut buf)
            .map_err(|e| {
                warn!("register {} read failed: {:?}", reg.addr(), e.kind());
                TransportError::IoFailure(e)
            })?;

        let raw = RawReading::from_be_bytes(buf);
        trace!("register {} = {:x}", reg.addr(), raw.bits());
        Ok(raw)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn functionality(&self) -> Functionality {
        self.functionality
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

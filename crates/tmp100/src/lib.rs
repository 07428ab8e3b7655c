#![no_std]
//! Driver for the TI TMP100 temperature sensor, exposed as a read-only
//! character device.
//!
//! [`Tmp100`] wraps the I2C bus and implements [`CharDevice`]: every read of
//! the node at offset 0 runs one bus transaction and returns the temperature
//! as text, e.g. `"23.8\n"`. [`Tmp100Manager`] binds it to the OS resources
//! through [`chrdev_manager::DeviceManager`].

#[macro_use]
mod fmt;

pub mod errors;
pub mod ll;
pub mod registers;

use core::cell::RefCell;

use chrdev_manager::{
    CharDevice, ChrdevConfig, DeviceManager, NodeMode, ProbeFailure,
    ReadFailure,
};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::i2c;

pub use crate::errors::{ParseTemperatureError, ReadError, TransportError};
pub use crate::ll::{BusPort, Functionality, DEFAULT_ADDRESS};
pub use crate::registers::{
    DecodedTemperature, RawReading, Register, RENDERED_MAX,
};

/// Driver name reported to the bus core.
pub const DRIVER_NAME: &str = "tmp100_i2c";

/// I2C device ids this driver binds to.
pub const I2C_DEVICE_IDS: &[&str] = &["tmp100"];

/// Device-tree compatible strings this driver binds to.
pub const OF_COMPATIBLE: &[&str] = &["TI, TMP100"];

/// Node, class and permissions of the character device.
pub const CHRDEV: ChrdevConfig = ChrdevConfig {
    name: "tmp100",
    class: "tmp100",
    mode: NodeMode::READ_ALL,
};

/// Whether a device id or compatible string names this sensor.
pub fn matches(id: &str) -> bool {
    I2C_DEVICE_IDS.contains(&id) || OF_COMPATIBLE.contains(&id)
}

/// The lifecycle manager specialized for this driver.
pub type Tmp100Manager<M, R, I2C> = DeviceManager<M, R, Tmp100<M, I2C>>;

/// Create an unattached manager using [`CHRDEV`].
pub const fn manager<M, R, I2C>(registry: R) -> Tmp100Manager<M, R, I2C>
where
    M: RawMutex,
    R: chrdev_manager::DeviceRegistry,
    I2C: i2c::I2c,
{
    DeviceManager::new(registry, CHRDEV)
}

/// Negative errno for a failed read through the manager.
pub fn read_errno<E>(failure: &ReadFailure<ReadError<E>>) -> i32 {
    failure.errno_with(ReadError::errno)
}

/// One TMP100 on an I2C bus.
///
/// Bus access is serialized by a mutex held for a single transaction, so
/// reads may come from several threads.
pub struct Tmp100<M: RawMutex, I2C> {
    port: Mutex<M, RefCell<BusPort<I2C>>>,
}

impl<M: RawMutex, I2C> core::fmt::Debug for Tmp100<M, I2C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tmp100").finish_non_exhaustive()
    }
}

impl<M: RawMutex, I2C: i2c::I2c> Tmp100<M, I2C> {
    /// `functionality` is what the bus adapter advertises.
    pub const fn new(
        i2c: I2C,
        address: u8,
        functionality: Functionality,
    ) -> Self {
        Self {
            port: Mutex::new(RefCell::new(BusPort::new(
                i2c,
                address,
                functionality,
            ))),
        }
    }

    /// Sensor at [`DEFAULT_ADDRESS`] on a plain I2C adapter.
    pub const fn with_default_address(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_ADDRESS, Functionality::I2C)
    }

    /// Read the temperature register once.
    pub fn read_raw(&self) -> Result<RawReading, TransportError<I2C::Error>> {
        self.port
            .lock(|port| port.borrow_mut().read_register(Register::Temperature))
    }

    /// Read and decode the temperature.
    pub fn read_temperature(
        &self,
    ) -> Result<DecodedTemperature, TransportError<I2C::Error>> {
        self.read_raw().map(RawReading::decode)
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.port.into_inner().into_inner().release()
    }
}

impl<M: RawMutex, I2C: i2c::I2c> CharDevice for Tmp100<M, I2C> {
    type Error = ReadError<I2C::Error>;

    fn probe(&mut self) -> Result<(), ProbeFailure> {
        let port = self.port.get_mut().get_mut();

        if !port.supports_register_access() {
            warn!("adapter lacks I2C functionality");
            return Err(ProbeFailure::BusUnsupported);
        }

        match port.read_register(Register::Temperature) {
            Ok(raw) => {
                info!(
                    "tmp100 at {:x}: raw word {:x}",
                    port.address(),
                    raw.bits()
                );
                Ok(())
            }
            Err(TransportError::UnsupportedBus) => {
                Err(ProbeFailure::BusUnsupported)
            }
            Err(TransportError::IoFailure(_)) => Err(ProbeFailure::NoDevice),
        }
    }

    fn read(
        &self,
        buf: &mut [u8],
        offset: &mut u64,
    ) -> Result<usize, Self::Error> {
        if *offset != 0 {
            return Ok(0);
        }

        let text = self.read_temperature()?.render();
        let len = text.len();
        if buf.len() < len {
            return Err(ReadError::BufferTooSmall {
                needed: len,
                capacity: buf.len(),
            });
        }

        buf[..len].copy_from_slice(text.as_bytes());
        *offset += len as u64;
        Ok(len)
    }
}

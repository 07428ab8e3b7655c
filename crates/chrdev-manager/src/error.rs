use crate::registry::ProbeFailure;

const ENODEV: i32 = 19;

/// Errors that can occur while attaching a device.
///
/// Every variant is returned only after all resources acquired by the failed
/// attach have been released again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttachError<E: core::fmt::Debug> {
    /// A device is already attached, or an attach/detach is in progress.
    AlreadyAttached,
    /// The bus lacks the capability the device needs.
    BusUnsupported,
    /// The device did not answer its probe.
    DeviceAbsent,
    /// No device-number range could be reserved.
    NumberRangeExhausted(E),
    /// The character-device binding could not be registered.
    RegistrationFailed(E),
    /// The device class could not be created.
    ClassCreationFailed(E),
    /// The device node could not be created.
    NodeCreationFailed(E),
}

impl<E: core::fmt::Debug> From<ProbeFailure> for AttachError<E> {
    fn from(failure: ProbeFailure) -> Self {
        match failure {
            ProbeFailure::BusUnsupported => AttachError::BusUnsupported,
            ProbeFailure::NoDevice => AttachError::DeviceAbsent,
        }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for AttachError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AttachError::AlreadyAttached => {
                write!(f, "a device is already attached")
            }
            AttachError::BusUnsupported => {
                write!(f, "bus does not support register transactions")
            }
            AttachError::DeviceAbsent => write!(f, "device did not respond"),
            AttachError::NumberRangeExhausted(e) => {
                write!(f, "device number allocation failed: {:?}", e)
            }
            AttachError::RegistrationFailed(e) => {
                write!(f, "character device registration failed: {:?}", e)
            }
            AttachError::ClassCreationFailed(e) => {
                write!(f, "device class creation failed: {:?}", e)
            }
            AttachError::NodeCreationFailed(e) => {
                write!(f, "device node creation failed: {:?}", e)
            }
        }
    }
}

/// Errors returned by [`DeviceManager::read`](crate::DeviceManager::read).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadFailure<E> {
    /// No device is attached, or it is being detached.
    NoDevice,
    /// The bound device failed the read.
    Device(E),
}

impl<E> ReadFailure<E> {
    /// Negative errno for the failure, given how to map device errors.
    pub fn errno_with(&self, device: impl FnOnce(&E) -> i32) -> i32 {
        match self {
            ReadFailure::NoDevice => -ENODEV,
            ReadFailure::Device(e) => device(e),
        }
    }
}

impl<E: core::fmt::Display> core::fmt::Display for ReadFailure<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReadFailure::NoDevice => write!(f, "no device attached"),
            ReadFailure::Device(e) => write!(f, "{}", e),
        }
    }
}

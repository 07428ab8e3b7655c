use core::ops::Deref;

use portable_atomic::{AtomicUsize, Ordering};

use crate::manager::Bound;
use crate::registry::{CharDevice, DevNum, DeviceRegistry};

/// RAII handle keeping the attached device alive for one read.
///
/// Dropping a handle decrements the reader count.
/// [`DeviceManager::detach`](crate::DeviceManager::detach) waits until every
/// handle is gone before releasing anything.
pub struct ReadHandle<'a, R: DeviceRegistry, D: CharDevice> {
    bound: &'a Bound<R, D>,
    readers: &'a AtomicUsize,
}

impl<R: DeviceRegistry, D: CharDevice> Deref for ReadHandle<'_, R, D> {
    type Target = D;

    #[inline]
    fn deref(&self) -> &D {
        &self.bound.device
    }
}

impl<R: DeviceRegistry, D: CharDevice> Drop for ReadHandle<'_, R, D> {
    fn drop(&mut self) {
        self.readers.fetch_sub(1, Ordering::Release);
    }
}

impl<'a, R: DeviceRegistry, D: CharDevice> ReadHandle<'a, R, D> {
    /// Create a new handle. Only called by `DeviceManager`, after it has
    /// counted the reader.
    pub(crate) fn new(
        bound: &'a Bound<R, D>,
        readers: &'a AtomicUsize,
    ) -> Self {
        Self { bound, readers }
    }

    /// Returns the bound device.
    #[inline]
    pub fn device(&self) -> &D {
        self
    }

    /// Device number of the node this handle reads through.
    pub fn dev_num(&self) -> DevNum {
        self.bound.identity.base()
    }
}

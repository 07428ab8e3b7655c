use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use grounded::uninit::GroundedCell;
use portable_atomic::{AtomicUsize, Ordering};

use crate::error::{AttachError, ReadFailure};
use crate::handle::ReadHandle;
use crate::identity::DeviceIdentity;
use crate::registry::{ChrdevConfig, CharDevice, DevNum, DeviceRegistry};

/// Lifecycle state of a [`DeviceManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lifecycle {
    /// No device bound; `attach` may be called.
    Unattached,
    /// `attach` is probing the device and acquiring resources.
    Probing,
    /// Device bound and readable.
    Attached,
    /// `detach` is waiting for readers or releasing resources.
    Detaching,
}

/// An attached device together with the resources that expose it.
pub(crate) struct Bound<R: DeviceRegistry, D: CharDevice> {
    pub(crate) identity: DeviceIdentity<R>,
    pub(crate) device: D,
}

/// Character-device lifecycle manager.
///
/// Owns at most one attached device. [`attach`](Self::attach) probes the
/// device and acquires its OS resources all-or-nothing,
/// [`read`](Self::read) dispatches to the bound device under a
/// [`ReadHandle`], and [`detach`](Self::detach) waits for in-flight reads
/// before releasing everything in reverse order.
///
/// `attach` and `detach` must not run concurrently with each other; reads may
/// run concurrently with anything.
pub struct DeviceManager<M: RawMutex, R: DeviceRegistry, D: CharDevice> {
    registry: R,
    config: ChrdevConfig,
    bound_cell: GroundedCell<Bound<R, D>>,
    state: Mutex<M, RefCell<Lifecycle>>,
    readers: AtomicUsize,
}

impl<M: RawMutex, R: DeviceRegistry, D: CharDevice> DeviceManager<M, R, D> {
    /// Create an unattached manager.
    pub const fn new(registry: R, config: ChrdevConfig) -> Self {
        Self {
            registry,
            config,
            bound_cell: GroundedCell::uninit(),
            state: Mutex::new(RefCell::new(Lifecycle::Unattached)),
            readers: AtomicUsize::new(0),
        }
    }

    /// Probe `device`, acquire its resources and bind it.
    ///
    /// Returns the device number of the new node. On failure no resource
    /// stays acquired, the manager is unattached again and the device is
    /// handed back together with the error.
    pub fn attach(
        &self,
        mut device: D,
    ) -> Result<DevNum, (AttachError<R::Error>, D)> {
        let entered = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if *state == Lifecycle::Unattached {
                *state = Lifecycle::Probing;
                true
            } else {
                false
            }
        });
        if !entered {
            return Err((AttachError::AlreadyAttached, device));
        }

        let identity = match device.probe() {
            Ok(()) => DeviceIdentity::acquire(&self.registry, &self.config),
            Err(failure) => Err(failure.into()),
        };

        match identity {
            Ok(identity) => {
                let base = identity.base();

                // SAFETY: The state is `Probing`, so no reader can obtain a
                // handle and the cell is uninit. Writing is exclusive.
                unsafe {
                    self.bound_cell.get().write(Bound { identity, device });
                }

                self.set_state(Lifecycle::Attached);
                info!(
                    "{} attached as {}:{}",
                    self.config.name,
                    base.major(),
                    base.minor()
                );
                Ok(base)
            }
            Err(err) => {
                self.set_state(Lifecycle::Unattached);
                debug!("{} attach rolled back", self.config.name);
                Err((err, device))
            }
        }
    }

    /// Unbind the device and release its resources.
    ///
    /// New reads fail with [`ReadFailure::NoDevice`] as soon as this is
    /// called; reads already in flight are waited for. Returns the device, or
    /// `None` if nothing was attached.
    ///
    /// Spins until every [`ReadHandle`] is dropped. Calling this while the
    /// current thread still holds a handle never returns.
    pub fn detach(&self) -> Option<D> {
        let entered = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if *state == Lifecycle::Attached {
                *state = Lifecycle::Detaching;
                true
            } else {
                false
            }
        });
        if !entered {
            return None;
        }

        while self.readers.load(Ordering::Acquire) > 0 {
            core::hint::spin_loop();
        }

        // SAFETY: The state is `Detaching` and the reader count drained to
        // zero, so no `ReadHandle` exists and none can be created. The cell
        // was written by `attach`, so it holds a valid value which is moved
        // out exactly once.
        let Bound { identity, device } =
            unsafe { self.bound_cell.get().read() };

        let base = identity.base();
        identity.release(&self.registry);
        self.set_state(Lifecycle::Unattached);
        info!(
            "{} detached from {}:{}",
            self.config.name,
            base.major(),
            base.minor()
        );

        Some(device)
    }

    /// Get a handle to the bound device, if one is attached.
    ///
    /// Drop the handle before calling [`detach`](Self::detach) on the same
    /// thread; `detach` waits for it.
    pub fn acquire(&self) -> Option<ReadHandle<'_, R, D>> {
        let counted = self.state.lock(|state| {
            if *state.borrow() == Lifecycle::Attached {
                self.readers.fetch_add(1, Ordering::Acquire);
                true
            } else {
                false
            }
        });
        if !counted {
            return None;
        }

        // SAFETY: The reader was counted while the state was `Attached`, so
        // the cell holds a valid value and `detach` will not move it out
        // before this handle is dropped.
        let bound = unsafe { &*(self.bound_cell.get() as *const Bound<R, D>) };
        Some(ReadHandle::new(bound, &self.readers))
    }

    /// Read from the bound device.
    pub fn read(
        &self,
        buf: &mut [u8],
        offset: &mut u64,
    ) -> Result<usize, ReadFailure<D::Error>> {
        let handle = self.acquire().ok_or(ReadFailure::NoDevice)?;
        trace!("read of {} bytes at offset {}", buf.len(), *offset);
        handle.read(buf, offset).map_err(ReadFailure::Device)
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lock(|state| *state.borrow())
    }

    /// Device number of the attached node.
    pub fn dev_num(&self) -> Option<DevNum> {
        self.acquire().map(|handle| handle.dev_num())
    }

    /// Returns the current number of read handles.
    pub fn reader_count(&self) -> usize {
        self.readers.load(Ordering::Relaxed)
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &ChrdevConfig {
        &self.config
    }

    fn set_state(&self, next: Lifecycle) {
        self.state.lock(|state| *state.borrow_mut() = next);
    }
}

impl<M: RawMutex, R: DeviceRegistry, D: CharDevice> Drop
    for DeviceManager<M, R, D>
{
    fn drop(&mut self) {
        // `&mut self` rules out live handles, so this never waits.
        let _ = self.detach();
    }
}

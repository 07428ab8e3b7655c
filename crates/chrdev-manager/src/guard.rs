use core::ops::Deref;

use crate::registry::DeviceRegistry;

type ReleaseFn<R, T> = fn(&R, T) -> Result<(), <R as DeviceRegistry>::Error>;

/// RAII guard over one freshly acquired registry resource.
///
/// Dropping the guard releases the resource. [`commit`](Self::commit) hands
/// the resource out instead. Guards declared in acquisition order therefore
/// roll back in reverse order when an attach bails out early.
pub(crate) struct Reservation<'a, R: DeviceRegistry, T> {
    registry: &'a R,
    resource: Option<T>,
    release: ReleaseFn<R, T>,
    what: &'static str,
}

impl<'a, R: DeviceRegistry, T> Reservation<'a, R, T> {
    pub(crate) fn new(
        registry: &'a R,
        resource: T,
        release: ReleaseFn<R, T>,
        what: &'static str,
    ) -> Self {
        Self { registry, resource: Some(resource), release, what }
    }

    /// Keep the resource; it is no longer released on drop.
    pub(crate) fn commit(mut self) -> T {
        match self.resource.take() {
            Some(resource) => resource,
            None => unreachable!(),
        }
    }
}

impl<R: DeviceRegistry, T> Deref for Reservation<'_, R, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.resource {
            Some(resource) => resource,
            None => unreachable!(),
        }
    }
}

impl<R: DeviceRegistry, T> Drop for Reservation<'_, R, T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            if (self.release)(self.registry, resource).is_err() {
                warn!("rollback of {} failed", self.what);
            }
        }
    }
}

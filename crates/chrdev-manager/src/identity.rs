use crate::error::AttachError;
use crate::guard::Reservation;
use crate::registry::{ChrdevConfig, DevNum, DeviceRegistry, MINOR_COUNT};

/// The user-visible resources of an attached device.
///
/// Owns the device-number range, the character-device binding, the class and
/// the node. Only [`DeviceIdentity::acquire`] creates one and only
/// [`DeviceIdentity::release`] gives the resources back.
pub struct DeviceIdentity<R: DeviceRegistry> {
    base: DevNum,
    binding: R::Binding,
    class: R::Class,
    node: R::Node,
}

impl<R: DeviceRegistry> DeviceIdentity<R> {
    /// Acquire region, binding, class and node, in that order.
    ///
    /// If a step fails, everything acquired before it is released in reverse
    /// order before the error is returned.
    pub(crate) fn acquire(
        registry: &R,
        config: &ChrdevConfig,
    ) -> Result<Self, AttachError<R::Error>> {
        let base = registry
            .alloc_region(config.name, MINOR_COUNT)
            .map_err(AttachError::NumberRangeExhausted)?;
        let region = Reservation::new(
            registry,
            base,
            |registry: &R, base| registry.release_region(base, MINOR_COUNT),
            "number range",
        );
        debug!("reserved device number {}:{}", base.major(), base.minor());

        let binding = registry
            .add_binding(*region, MINOR_COUNT)
            .map_err(AttachError::RegistrationFailed)?;
        let binding =
            Reservation::new(registry, binding, R::remove_binding, "binding");

        let class = registry
            .create_class(config.class)
            .map_err(AttachError::ClassCreationFailed)?;
        let class =
            Reservation::new(registry, class, R::destroy_class, "class");

        let node = registry
            .create_node(&class, *region, config.name, config.mode)
            .map_err(AttachError::NodeCreationFailed)?;

        Ok(Self {
            node,
            class: class.commit(),
            binding: binding.commit(),
            base: region.commit(),
        })
    }

    /// Release node, class, binding and region, in that order.
    ///
    /// Every step runs even if an earlier one failed; failures are logged.
    pub(crate) fn release(self, registry: &R) {
        let Self { base, binding, class, node } = self;

        if registry.destroy_node(&class, node).is_err() {
            warn!(
                "failed to destroy device node {}:{}",
                base.major(),
                base.minor()
            );
        }
        if registry.destroy_class(class).is_err() {
            warn!("failed to destroy device class");
        }
        if registry.remove_binding(binding).is_err() {
            warn!("failed to remove character device binding");
        }
        if registry.release_region(base, MINOR_COUNT).is_err() {
            warn!(
                "failed to release device number {}:{}",
                base.major(),
                base.minor()
            );
        }
    }

    /// First device number of the reserved range.
    pub fn base(&self) -> DevNum {
        self.base
    }

    pub fn node(&self) -> &R::Node {
        &self.node
    }

    pub fn class(&self) -> &R::Class {
        &self.class
    }
}

use bitflags::bitflags;

/// Number of device minors reserved per attached device.
pub const MINOR_COUNT: u32 = 1;

const MINOR_BITS: u32 = 20;
const MINOR_MASK: u32 = (1 << MINOR_BITS) - 1;

/// A device number (`major << 20 | minor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DevNum(u32);

impl DevNum {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self((major << MINOR_BITS) | (minor & MINOR_MASK))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        self.0 >> MINOR_BITS
    }

    pub const fn minor(self) -> u32 {
        self.0 & MINOR_MASK
    }
}

impl core::fmt::Display for DevNum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.major(), self.minor())
    }
}

bitflags! {
    /// Permission bits of a device node.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct NodeMode: u16 {
        const READ_OWNER  = 0o400;
        const WRITE_OWNER = 0o200;
        const READ_GROUP  = 0o040;
        const WRITE_GROUP = 0o020;
        const READ_OTHER  = 0o004;
        const WRITE_OTHER = 0o002;

        /// Read-only for every principal.
        const READ_ALL = Self::READ_OWNER.bits()
            | Self::READ_GROUP.bits()
            | Self::READ_OTHER.bits();
    }
}

impl NodeMode {
    pub const fn is_read_only(&self) -> bool {
        !self.intersects(
            Self::WRITE_OWNER.union(Self::WRITE_GROUP).union(Self::WRITE_OTHER),
        )
    }
}

/// Names and permissions of the resources created on attach.
#[derive(Debug, Clone, Copy)]
pub struct ChrdevConfig {
    /// Name of the number range and of the device node.
    pub name: &'static str,
    /// Name of the device class owning the node.
    pub class: &'static str,
    pub mode: NodeMode,
}

/// The OS side of a character device: number ranges, device bindings,
/// classes and nodes.
///
/// Every `create`-style method has a release counterpart. The manager calls
/// them in a fixed order (region, binding, class, node) and releases in the
/// reverse order, both when a later step fails and on detach. Release errors
/// are logged by the manager and otherwise ignored.
pub trait DeviceRegistry {
    /// Handle of a live character-device binding.
    type Binding;
    /// Handle of a live device class.
    type Class;
    /// Handle of a live device node.
    type Node;
    /// Error reported by any registry operation.
    type Error: core::fmt::Debug;

    /// Reserve `count` consecutive device numbers and return the first.
    fn alloc_region(
        &self,
        name: &'static str,
        count: u32,
    ) -> Result<DevNum, Self::Error>;

    fn release_region(&self, base: DevNum, count: u32)
        -> Result<(), Self::Error>;

    /// Bind the device numbers to the driver's read entry point and make them
    /// live.
    fn add_binding(
        &self,
        base: DevNum,
        count: u32,
    ) -> Result<Self::Binding, Self::Error>;

    fn remove_binding(&self, binding: Self::Binding) -> Result<(), Self::Error>;

    fn create_class(&self, name: &'static str)
        -> Result<Self::Class, Self::Error>;

    fn destroy_class(&self, class: Self::Class) -> Result<(), Self::Error>;

    /// Create the user-visible node for `dev` under `class`.
    fn create_node(
        &self,
        class: &Self::Class,
        dev: DevNum,
        name: &'static str,
        mode: NodeMode,
    ) -> Result<Self::Node, Self::Error>;

    fn destroy_node(
        &self,
        class: &Self::Class,
        node: Self::Node,
    ) -> Result<(), Self::Error>;
}

/// Result of a device's self-check before any OS resource is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeFailure {
    /// The bus cannot perform the transactions the device needs.
    BusUnsupported,
    /// The bus works but nothing answered.
    NoDevice,
}

/// A device that can be bound to a character-device node.
///
/// Only reading is supported. `read` may be called from several threads at
/// once, hence `&self`; implementations serialize their own bus access.
pub trait CharDevice {
    type Error;

    /// Check that the device is reachable. Called once per attach, before any
    /// OS resource is acquired.
    fn probe(&mut self) -> Result<(), ProbeFailure>;

    /// Copy data starting at `*offset` into `buf` and advance `offset` by the
    /// number of bytes written.
    fn read(&self, buf: &mut [u8], offset: &mut u64)
        -> Result<usize, Self::Error>;
}

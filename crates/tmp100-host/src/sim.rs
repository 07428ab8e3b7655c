//! In-process stand-ins for the I2C adapter and the OS device registry.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrdev_manager::{DevNum, DeviceRegistry, NodeMode};
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use tracing::debug;

/// A registration step that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Step {
    Region,
    Binding,
    Class,
    Node,
}

#[derive(Debug)]
pub struct Injected(pub Step);

impl fmt::Display for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected failure at {:?}", self.0)
    }
}

/// Registry that keeps its resources in a list.
pub struct SimRegistry {
    fail_at: Option<Step>,
    next_major: AtomicU32,
    live: Mutex<Vec<String>>,
}

impl SimRegistry {
    pub fn new(fail_at: Option<Step>) -> Self {
        Self {
            fail_at,
            next_major: AtomicU32::new(240),
            live: Mutex::new(Vec::new()),
        }
    }

    /// Resources currently held, oldest first.
    pub fn live(&self) -> Vec<String> {
        self.held().clone()
    }

    /// Panics if an earlier holder panicked.
    fn held(&self) -> MutexGuard<'_, Vec<String>> {
        self.live.lock().expect("live resource list poisoned")
    }

    fn check(&self, step: Step) -> Result<(), Injected> {
        if self.fail_at == Some(step) {
            debug!("failing {:?}", step);
            return Err(Injected(step));
        }
        Ok(())
    }

    fn push(&self, what: String) {
        debug!("acquire {}", what);
        self.held().push(what);
    }

    fn remove(&self, what: &str) -> Result<(), Injected> {
        debug!("release {}", what);
        self.held().retain(|held| held != what);
        Ok(())
    }
}

impl DeviceRegistry for SimRegistry {
    type Binding = String;
    type Class = String;
    type Node = String;
    type Error = Injected;

    fn alloc_region(
        &self,
        name: &'static str,
        count: u32,
    ) -> Result<DevNum, Injected> {
        self.check(Step::Region)?;
        let major = self.next_major.fetch_add(1, Ordering::Relaxed);
        let base = DevNum::new(major, 0);
        self.push(format!("region {base}+{count} ({name})"));
        Ok(base)
    }

    fn release_region(&self, base: DevNum, count: u32) -> Result<(), Injected> {
        let prefix = format!("region {base}+{count}");
        let held = self
            .live()
            .into_iter()
            .find(|label| label.starts_with(&prefix));
        match held {
            Some(label) => self.remove(&label),
            None => Ok(()),
        }
    }

    fn add_binding(
        &self,
        base: DevNum,
        count: u32,
    ) -> Result<String, Injected> {
        self.check(Step::Binding)?;
        let label = format!("binding {base}+{count}");
        self.push(label.clone());
        Ok(label)
    }

    fn remove_binding(&self, binding: String) -> Result<(), Injected> {
        self.remove(&binding)
    }

    fn create_class(&self, name: &'static str) -> Result<String, Injected> {
        self.check(Step::Class)?;
        let label = format!("class {name}");
        self.push(label.clone());
        Ok(label)
    }

    fn destroy_class(&self, class: String) -> Result<(), Injected> {
        self.remove(&class)
    }

    fn create_node(
        &self,
        _class: &String,
        dev: DevNum,
        name: &'static str,
        mode: NodeMode,
    ) -> Result<String, Injected> {
        self.check(Step::Node)?;
        let label = format!("node /dev/{name} ({dev}, mode {:o})", mode.bits());
        self.push(label.clone());
        Ok(label)
    }

    fn destroy_node(
        &self,
        _class: &String,
        node: String,
    ) -> Result<(), Injected> {
        self.remove(&node)
    }
}

/// A TMP100 behind a plain I2C adapter.
pub struct SimBus {
    address: u8,
    word: u16,
    present: bool,
}

impl SimBus {
    pub fn new(address: u8, word: u16, present: bool) -> Self {
        Self { address, word, present }
    }
}

impl i2c::ErrorType for SimBus {
    type Error = ErrorKind;
}

impl i2c::I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), ErrorKind> {
        if !self.present || address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let mut pointer = 0u8;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some(&reg) = bytes.first() {
                        pointer = reg;
                    }
                }
                Operation::Read(buf) => {
                    // Only the temperature register is modelled.
                    let word = if pointer == 0 { self.word } else { 0 };
                    for (dst, src) in buf.iter_mut().zip(word.to_be_bytes()) {
                        *dst = src;
                    }
                }
            }
        }
        Ok(())
    }
}

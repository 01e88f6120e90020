use std::cell::Cell;
use std::rc::Rc;

use cosim_core::peripheral::{DdrPort, Peripheral};

/// Shared view of what a [`CountingPeripheral`] observed.
#[derive(Debug, Default)]
pub struct StepLog {
    pub steps: Cell<u64>,
    pub with_port: Cell<u64>,
}

/// Peripheral that records every step through a shared [`StepLog`].
pub struct CountingPeripheral {
    log: Rc<StepLog>,
}

impl CountingPeripheral {
    pub fn new() -> (Self, Rc<StepLog>) {
        let log = Rc::new(StepLog::default());
        (Self { log: Rc::clone(&log) }, log)
    }
}

impl Peripheral for CountingPeripheral {
    fn step(&mut self, port: Option<&mut DdrPort>) {
        self.log.steps.set(self.log.steps.get() + 1);
        if port.is_some() {
            self.log.with_port.set(self.log.with_port.get() + 1);
        }
    }
}

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use log::debug;

use crate::value::Value;

/// Variable bindings of one function invocation.
#[derive(Debug, Default)]
pub struct ActivationRecord {
    bindings: RefCell<HashMap<String, Value>>,
}

impl ActivationRecord {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn insert(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.borrow().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }
}

/// Supplies the interpreter with the bindings to use when a function is
/// entered, and with the ones that become current again when it returns.
pub trait MemoryManager {
    fn activation_record(&mut self, function: &str) -> Rc<ActivationRecord>;
    fn restore_activation_record(&mut self) -> Rc<ActivationRecord>;
}

/// One record for the whole run. Entering and leaving a function hands back
/// the same bindings, so callee writes are visible to the caller.
#[derive(Debug, Default)]
pub struct BasicMemoryManager {
    record: Rc<ActivationRecord>,
}

impl BasicMemoryManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryManager for BasicMemoryManager {
    fn activation_record(&mut self, function: &str) -> Rc<ActivationRecord> {
        debug!("entering {} with the shared record", function);
        self.record.clone()
    }

    fn restore_activation_record(&mut self) -> Rc<ActivationRecord> {
        self.record.clone()
    }
}

/// A fresh record per invocation; returning pops it and resumes the caller's.
#[derive(Debug, Default)]
pub struct StackMemoryManager {
    records: Vec<Rc<ActivationRecord>>,
}

impl StackMemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.records.len()
    }
}

impl MemoryManager for StackMemoryManager {
    fn activation_record(&mut self, function: &str) -> Rc<ActivationRecord> {
        let record = ActivationRecord::new();
        self.records.push(record.clone());
        debug!("entering {} at depth {}", function, self.records.len());
        record
    }

    fn restore_activation_record(&mut self) -> Rc<ActivationRecord> {
        self.records.pop();
        debug!("resuming at depth {}", self.records.len());
        self.records.last().cloned().unwrap_or_default()
    }
}

#![allow(clippy::result_unit_err)]

use crate::sim_if::SIM_IF;
use crate::trigger::Trigger;
use crate::value::Val;
use crate::{SimpleResult, TbResult};
use intmap::IntMap;
use lazy_mut::lazy_mut;
use std::collections::HashMap;

pub(crate) type SeaMap<K, V> = HashMap<K, V, fasthash::sea::Hash64>;

lazy_mut! {
    static mut SIG_MAP_NAME: SeaMap<String, usize> = HashMap::with_hasher(fasthash::sea::Hash64);
}
lazy_mut! {
    static mut SIG_MAP: IntMap<SimObject> = IntMap::new();
}

pub(crate) fn clear_registry() {
    unsafe {
        SIG_MAP.clear();
        SIG_MAP_NAME.clear();
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SimObject {
    pub(crate) handle: usize,
    pub(crate) kind: ObjectKind,
}

#[derive(Copy, Clone, Debug)]
pub enum ObjectKind {
    Int(i32),
    Hier,
    Other,
}

impl SimObject {
    pub fn handle(&self) -> usize {
        self.handle
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> String {
        SIM_IF
            .get_full_name(self)
            .expect("Couldn't get name of SimObject")
    }

    pub fn size(&self) -> i32 {
        match self.kind {
            ObjectKind::Int(size) => size,
            _ => panic!("SimObject does not have a size."),
        }
    }

    #[allow(clippy::needless_question_mark)]
    pub fn get_child(&self, name: &str) -> SimpleResult<Self> {
        let mut child_name = self.name();
        child_name.push('.');
        child_name.push_str(name);
        Ok(SimObject::from_name(child_name.as_str())?)
    }

    #[allow(clippy::clone_on_copy)]
    pub fn from_handle(handle: usize) -> SimpleResult<Self> {
        if let Some(signal) = unsafe { SIG_MAP.get(handle as u64) } {
            Ok(signal.clone())
        } else {
            Err(())
        }
    }

    pub fn from_name(full_name: &str) -> SimpleResult<Self> {
        let handle = unsafe { SIG_MAP_NAME.get(full_name) }.map(|h| h.to_owned());
        match handle {
            Some(h) => SimObject::from_handle(h),
            _ => {
                let signal = SIM_IF.get_object_by_name(full_name)?;
                unsafe {
                    SIG_MAP.insert(signal.handle as u64, signal);
                    SIG_MAP_NAME.insert(full_name.to_string(), signal.handle);
                };
                Ok(signal)
            }
        }
    }

    pub fn get_root() -> SimpleResult<Self> {
        SIM_IF.get_root_object()
    }

    pub fn u32(&self) -> u32 {
        SIM_IF.get_value_u32(self).unwrap()
    }

    /// Like `u32()`, but an indeterminate value is an `Err`, not a panic.
    pub fn try_u32(&self) -> SimpleResult<u32> {
        SIM_IF.get_value_u32(self)
    }

    pub fn bin(&self) -> String {
        SIM_IF.get_value_bin(self).unwrap()
    }

    pub fn c(&self, name: &str) -> Self {
        self.get_child(name)
            .unwrap_or_else(|_| panic!("Could not get object with name {}.{}", self.name(), name))
    }

    pub fn set(&self, val: u32) {
        SIM_IF.set_value_u32(self, val).unwrap();
    }

    // convenience functions to get edge triggers for this signal
    pub fn rising_edge(self) -> Trigger {
        Trigger::rising_edge(self)
    }
    pub async fn rising_edge_ro(self) -> TbResult {
        self.rising_edge().await;
        Trigger::read_only().await;
        Ok(Val::None)
    }
    pub fn falling_edge(self) -> Trigger {
        Trigger::falling_edge(self)
    }
    pub fn edge(self) -> Trigger {
        Trigger::edge(self)
    }
}

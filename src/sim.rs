use num_format::{Locale, ToFormattedString};
use std::collections::BTreeMap;

use crate::obj::TbObjSafe;
use crate::signal::{self, ObjectKind, SimObject};
use crate::sim_if::SimIf;
use crate::trigger::{self, EdgeKind};
use crate::SimpleResult;
use intmap::IntMap;
use lazy_static::lazy_static;

const ROOT_HANDLE: usize = 0;
// 1 step = 1 ns
const PRECISION: i8 = -9;

/// A compiled-in behavioral design. `declare` registers the design's ports and
/// returns their handles; `eval` recomputes the design from the current variable
/// values. `eval` runs with the kernel locked and must only touch the `VarTable`.
pub trait Design: Send {
    fn declare(&mut self, scope: &mut Scope);
    fn eval(&mut self, vars: &mut VarTable);
}

struct Var {
    name: String,
    width: u32,
    val: u64,
    xmask: u64,
}

fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Flat two-state-with-X variable store. Every bit of a variable is
/// indeterminate until first written.
pub struct VarTable {
    vars: Vec<Var>,
}

impl VarTable {
    pub(crate) fn new() -> Self {
        Self { vars: Vec::new() }
    }

    fn add(&mut self, name: &str, width: u32) -> usize {
        assert!(width >= 1 && width <= 64, "unsupported width for {}", name);
        self.vars.push(Var {
            name: name.to_string(),
            width,
            val: 0,
            xmask: width_mask(width),
        });
        // handle 0 is the root scope
        self.vars.len()
    }

    fn var(&self, hdl: usize) -> &Var {
        &self.vars[hdl - 1]
    }

    pub(crate) fn raw(&self, hdl: usize) -> (u64, u64) {
        let v = self.var(hdl);
        let mask = width_mask(v.width);
        (v.val & mask, v.xmask & mask)
    }

    pub(crate) fn width(&self, hdl: usize) -> u32 {
        self.var(hdl).width
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.name == name).map(|i| i + 1)
    }

    pub(crate) fn name(&self, hdl: usize) -> &str {
        &self.var(hdl).name
    }

    /// Resolved value, `None` if any bit is indeterminate.
    pub fn value(&self, hdl: usize) -> Option<u64> {
        match self.raw(hdl) {
            (val, 0) => Some(val),
            _ => None,
        }
    }

    /// Resolved least significant bit, `None` if indeterminate.
    pub fn bit(&self, hdl: usize) -> Option<bool> {
        let (val, xmask) = self.raw(hdl);
        match xmask & 1 {
            0 => Some(val & 1 == 1),
            _ => None,
        }
    }

    pub fn set(&mut self, hdl: usize, val: u64) {
        let v = &mut self.vars[hdl - 1];
        v.val = val & width_mask(v.width);
        v.xmask = 0;
    }

    /// Binary rendering, MSB first, indeterminate bits as 'x'.
    pub fn bin_string(&self, hdl: usize) -> String {
        let v = self.var(hdl);
        let mut s = String::with_capacity(v.width as usize);
        for i in (0..v.width).rev() {
            if v.xmask >> i & 1 == 1 {
                s.push('x');
            } else if v.val >> i & 1 == 1 {
                s.push('1');
            } else {
                s.push('0');
            }
        }
        s
    }
}

/// Port declaration context handed to `Design::declare`.
pub struct Scope {
    vars: VarTable,
}

impl Scope {
    fn new() -> Self {
        Self { vars: VarTable::new() }
    }
    pub fn wire(&mut self, name: &str, width: u32) -> usize {
        self.vars.add(name, width)
    }
}

enum CbKind {
    Time(u64),
    Edge(usize),
    Rw,
    Ro,
}

struct EdgeWatch {
    sig: usize,
    val: u64,
    xmask: u64,
}

struct Kernel {
    scope_name: String,
    vars: VarTable,
    design: Option<Box<dyn Design>>,
    time: u64,
    dirty: bool,
    // abs fire time -> callback handle
    timers: BTreeMap<u64, usize>,
    edge_watches: Vec<EdgeWatch>,
    callbacks: IntMap<CbKind>,
    next_cb_hdl: usize,
    rw: bool,
    ro: bool,
}

impl Kernel {
    fn new() -> Self {
        Self {
            scope_name: "dut".to_string(),
            vars: VarTable::new(),
            design: None,
            time: 0,
            dirty: false,
            timers: BTreeMap::new(),
            edge_watches: Vec::new(),
            callbacks: IntMap::new(),
            next_cb_hdl: 1,
            rw: false,
            ro: false,
        }
    }

    fn new_cb_hdl(&mut self, kind: CbKind) -> usize {
        let hdl = self.next_cb_hdl;
        self.next_cb_hdl += 1;
        self.callbacks.insert(hdl as u64, kind);
        hdl
    }

    // re-evaluate the design until all writes have propagated
    fn settle(&mut self) {
        while self.dirty {
            self.dirty = false;
            if let Some(mut design) = self.design.take() {
                design.eval(&mut self.vars);
                self.design = Some(design);
            }
        }
    }
}

lazy_static! {
    static ref KERNEL: TbObjSafe<Kernel> = TbObjSafe::new(Kernel::new());
}

/// Install a design into a cleanly reset kernel. Any state left over from a
/// previous run (signal registry, triggers, queued tasks) is discarded first.
pub(crate) fn setup(mut design: Box<dyn Design>) {
    trigger::discard_all_triggers();
    crate::executor::clear_ready_queue();
    signal::clear_registry();
    KERNEL.with_mut(|mut k| {
        *k = Kernel::new();
        let mut scope = Scope::new();
        design.declare(&mut scope);
        k.vars = scope.vars;
        k.design = Some(design);
        k.dirty = true;
    });
}

/// The event loop. Per time step: fire due timers, settle and propagate edges,
/// then the read/write and read-only phases, then advance to the next timer.
/// Terminates when no timer remains.
pub(crate) fn run_sim() {
    loop {
        let now = KERNEL.with_mut(|k| k.time);
        eprintln!("DBG run_sim loop now={}", now);
        handle_time_callbacks(now);
        loop {
            KERNEL.with_mut(|mut k| k.settle());
            if !scan_edges() {
                break;
            }
        }
        if KERNEL.with_mut(|mut k| std::mem::take(&mut k.rw)) {
            trigger::react_rw();
            KERNEL.with_mut(|mut k| k.settle());
        }
        if KERNEL.with_mut(|mut k| std::mem::take(&mut k.ro)) {
            trigger::react_ro();
        }
        let next = KERNEL.with_mut(|k| k.timers.keys().next().cloned());
        match next {
            Some(t) => KERNEL.with_mut(|mut k| k.time = t),
            None => break,
        }
    }
}

fn handle_time_callbacks(now: u64) {
    let fired = KERNEL.with_mut(|mut k| match k.timers.remove(&now) {
        Some(cb_hdl) => {
            k.callbacks.remove(cb_hdl as u64);
            true
        }
        None => false,
    });
    if fired {
        trigger::react_time(now);
    }
}

fn scan_edges() -> bool {
    let fired = KERNEL.with_mut(|mut k| {
        let k = &mut *k;
        let mut fired = Vec::new();
        for w in k.edge_watches.iter_mut() {
            let (val, xmask) = k.vars.raw(w.sig);
            if val != w.val || xmask != w.xmask {
                let kind = if w.xmask & 1 == 0 && xmask & 1 == 0 {
                    match (w.val & 1, val & 1) {
                        (0, 1) => EdgeKind::Rising,
                        (1, 0) => EdgeKind::Falling,
                        _ => EdgeKind::Any,
                    }
                } else {
                    // into or out of an indeterminate value
                    EdgeKind::Any
                };
                w.val = val;
                w.xmask = xmask;
                fired.push((w.sig, kind));
            }
        }
        fired
    });
    let any = !fired.is_empty();
    for (sig, kind) in fired {
        trigger::react_edge(sig, kind);
    }
    any
}

pub(crate) struct BehavSim;

impl SimIf for BehavSim {
    fn set_value_u32(&self, obj: &SimObject, value: u32) -> SimpleResult<()> {
        match obj.kind {
            ObjectKind::Int(_) => KERNEL.with_mut(|mut k| {
                let k = &mut *k;
                k.vars.set(obj.handle, value as u64);
                k.dirty = true;
                Ok(())
            }),
            _ => {
                crate::cold();
                Err(())
            }
        }
    }
    fn get_value_u32(&self, obj: &SimObject) -> SimpleResult<u32> {
        match obj.kind {
            ObjectKind::Int(_) => KERNEL.with_mut(|mut k| {
                k.settle();
                k.vars.value(obj.handle).map(|v| v as u32).ok_or(())
            }),
            _ => {
                crate::cold();
                Err(())
            }
        }
    }
    fn get_value_bin(&self, obj: &SimObject) -> SimpleResult<String> {
        match obj.kind {
            ObjectKind::Int(_) => KERNEL.with_mut(|mut k| {
                k.settle();
                Ok(k.vars.bin_string(obj.handle))
            }),
            _ => {
                crate::cold();
                Err(())
            }
        }
    }
    fn get_object_by_name(&self, name: &str) -> SimpleResult<SimObject> {
        KERNEL.with_mut(|k| {
            if name == k.scope_name {
                return Ok(SimObject {
                    handle: ROOT_HANDLE,
                    kind: ObjectKind::Hier,
                });
            }
            // full names are "<scope>.<var>"
            if let Some((scope_name, var_name)) = name.rsplit_once('.') {
                if scope_name == k.scope_name {
                    if let Some(hdl) = k.vars.lookup(var_name) {
                        return Ok(SimObject {
                            handle: hdl,
                            kind: ObjectKind::Int(k.vars.width(hdl) as i32),
                        });
                    }
                }
            }
            crate::cold();
            Err(())
        })
    }
    fn get_sim_time_steps(&self) -> u64 {
        KERNEL.with_mut(|k| k.time)
    }
    fn log(&self, msg: &str) {
        let t = self.get_sim_time("ns");
        let int = t.floor() as u64;
        let mut frac_str = format!("{:.3}", t % 1.0);
        frac_str.remove(0);
        println!("{}{}ns {}", int.to_formatted_string(&Locale::en), frac_str, msg);
    }
    fn get_size(&self, obj_handle: usize) -> i32 {
        KERNEL.with_mut(|k| k.vars.width(obj_handle) as i32)
    }
    fn get_kind(&self, obj_handle: usize) -> ObjectKind {
        if obj_handle == ROOT_HANDLE {
            ObjectKind::Hier
        } else {
            ObjectKind::Int(self.get_size(obj_handle))
        }
    }
    fn get_full_name(&self, obj: &SimObject) -> SimpleResult<String> {
        KERNEL.with_mut(|k| match obj.kind {
            ObjectKind::Hier => Ok(k.scope_name.clone()),
            ObjectKind::Int(_) => Ok(format!("{}.{}", k.scope_name, k.vars.name(obj.handle))),
            _ => Err(()),
        })
    }
    fn get_sim_precision(&self) -> i8 {
        PRECISION
    }
    fn get_root_object(&self) -> SimpleResult<SimObject> {
        Ok(SimObject {
            handle: ROOT_HANDLE,
            kind: ObjectKind::Hier,
        })
    }
    fn register_callback_rw(&self) -> SimpleResult<usize> {
        KERNEL.with_mut(|mut k| {
            let k = &mut *k;
            k.rw = true;
            Ok(k.new_cb_hdl(CbKind::Rw))
        })
    }
    fn register_callback_ro(&self) -> SimpleResult<usize> {
        KERNEL.with_mut(|mut k| {
            let k = &mut *k;
            k.ro = true;
            Ok(k.new_cb_hdl(CbKind::Ro))
        })
    }
    fn register_callback_time(&self, t: u64) -> SimpleResult<usize> {
        KERNEL.with_mut(|mut k| {
            let k = &mut *k;
            let t_abs = t + k.time;
            let cb_hdl = k.new_cb_hdl(CbKind::Time(t_abs));
            if k.timers.insert(t_abs, cb_hdl).is_some() {
                panic!("Can not register same timer callback twice.");
            }
            Ok(cb_hdl)
        })
    }
    fn register_callback_edge(&self, sig_hdl: usize) -> SimpleResult<usize> {
        KERNEL.with_mut(|mut k| {
            let k = &mut *k;
            if k.edge_watches.iter().any(|w| w.sig == sig_hdl) {
                return Err(());
            }
            let (val, xmask) = k.vars.raw(sig_hdl);
            k.edge_watches.push(EdgeWatch {
                sig: sig_hdl,
                val,
                xmask,
            });
            Ok(k.new_cb_hdl(CbKind::Edge(sig_hdl)))
        })
    }
    fn cancel_callback(&self, cb_hdl: usize) -> SimpleResult<()> {
        KERNEL.with_mut(|mut k| {
            let k = &mut *k;
            let cb = k.callbacks.remove(cb_hdl as u64).ok_or(())?;
            match cb {
                CbKind::Time(t_abs) => {
                    k.timers.remove(&t_abs);
                }
                CbKind::Edge(sig_hdl) => {
                    k.edge_watches.retain(|w| w.sig != sig_hdl);
                }
                CbKind::Rw => k.rw = false,
                CbKind::Ro => k.ro = false,
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_var_reads_indeterminate() {
        let mut vars = VarTable::new();
        let hdl = vars.add("STATE", 3);
        assert_eq!(vars.value(hdl), None);
        assert_eq!(vars.bit(hdl), None);
        assert_eq!(vars.bin_string(hdl), "xxx");
    }

    #[test]
    fn write_resolves_and_masks_to_width() {
        let mut vars = VarTable::new();
        let hdl = vars.add("STATE", 3);
        vars.set(hdl, 0b101101);
        assert_eq!(vars.value(hdl), Some(0b101));
        assert_eq!(vars.bin_string(hdl), "101");
        assert_eq!(vars.bit(hdl), Some(true));
    }

    #[test]
    fn lookup_by_name() {
        let mut vars = VarTable::new();
        let a = vars.add("CLOCK", 1);
        let b = vars.add("STATE", 3);
        assert_eq!(vars.lookup("CLOCK"), Some(a));
        assert_eq!(vars.lookup("STATE"), Some(b));
        assert_eq!(vars.lookup("LEDR"), None);
    }
}

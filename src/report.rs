use crate::signal::SimObject;
use crate::sim_if::SIM_IF;

// values this wide or wider render as hex
const HEX_THRESHOLD_BITS: usize = 16;

/// A declared, collaborator-supplied view of one observable signal. Replaces
/// reflective design traversal: the bench states up front what exists and how
/// to read it.
pub enum Probe {
    Scalar { name: String, obj: SimObject },
    Bus { name: String, obj: SimObject },
    Array { name: String, elems: Vec<SimObject> },
    Sub { name: String, detail: String },
}

impl Probe {
    pub fn scalar(name: &str, obj: SimObject) -> Probe {
        Probe::Scalar { name: name.to_string(), obj }
    }
    pub fn bus(name: &str, obj: SimObject) -> Probe {
        Probe::Bus { name: name.to_string(), obj }
    }
    pub fn array(name: &str, elems: Vec<SimObject>) -> Probe {
        Probe::Array { name: name.to_string(), elems }
    }
    pub fn sub(name: &str, detail: &str) -> Probe {
        Probe::Sub { name: name.to_string(), detail: detail.to_string() }
    }

    pub fn name(&self) -> &str {
        match self {
            Probe::Scalar { name, .. }
            | Probe::Bus { name, .. }
            | Probe::Array { name, .. }
            | Probe::Sub { name, .. } => name,
        }
    }

    fn render(&self) -> String {
        match self {
            Probe::Scalar { obj, .. } | Probe::Bus { obj, .. } => render_value(&obj.bin()),
            Probe::Array { elems, .. } => {
                let vals: Vec<String> = elems.iter().map(|e| render_value(&e.bin())).collect();
                format!("[{}]", vals.join(", "))
            }
            Probe::Sub { detail, .. } => detail.clone(),
        }
    }
}

/// Dump the current value of every probe. Pure side effect, used after a
/// failed case; never changes the verdict.
pub fn dump_probes(probes: &[Probe]) {
    for probe in probes {
        SIM_IF.log(&format!("dut.{:<16}= {}", probe.name(), probe.render()));
    }
}

fn render_value(bin: &str) -> String {
    match to_hex(bin) {
        Some(hex) => hex,
        None if bin.len() == 1 => bin.to_string(),
        None => format!("0b{}", bin),
    }
}

// Hex form for wide, fully resolved values; anything narrow or holding
// indeterminate bits stays in its natural form.
fn to_hex(bin: &str) -> Option<String> {
    if bin.len() < HEX_THRESHOLD_BITS || !bin.chars().all(|c| c == '0' || c == '1') {
        return None;
    }
    let value = u64::from_str_radix(bin, 2).ok()?;
    let hex_len = (bin.len() + 3) / 4;
    Some(format!("0x{:0width$x}", value, width = hex_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_values_render_hex() {
        assert_eq!(to_hex("1010101010101010"), Some("0xaaaa".to_string()));
        assert_eq!(to_hex(&"1".repeat(20)), Some("0xfffff".to_string()));
    }

    #[test]
    fn narrow_values_stay_natural() {
        assert_eq!(to_hex("101"), None);
        assert_eq!(render_value("101"), "0b101");
        assert_eq!(render_value("0"), "0");
        assert_eq!(render_value("1"), "1");
    }

    #[test]
    fn indeterminate_bits_never_hex() {
        let bin = format!("x{}", "0".repeat(15));
        assert_eq!(to_hex(&bin), None);
        assert_eq!(render_value("x"), "x");
    }

    #[test]
    fn hex_digit_count_covers_started_nibbles() {
        assert_eq!(to_hex(&"0".repeat(17)), Some("0x00000".to_string()));
    }
}

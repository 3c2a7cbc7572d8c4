use crate::fsm::{Flags, TransitionCase};
use crate::report;
use crate::sequencer::FsmBench;
use crate::sim_if::SIM_IF;
use crate::SimpleResult;

/// Verdict for a single case. `Unreadable` means a sampled output held
/// indeterminate bits; it fails the case but never aborts the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Mismatch {
        state: Option<u32>,
        flags: Flags,
    },
    Unreadable,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }
}

/// Decode the three flag outputs into the packed vector.
pub fn read_flags(bench: &FsmBench) -> SimpleResult<Flags> {
    let mov = bench.move_flag.try_u32()?;
    let dir = bench.attack_dir_flag.try_u32()?;
    let atk = bench.attack_flag.try_u32()?;
    Ok(Flags::pack(atk & 1 == 1, dir & 1 == 1, mov & 1 == 1))
}

/// Sample the settled DUT outputs and compare them bit-for-bit against the
/// case's expectations. Logs and dumps on failure, returns the verdict.
pub fn check_case(bench: &FsmBench, case: &TransitionCase) -> CaseOutcome {
    let state = bench.state.try_u32();
    let flags = read_flags(bench);
    match (state, flags) {
        (Ok(code), Ok(flags)) => {
            if code == case.expect_state.code() && flags == case.expect_flags {
                CaseOutcome::Passed
            } else {
                SIM_IF.log(&format!(
                    "{}: FAILED. expected state={} flags={}, got state={} flags={}",
                    case.name(),
                    case.expect_state.code(),
                    case.expect_flags,
                    code,
                    flags
                ));
                report::dump_probes(&bench.probes());
                CaseOutcome::Mismatch {
                    state: Some(code),
                    flags,
                }
            }
        }
        _ => {
            log_unreadable(bench, &case.name());
            CaseOutcome::Unreadable
        }
    }
}

/// Flags-only check for the combined-input scenario; the resulting state is
/// deliberately not part of the contract.
pub fn check_flags(bench: &FsmBench, name: &str, expect: Flags) -> CaseOutcome {
    match read_flags(bench) {
        Ok(flags) if flags == expect => CaseOutcome::Passed,
        Ok(flags) => {
            SIM_IF.log(&format!(
                "{}: FAILED. expected flags={}, got flags={}",
                name, expect, flags
            ));
            report::dump_probes(&bench.probes());
            CaseOutcome::Mismatch { state: None, flags }
        }
        Err(()) => {
            log_unreadable(bench, name);
            CaseOutcome::Unreadable
        }
    }
}

fn log_unreadable(bench: &FsmBench, name: &str) {
    SIM_IF.log(&format!("{}: unresolvable signal value", name));
    SIM_IF.log(&format!("ATTACK_FLAG: {}", bench.attack_flag.bin()));
    SIM_IF.log(&format!("ATTACK_DIR_FLAG: {}", bench.attack_dir_flag.bin()));
    SIM_IF.log(&format!("MOVE_FLAG: {}", bench.move_flag.bin()));
    SIM_IF.log(&format!("STATE: {}", bench.state.bin()));
}

pub use crate::executor::{JoinHandle, Task};
pub use crate::fsm::{self, Flags, Keys, State, TransitionCase};
pub use crate::harness::{self, CaseRecord, SuiteResult};
pub use crate::obj::{TbObj, TbObjSafe};
pub use crate::report::{self, Probe};
pub use crate::sequencer::{FsmBench, SETTLE_US};
pub use crate::signal::SimObject;
pub use crate::sim::{Design, Scope, VarTable};
pub use crate::sim_if::SIM_IF;
pub use crate::test::{TbTests, Test};
pub use crate::testbench::{self, Scoreboard};
pub use crate::trigger::Trigger;
pub use crate::utils;
pub use crate::value::Val;
pub use crate::verifier::{self, CaseOutcome};
pub use crate::{fail_test, pass_test, run_all};
pub use crate::{SimpleResult, TbResult, TestFn};
pub use futures::future::FutureExt;

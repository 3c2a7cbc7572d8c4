mod common;

use common::{Fault, PlayerFsm};
use player_fsm_tb::prelude::*;

// An undriven flag wire must fail every case as unreadable without aborting
// the suite.
async fn undriven_flag_fails_soft(sim_root: SimObject) -> TbResult {
    let bench = FsmBench::new(sim_root);
    let probes = bench.probes();
    for required in ["STATE", "MOVE_FLAG", "ATTACK_DIR_FLAG", "ATTACK_FLAG"] {
        if !probes.iter().any(|p| p.name() == required) {
            return Err(Val::String(format!("probe list is missing {}", required)));
        }
    }

    // the dump copes with every probe kind an adapter can declare
    report::dump_probes(&[
        Probe::array(
            "KEYS",
            vec![
                sim_root.c("LEFT_KEY"),
                sim_root.c("ATTACK_KEY"),
                sim_root.c("RIGHT_KEY"),
            ],
        ),
        Probe::sub("controller", "player_fsm"),
    ]);

    let suite = harness::run_suite(sim_root).await?;
    if suite.len() != 21 {
        return Err(Val::String(format!(
            "expected 21 records, got {}",
            suite.len()
        )));
    }
    match suite
        .records()
        .iter()
        .all(|r| r.outcome == CaseOutcome::Unreadable)
    {
        true => Ok(Val::None),
        false => Err(Val::String(
            "expected every case to be unreadable".to_string(),
        )),
    }
}

#[test]
fn undriven_flag_marks_cases_failed_without_abort() {
    let mut tests = TbTests::new();
    tests.push(Test::new(
        "undriven_flag_fails_soft".to_string(),
        |sim_root| undriven_flag_fails_soft(sim_root).boxed(),
    ));
    assert!(run_all(
        Box::new(PlayerFsm::with_fault(Fault::UndrivenAttackFlag)),
        tests
    )
    .is_ok());
}

mod common;

use common::{Fault, PlayerFsm};
use player_fsm_tb::prelude::*;

// With MOVE_FLAG stuck high during a plain windup, exactly the three cases
// landing in ATTACK_START must fail, and nothing else.
async fn windup_fault_isolation(sim_root: SimObject) -> TbResult {
    let suite = harness::run_suite(sim_root).await?;
    let records = suite.records();
    if records.len() != 21 {
        return Err(Val::String(format!(
            "expected 21 records, got {}",
            records.len()
        )));
    }
    let failing: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.outcome.passed())
        .map(|(i, _)| i)
        .collect();
    if failing.len() != 3 {
        return Err(Val::String(format!(
            "expected 3 failing cases, got {}",
            failing.len()
        )));
    }
    for &i in &failing {
        let record = &records[i];
        if !record.name.ends_with("-> ATTACK_START") {
            return Err(Val::String(format!(
                "unexpected failing case: {}",
                record.name
            )));
        }
        // a failed case must not disturb its successor
        if let Some(next) = records.get(i + 1) {
            if !next.outcome.passed() {
                return Err(Val::String(format!(
                    "case after {} failed as well",
                    record.name
                )));
            }
        }
    }
    Ok(Val::None)
}

#[test]
fn windup_flag_fault_is_contained() {
    let mut tests = TbTests::new();
    tests.push(Test::new(
        "windup_fault_isolation".to_string(),
        |sim_root| windup_fault_isolation(sim_root).boxed(),
    ));
    assert!(run_all(
        Box::new(PlayerFsm::with_fault(Fault::StuckMoveInWindup)),
        tests
    )
    .is_ok());

    // the stock suite against the same fault reports the aggregate failure
    let mut tests = TbTests::new();
    tests.push(Test::new("verify_transitions".to_string(), |sim_root| {
        harness::verify_transitions(sim_root).boxed()
    }));
    assert!(run_all(
        Box::new(PlayerFsm::with_fault(Fault::StuckMoveInWindup)),
        tests
    )
    .is_err());
}

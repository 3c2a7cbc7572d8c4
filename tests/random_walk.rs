mod common;

use common::PlayerFsm;
use player_fsm_tb::prelude::*;

const CYCLES: u32 = 500;

// Drive random legal key vectors and check state and flags against the
// reference table every cycle.
async fn random_walk_matches_model(sim_root: SimObject) -> TbResult {
    let bench = FsmBench::new(sim_root);
    Task::fork(testbench::clock(bench.clock, harness::CLK_PERIOD_US, "us"));
    let scoreboard: Scoreboard<(u32, u8)> = Scoreboard::new();

    bench.drive(Keys::RELEASED);
    utils::clock_cycles(bench.clock, 2).await?;

    let mut state = State::Idle;
    for _ in 0..CYCLES {
        let keys = Keys::legal()[utils::rand_int(6) as usize];
        bench.drive(keys);
        bench.clock.rising_edge_ro().await?;

        let (expect_state, expect_flags) = fsm::transition(state, keys);
        scoreboard.add_exp((expect_state.code(), expect_flags.bits()));

        let got_state = bench
            .state
            .try_u32()
            .map_err(|_| Val::String("STATE is indeterminate".to_string()))?;
        let got_flags = verifier::read_flags(&bench)
            .map_err(|_| Val::String("flags are indeterminate".to_string()))?;
        scoreboard.add_recv((got_state, got_flags.bits()));

        state = expect_state;
    }
    scoreboard.result()
}

#[test]
fn random_stimulus_matches_reference_model() {
    let mut tests = TbTests::new();
    tests.push(Test::new(
        "random_walk_matches_model".to_string(),
        |sim_root| random_walk_matches_model(sim_root).boxed(),
    ));
    assert!(run_all(Box::new(PlayerFsm::new()), tests).is_ok());
}

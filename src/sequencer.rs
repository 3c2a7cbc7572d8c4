use crate::fsm::{Keys, State};
use crate::report::Probe;
use crate::signal::SimObject;
use crate::trigger::Trigger;
use crate::value::Val;
use crate::TbResult;

/// Combinational settle time after an edge before outputs may be trusted.
/// Distinct from edge advancement: the clocked state update and the flag
/// decode both have to flush through the event queue first.
pub const SETTLE_US: u64 = 1;

/// Pin bindings for the player FSM. Key pins are active-low.
pub struct FsmBench {
    pub clock: SimObject,
    left_key: SimObject,
    attack_key: SimObject,
    right_key: SimObject,
    pub state: SimObject,
    pub move_flag: SimObject,
    pub attack_dir_flag: SimObject,
    pub attack_flag: SimObject,
}

impl FsmBench {
    pub fn new(dut: SimObject) -> Self {
        Self {
            clock: dut.c("CLOCK"),
            left_key: dut.c("LEFT_KEY"),
            attack_key: dut.c("ATTACK_KEY"),
            right_key: dut.c("RIGHT_KEY"),
            state: dut.c("STATE"),
            move_flag: dut.c("MOVE_FLAG"),
            attack_dir_flag: dut.c("ATTACK_DIR_FLAG"),
            attack_flag: dut.c("ATTACK_FLAG"),
        }
    }

    /// Everything worth seeing in a post-mortem dump.
    pub fn probes(&self) -> Vec<Probe> {
        vec![
            Probe::scalar("CLOCK", self.clock),
            Probe::scalar("LEFT_KEY", self.left_key),
            Probe::scalar("ATTACK_KEY", self.attack_key),
            Probe::scalar("RIGHT_KEY", self.right_key),
            Probe::bus("STATE", self.state),
            Probe::scalar("MOVE_FLAG", self.move_flag),
            Probe::scalar("ATTACK_DIR_FLAG", self.attack_dir_flag),
            Probe::scalar("ATTACK_FLAG", self.attack_flag),
        ]
    }

    /// Drive one normalized key vector onto the active-low pins. The vector
    /// must stay stable from here until past the edge that consumes it.
    pub fn drive(&self, keys: Keys) {
        self.left_key.set(!keys.left as u32);
        self.attack_key.set(!keys.attack as u32);
        self.right_key.set(!keys.right as u32);
    }

    pub async fn settle(&self) -> TbResult {
        Trigger::timer(SETTLE_US, "us").await;
        Ok(Val::None)
    }

    /// Reconstruct `initial` deterministically, always routing through IDLE:
    /// release everything for two edges, then drive the setup vector that
    /// reaches the requested state from IDLE.
    pub async fn reach(&self, initial: State) -> TbResult {
        self.drive(Keys::RELEASED);
        self.clock.rising_edge().await;
        self.clock.rising_edge().await;
        self.settle().await?;

        match initial {
            State::Idle => {
                self.clock.rising_edge().await;
            }
            State::MoveLeft => {
                self.drive(Keys::LEFT);
                self.clock.rising_edge().await;
            }
            State::MoveRight => {
                self.drive(Keys::RIGHT);
                self.clock.rising_edge().await;
            }
            State::AttackStart => {
                self.drive(Keys::ATTACK);
                self.clock.rising_edge().await;
            }
            State::AttackActive => {
                // two-cycle windup: attack for one edge, released for another
                self.drive(Keys::ATTACK);
                self.clock.rising_edge().await;
                self.drive(Keys::RELEASED);
                self.clock.rising_edge().await;
            }
        }
        self.settle().await?;
        Ok(Val::None)
    }

    /// Apply the vector under test for exactly one edge, then settle so the
    /// verifier can sample.
    pub async fn apply(&self, keys: Keys) -> TbResult {
        self.drive(keys);
        self.clock.rising_edge().await;
        self.settle().await?;
        Ok(Val::None)
    }
}

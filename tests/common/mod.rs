#![allow(dead_code)]

use player_fsm_tb::prelude::*;

// STATE bus encoding
const IDLE: u64 = 0;
const MOVE_LEFT: u64 = 1;
const MOVE_RIGHT: u64 = 2;
const ATTACK_START: u64 = 3;
const ATTACK_ACTIVE: u64 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    None,
    /// asserts MOVE_FLAG during a plain attack windup
    StuckMoveInWindup,
    /// never drives ATTACK_FLAG, so reads of it stay indeterminate
    UndrivenAttackFlag,
}

/// Behavioral stand-in for the synthesized player FSM. Active-low keys, a
/// two-cycle attack windup and a hidden direction latch that shows up in the
/// flags while a directional attack winds up.
pub struct PlayerFsm {
    fault: Fault,
    clk: usize,
    left: usize,
    attack: usize,
    right: usize,
    state_o: usize,
    move_f: usize,
    dir_f: usize,
    atk_f: usize,
    state: u64,
    dir_latch: bool,
    prev_clk: bool,
}

impl PlayerFsm {
    pub fn new() -> Self {
        Self::with_fault(Fault::None)
    }

    pub fn with_fault(fault: Fault) -> Self {
        Self {
            fault,
            clk: 0,
            left: 0,
            attack: 0,
            right: 0,
            state_o: 0,
            move_f: 0,
            dir_f: 0,
            atk_f: 0,
            state: IDLE,
            dir_latch: false,
            prev_clk: false,
        }
    }
}

impl Design for PlayerFsm {
    fn declare(&mut self, scope: &mut Scope) {
        self.clk = scope.wire("CLOCK", 1);
        self.left = scope.wire("LEFT_KEY", 1);
        self.attack = scope.wire("ATTACK_KEY", 1);
        self.right = scope.wire("RIGHT_KEY", 1);
        self.state_o = scope.wire("STATE", 3);
        self.move_f = scope.wire("MOVE_FLAG", 1);
        self.dir_f = scope.wire("ATTACK_DIR_FLAG", 1);
        self.atk_f = scope.wire("ATTACK_FLAG", 1);
    }

    fn eval(&mut self, vars: &mut VarTable) {
        let clk = vars.bit(self.clk).unwrap_or(false);
        if clk && !self.prev_clk {
            // keys are active-low pins
            let left = vars.bit(self.left).map(|b| !b).unwrap_or(false);
            let attack = vars.bit(self.attack).map(|b| !b).unwrap_or(false);
            let right = vars.bit(self.right).map(|b| !b).unwrap_or(false);
            let (next, dir) = match self.state {
                ATTACK_START => (ATTACK_ACTIVE, false),
                ATTACK_ACTIVE => (IDLE, false),
                _ => {
                    if attack {
                        (ATTACK_START, left || right)
                    } else if left {
                        (MOVE_LEFT, false)
                    } else if right {
                        (MOVE_RIGHT, false)
                    } else {
                        (IDLE, false)
                    }
                }
            };
            self.state = next;
            self.dir_latch = dir;
        }
        self.prev_clk = clk;

        vars.set(self.state_o, self.state);
        let mut flags: u64 = match (self.state, self.dir_latch) {
            (ATTACK_START, true) => 0b011,
            (ATTACK_START, false) | (ATTACK_ACTIVE, _) => 0b100,
            (MOVE_LEFT, _) | (MOVE_RIGHT, _) => 0b001,
            _ => 0b000,
        };
        if self.fault == Fault::StuckMoveInWindup && self.state == ATTACK_START && !self.dir_latch
        {
            flags |= 0b001;
        }
        vars.set(self.move_f, flags & 1);
        vars.set(self.dir_f, flags >> 1 & 1);
        if self.fault != Fault::UndrivenAttackFlag {
            vars.set(self.atk_f, flags >> 2 & 1);
        }
    }
}

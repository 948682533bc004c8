//! The accelerator controller: a register file in front of a fixed
//! one-state-per-tick encryption schedule.

use aes_core::{
    add_round_key, block_to_words, cipher_round, next_round_key, words_to_block, Block,
    ROUND_KEY_COUNT,
};
use log::{debug, trace};

use crate::error::RegisterError;
use crate::regs::{
    ControlWrite, Register, RegisterFile, STATUS_BUSY, STATUS_DONE, STATUS_IRQ_ENABLE,
};
use crate::state::{ControllerState, EXPAND_STEPS, LAST_MIDDLE_ROUND};

/// Ticks from the tick that accepts a start until the completion flag is set:
/// five key-expansion steps, the initial round, nine middle rounds, the final
/// round and the output latch.
pub const LATENCY_STEPS: u64 = 17;

/// Private working copies, latched when a start is accepted.
#[derive(Debug, Clone, Default)]
struct Datapath {
    plaintext: Block,
    round_keys: [Block; ROUND_KEY_COUNT],
    keys_ready: usize,
    state: Block,
}

/// A single accelerator instance.
///
/// Register accesses go through [`Controller::write`] and
/// [`Controller::read`]; nothing they stage is acted upon until the next
/// [`Controller::tick`].
#[derive(Debug, Clone, Default)]
pub struct Controller {
    regs: RegisterFile,
    pending: Option<ControlWrite>,
    state: ControllerState,
    datapath: Datapath,
    done: bool,
    irq_enable: bool,
    irq_level: bool,
    irq: bool,
    steps: u64,
}

impl Controller {
    /// Creates an idle controller with all registers zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a register write.
    ///
    /// Key and plaintext words land in the register file immediately but are
    /// only sampled when a start is accepted. Control writes take effect on the
    /// next tick; a second control write before that tick replaces the first.
    pub fn write(&mut self, offset: u32, value: u32) -> Result<(), RegisterError> {
        match Register::decode(offset)? {
            Register::Key(n) => self.regs.key[n] = value,
            Register::Plaintext(n) => self.regs.plaintext[n] = value,
            Register::Control => self.pending = Some(ControlWrite::from(value)),
            reg @ Register::Ciphertext(_) => return Err(RegisterError::ReadOnly(reg)),
        }
        Ok(())
    }

    /// Reads a register snapshot.
    pub fn read(&self, offset: u32) -> Result<u32, RegisterError> {
        match Register::decode(offset)? {
            Register::Ciphertext(n) => Ok(self.regs.ciphertext[n]),
            Register::Control => Ok(self.status()),
            reg => Err(RegisterError::WriteOnly(reg)),
        }
    }

    /// Current value of the status register.
    pub fn status(&self) -> u32 {
        let mut status = 0;
        if self.state.is_busy() {
            status |= STATUS_BUSY;
        }
        if self.done {
            status |= STATUS_DONE;
        }
        if self.irq_enable {
            status |= STATUS_IRQ_ENABLE;
        }
        status
    }

    /// Advances the controller by one step.
    ///
    /// The interrupt line is the rising edge of `done && irq_enable`, sampled
    /// after this tick's control write and output latch.
    pub fn tick(&mut self) {
        let request = self.pending.take();
        if let Some(ctrl) = request {
            if ctrl.clear_done {
                self.done = false;
            }
            self.irq_enable = ctrl.irq_enable;
        }
        let start = request.is_some_and(|ctrl| ctrl.start);
        if start && self.state.is_busy() {
            debug!("start ignored while {}", self.state);
        }

        let next = self.advance(start);
        if next != self.state {
            trace!("step {}: {} -> {}", self.steps, self.state, next);
        }
        self.state = next;

        let level = self.done && self.irq_enable;
        self.irq = level && !self.irq_level;
        self.irq_level = level;
        self.steps += 1;
    }

    fn advance(&mut self, start: bool) -> ControllerState {
        let dp = &mut self.datapath;
        match self.state {
            ControllerState::Idle => {
                if !start {
                    return ControllerState::Idle;
                }
                dp.round_keys[0] = words_to_block(&self.regs.key);
                dp.plaintext = words_to_block(&self.regs.plaintext);
                dp.keys_ready = 1;
                ControllerState::ExpandKeys(0)
            }
            ControllerState::ExpandKeys(k) => {
                let first = 2 * k as usize + 1;
                for round in first..first + 2 {
                    dp.round_keys[round] = next_round_key(&dp.round_keys[round - 1], round);
                }
                dp.keys_ready = first + 2;
                if k + 1 == EXPAND_STEPS {
                    ControllerState::InitialRound
                } else {
                    ControllerState::ExpandKeys(k + 1)
                }
            }
            ControllerState::InitialRound => {
                dp.state = add_round_key(dp.plaintext, &dp.round_keys[0]);
                ControllerState::MiddleRounds(1)
            }
            ControllerState::MiddleRounds(r) => {
                dp.state = cipher_round(dp.state, &dp.round_keys[r as usize], false);
                if r == LAST_MIDDLE_ROUND {
                    ControllerState::FinalRound
                } else {
                    ControllerState::MiddleRounds(r + 1)
                }
            }
            ControllerState::FinalRound => {
                dp.state = cipher_round(dp.state, &dp.round_keys[ROUND_KEY_COUNT - 1], true);
                ControllerState::Done
            }
            ControllerState::Done => {
                self.regs.ciphertext = block_to_words(&dp.state);
                self.done = true;
                ControllerState::Idle
            }
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether an operation is in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Whether the completion flag is set.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether the completion interrupt fired during the last tick.
    #[inline]
    pub fn irq(&self) -> bool {
        self.irq
    }

    /// Total ticks since construction.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Number of round keys the in-flight (or last) operation has derived.
    #[inline]
    pub fn round_keys_ready(&self) -> usize {
        self.datapath.keys_ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{
        CIPHERTEXT_OFFSET, CTRL_CLEAR_DONE, CTRL_IRQ_ENABLE, CTRL_OFFSET, CTRL_START, KEY_OFFSET,
        PLAINTEXT_OFFSET,
    };

    const NIST_KEY: Block = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];
    const NIST_PLAIN: Block = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];
    const NIST_CIPHER: Block = [
        0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4, 0xc5,
        0x5a,
    ];

    fn load(ctrl: &mut Controller, key: &Block, plain: &Block) {
        for (i, word) in block_to_words(key).into_iter().enumerate() {
            ctrl.write(KEY_OFFSET + 4 * i as u32, word).unwrap();
        }
        for (i, word) in block_to_words(plain).into_iter().enumerate() {
            ctrl.write(PLAINTEXT_OFFSET + 4 * i as u32, word).unwrap();
        }
    }

    fn ciphertext(ctrl: &Controller) -> Block {
        let words: [u32; 4] =
            std::array::from_fn(|i| ctrl.read(CIPHERTEXT_OFFSET + 4 * i as u32).unwrap());
        words_to_block(&words)
    }

    /// Starts an operation and returns the number of ticks after acceptance
    /// until the completion flag appeared.
    fn run(ctrl: &mut Controller) -> u64 {
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        ctrl.tick();
        assert_eq!(ctrl.state(), ControllerState::ExpandKeys(0));
        let mut ticks = 0;
        while !ctrl.is_done() {
            ctrl.tick();
            ticks += 1;
            assert!(ticks <= LATENCY_STEPS, "controller never completed");
        }
        ticks
    }

    #[test]
    fn encrypts_nist_vector_in_seventeen_steps() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        assert_eq!(run(&mut ctrl), LATENCY_STEPS);
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(ciphertext(&ctrl), NIST_CIPHER);
    }

    #[test]
    fn walks_the_fixed_schedule() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();

        let mut expected = vec![];
        expected.extend((0..5).map(ControllerState::ExpandKeys));
        expected.push(ControllerState::InitialRound);
        expected.extend((1..=9).map(ControllerState::MiddleRounds));
        expected.push(ControllerState::FinalRound);
        expected.push(ControllerState::Done);
        expected.push(ControllerState::Idle);

        let seen: Vec<_> = expected
            .iter()
            .map(|_| {
                ctrl.tick();
                ctrl.state()
            })
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn key_expansion_finishes_before_rounds() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        ctrl.tick();
        assert_eq!(ctrl.round_keys_ready(), 1);
        for step in 0..5 {
            ctrl.tick();
            assert_eq!(ctrl.round_keys_ready(), 2 * step + 3);
        }
        assert_eq!(ctrl.state(), ControllerState::InitialRound);
        assert_eq!(ctrl.round_keys_ready(), ROUND_KEY_COUNT);
    }

    #[test]
    fn start_while_busy_is_ignored() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        ctrl.tick();
        for _ in 0..4 {
            ctrl.tick();
        }

        // New operands and a second start mid-flight.
        load(&mut ctrl, &[0xaa; 16], &[0x55; 16]);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        while !ctrl.is_done() {
            ctrl.tick();
        }
        assert_eq!(ciphertext(&ctrl), NIST_CIPHER);

        // The ignored start was not queued.
        ctrl.tick();
        assert_eq!(ctrl.state(), ControllerState::Idle);
    }

    #[test]
    fn control_write_waits_for_next_tick() {
        let mut ctrl = Controller::new();
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(ctrl.read(CTRL_OFFSET), Ok(0));
        ctrl.tick();
        assert_eq!(ctrl.read(CTRL_OFFSET), Ok(STATUS_BUSY));
    }

    #[test]
    fn clear_done_applies_on_next_tick() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        run(&mut ctrl);
        assert_eq!(ctrl.status(), STATUS_DONE);

        ctrl.write(CTRL_OFFSET, CTRL_CLEAR_DONE).unwrap();
        assert!(ctrl.is_done());
        ctrl.tick();
        assert!(!ctrl.is_done());
        assert_eq!(ciphertext(&ctrl), NIST_CIPHER);
    }

    #[test]
    fn clear_done_while_busy() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        run(&mut ctrl);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        ctrl.tick();
        assert_eq!(ctrl.status(), STATUS_BUSY | STATUS_DONE);
        ctrl.write(CTRL_OFFSET, CTRL_CLEAR_DONE).unwrap();
        ctrl.tick();
        assert_eq!(ctrl.status(), STATUS_BUSY);
    }

    #[test]
    fn irq_pulses_once_per_operation() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        ctrl.write(CTRL_OFFSET, CTRL_START | CTRL_IRQ_ENABLE)
            .unwrap();

        let mut pulses = vec![];
        for tick in 0..40 {
            ctrl.tick();
            if ctrl.irq() {
                pulses.push(tick);
            }
        }
        // Acceptance on tick 0, completion seventeen ticks later.
        assert_eq!(pulses, vec![LATENCY_STEPS]);
        assert_eq!(ctrl.status(), STATUS_DONE | STATUS_IRQ_ENABLE);
    }

    #[test]
    fn enabling_irq_with_pending_done_fires() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        run(&mut ctrl);
        assert!(!ctrl.irq());

        ctrl.write(CTRL_OFFSET, CTRL_IRQ_ENABLE).unwrap();
        ctrl.tick();
        assert!(ctrl.irq());
        ctrl.tick();
        assert!(!ctrl.irq());
    }

    #[test]
    fn completion_without_clear_does_not_refire() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        let start = CTRL_START | CTRL_IRQ_ENABLE;

        let mut pulses = 0;
        for _ in 0..2 {
            ctrl.write(CTRL_OFFSET, start).unwrap();
            for _ in 0..=LATENCY_STEPS {
                ctrl.tick();
                pulses += usize::from(ctrl.irq());
            }
            assert!(ctrl.is_done());
        }
        assert_eq!(pulses, 1);

        // Clearing and completing again produces a fresh edge.
        ctrl.write(CTRL_OFFSET, start | CTRL_CLEAR_DONE).unwrap();
        for _ in 0..=LATENCY_STEPS {
            ctrl.tick();
            pulses += usize::from(ctrl.irq());
        }
        assert_eq!(pulses, 2);
    }

    #[test]
    fn irq_disabled_keeps_done_flag() {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &NIST_KEY, &NIST_PLAIN);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        let mut fired = false;
        for _ in 0..=LATENCY_STEPS {
            ctrl.tick();
            fired |= ctrl.irq();
        }
        assert!(!fired);
        assert!(ctrl.is_done());

        ctrl.write(CTRL_OFFSET, CTRL_IRQ_ENABLE).unwrap();
        ctrl.tick();
        ctrl.write(CTRL_OFFSET, 0).unwrap();
        ctrl.tick();
        assert!(ctrl.is_done());
        assert_eq!(ctrl.status() & STATUS_IRQ_ENABLE, 0);
    }

    #[test]
    fn register_directions_are_enforced() {
        let mut ctrl = Controller::new();
        assert_eq!(
            ctrl.read(KEY_OFFSET),
            Err(RegisterError::WriteOnly(Register::Key(0)))
        );
        assert_eq!(
            ctrl.read(PLAINTEXT_OFFSET + 8),
            Err(RegisterError::WriteOnly(Register::Plaintext(2)))
        );
        assert_eq!(
            ctrl.write(CIPHERTEXT_OFFSET + 4, 1),
            Err(RegisterError::ReadOnly(Register::Ciphertext(1)))
        );
        assert_eq!(ctrl.write(0x31, 1), Err(RegisterError::Unaligned(0x31)));
    }
}

//! Controller states.

use core::fmt;

/// Number of key-expansion steps; each derives two round keys.
pub const EXPAND_STEPS: u8 = 5;

/// Index of the last middle round.
pub const LAST_MIDDLE_ROUND: u8 = 9;

/// Position of the controller in its fixed schedule.
///
/// One operation walks `Idle -> ExpandKeys(0..=4) -> InitialRound ->
/// MiddleRounds(1..=9) -> FinalRound -> Done -> Idle`, one state per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControllerState {
    /// Waiting for a start request.
    #[default]
    Idle,
    /// Deriving round keys `2k + 1` and `2k + 2` (`k` in 0..=4).
    ExpandKeys(u8),
    /// Whitening the plaintext with round key 0.
    InitialRound,
    /// Running full round `r` (1..=9).
    MiddleRounds(u8),
    /// Running round 10 without MixColumns.
    FinalRound,
    /// Latching the ciphertext and raising the completion flag.
    Done,
}

impl ControllerState {
    /// Whether an operation is in flight.
    #[inline]
    pub fn is_busy(self) -> bool {
        self != ControllerState::Idle
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Idle => f.write_str("idle"),
            ControllerState::ExpandKeys(k) => write!(f, "expand-keys[{k}]"),
            ControllerState::InitialRound => f.write_str("initial-round"),
            ControllerState::MiddleRounds(r) => write!(f, "round[{r}]"),
            ControllerState::FinalRound => f.write_str("final-round"),
            ControllerState::Done => f.write_str("done"),
        }
    }
}

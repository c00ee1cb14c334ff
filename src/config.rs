//! Match configuration: field geometry, ship template, game mode and the
//! termination and controller-timeout policies.

use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DEFAULT_FIELD_WIDTH: u32 = 10;
pub const DEFAULT_FIELD_HEIGHT: u32 = 10;
pub const DEFAULT_SHIP_SIZES: [u32; 5] = [2, 3, 3, 4, 5];
pub const DEFAULT_MATCH_ROUNDS: u32 = 100;
pub const DEFAULT_CONTROLLER_TIMEOUT: Duration = Duration::from_secs(1);

/// Rule set a round is played under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Free-for-all classic battleship.
    Classic,
    /// Team play. Declared but not supported by any round variant.
    Teams,
}

/// How a match decides that it is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundMode {
    /// Over once `match_rounds` rounds have been played.
    AllRounds,
    /// Over once any player has won `match_rounds` rounds.
    FirstTo,
}

/// What happens to a player whose controller times out or faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeoutPolicy {
    /// The turn is lost and play continues.
    Forfeit,
    /// The player is eliminated from the round on the first failure.
    Eliminate,
    /// The player is eliminated once its failures within a round reach the count.
    EliminateAfter(u32),
}

impl TimeoutPolicy {
    /// Whether a player with `failures` failures in the current round is out.
    pub fn eliminates(&self, failures: u32) -> bool {
        match self {
            TimeoutPolicy::Forfeit => false,
            TimeoutPolicy::Eliminate => failures >= 1,
            TimeoutPolicy::EliminateAfter(limit) => failures >= (*limit).max(1),
        }
    }
}

/// Configuration snapshot a match is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub field_width: u32,
    pub field_height: u32,
    pub ship_sizes: Vec<u32>,
    pub game_mode: Vec<GameMode>,
    /// Reject `add_player` once the first round has been played.
    pub match_playeradd_init_only: bool,
    pub match_teams: u32,
    pub match_rounds_mode: RoundMode,
    /// Round count for `AllRounds`, score threshold for `FirstTo`.
    pub match_rounds: u32,
    /// Deadline for every call into a controller.
    pub controller_timeout: Duration,
    pub timeout_policy: TimeoutPolicy,
    /// Turns after which a round ends without a winner. `None` picks
    /// `2 * width * height * participants`.
    pub round_turn_limit: Option<u32>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            field_width: DEFAULT_FIELD_WIDTH,
            field_height: DEFAULT_FIELD_HEIGHT,
            ship_sizes: DEFAULT_SHIP_SIZES.to_vec(),
            game_mode: vec![GameMode::Classic],
            match_playeradd_init_only: true,
            match_teams: 1,
            match_rounds_mode: RoundMode::AllRounds,
            match_rounds: DEFAULT_MATCH_ROUNDS,
            controller_timeout: DEFAULT_CONTROLLER_TIMEOUT,
            timeout_policy: TimeoutPolicy::Forfeit,
            round_turn_limit: None,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, width: u32, height: u32) -> Self {
        self.field_width = width;
        self.field_height = height;
        self
    }

    pub fn with_ship_sizes(mut self, sizes: impl Into<Vec<u32>>) -> Self {
        self.ship_sizes = sizes.into();
        self
    }

    pub fn with_game_modes(mut self, modes: impl Into<Vec<GameMode>>) -> Self {
        self.game_mode = modes.into();
        self
    }

    pub fn with_playeradd_init_only(mut self, init_only: bool) -> Self {
        self.match_playeradd_init_only = init_only;
        self
    }

    pub fn with_teams(mut self, teams: u32) -> Self {
        self.match_teams = teams;
        self
    }

    pub fn with_rounds(mut self, mode: RoundMode, rounds: u32) -> Self {
        self.match_rounds_mode = mode;
        self.match_rounds = rounds;
        self
    }

    pub fn with_controller_timeout(mut self, timeout: Duration) -> Self {
        self.controller_timeout = timeout;
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    pub fn with_round_turn_limit(mut self, limit: u32) -> Self {
        self.round_turn_limit = Some(limit);
        self
    }

    /// Turn limit for a round with `participants` players.
    pub fn turn_limit(&self, participants: usize) -> u32 {
        self.round_turn_limit.unwrap_or_else(|| {
            let cells = self.field_width.saturating_mul(self.field_height);
            cells
                .saturating_mul(2)
                .saturating_mul(participants.max(1) as u32)
        })
    }

    /// Check that the configuration can drive a match.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.game_mode.is_empty() {
            return Err(EngineError::config("no game mode configured"));
        }
        if let Some(mode) = self.game_mode.iter().find(|m| **m == GameMode::Teams) {
            return Err(EngineError::config(format!(
                "the {:?} game mode is not supported",
                mode
            )));
        }
        if self.match_teams != 1 {
            return Err(EngineError::config(format!(
                "{} teams requested, only free-for-all play is supported",
                self.match_teams
            )));
        }
        if self.field_width == 0 || self.field_height == 0 {
            return Err(EngineError::config(format!(
                "field {}x{} has no cells",
                self.field_width, self.field_height
            )));
        }
        if self.ship_sizes.is_empty() {
            return Err(EngineError::config("no ships configured"));
        }
        let longest = self.field_width.max(self.field_height);
        if let Some(size) = self.ship_sizes.iter().find(|s| **s == 0 || **s > longest) {
            return Err(EngineError::config(format!(
                "ship of size {} does not fit a {}x{} field",
                size, self.field_width, self.field_height
            )));
        }
        let cells: u64 = self.ship_sizes.iter().map(|s| *s as u64).sum();
        if cells > self.field_width as u64 * self.field_height as u64 {
            return Err(EngineError::config(format!(
                "{} ship cells exceed the {}x{} field",
                cells, self.field_width, self.field_height
            )));
        }
        if self.match_rounds == 0 {
            return Err(EngineError::config("match_rounds must be at least 1"));
        }
        if self.controller_timeout.is_zero() {
            return Err(EngineError::config("controller_timeout must be positive"));
        }
        if self.round_turn_limit == Some(0) {
            return Err(EngineError::config("round_turn_limit must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Configuration::default();
        assert_eq!(config.ship_sizes, vec![2, 3, 3, 4, 5]);
        assert_eq!(config.match_rounds_mode, RoundMode::AllRounds);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_teams_mode() {
        let config = Configuration::new().with_game_modes([GameMode::Classic, GameMode::Teams]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
        assert!(err.to_string().contains("Teams"));
    }

    #[test]
    fn rejects_ships_that_cannot_fit() {
        let config = Configuration::new().with_field(3, 3).with_ship_sizes([4]);
        assert!(config.validate().is_err());
        let config = Configuration::new().with_field(2, 2).with_ship_sizes([2, 2, 2]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_policy_thresholds() {
        assert!(!TimeoutPolicy::Forfeit.eliminates(50));
        assert!(TimeoutPolicy::Eliminate.eliminates(1));
        assert!(!TimeoutPolicy::EliminateAfter(3).eliminates(2));
        assert!(TimeoutPolicy::EliminateAfter(3).eliminates(3));
    }

    #[test]
    fn automatic_turn_limit_scales_with_field() {
        let config = Configuration::new().with_field(4, 5);
        assert_eq!(config.turn_limit(2), 80);
        assert_eq!(config.with_round_turn_limit(7).turn_limit(2), 7);
    }
}

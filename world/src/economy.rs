//! Gold and base-health ledger.

use tracing::info;

/// Tracks the player's gold and the health of the base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Economy {
    gold: u32,
    health: u32,
    starting_health: u32,
    game_over: bool,
}

impl Economy {
    pub(crate) const fn new(starting_gold: u32, starting_health: u32) -> Self {
        Self {
            gold: starting_gold,
            health: starting_health,
            starting_health,
            game_over: false,
        }
    }

    /// Gold currently available.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Remaining base health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Health the base started with. Health never rises above this value.
    #[must_use]
    pub const fn starting_health(&self) -> u32 {
        self.starting_health
    }

    /// Reports whether the base has fallen.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Reports whether the player holds at least `cost` gold.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.gold >= cost
    }

    /// Debits `cost` if affordable. Nothing changes on refusal.
    pub(crate) fn try_purchase(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.gold -= cost;
        true
    }

    pub(crate) fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Damages the base, returning `true` only for the hit that ends the game.
    pub(crate) fn take_damage(&mut self, amount: u32) -> bool {
        if self.game_over {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.game_over = true;
            info!("base destroyed");
            return true;
        }
        false
    }
}

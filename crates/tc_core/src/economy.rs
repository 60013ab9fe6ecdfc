//! Population economy.
//!
//! Each side holds a population pool that pays for new units. The pool grows
//! when that side's turn begins, by a fixed amount per owned city, and never
//! exceeds [`POPULATION_CAP`]. Territory count is derived from the map.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::map::HexMap;
use crate::unit::Player;

/// Upper bound on a side's population.
pub const POPULATION_CAP: u32 = 20;

/// Population gained per owned city at the start of a turn.
pub const CITY_INCOME: u32 = 2;

/// Population each side begins a level with.
pub const STARTING_POPULATION: u32 = 5;

/// Territory count before the map has been scanned.
pub const STARTING_TERRITORIES: u32 = 1;

/// Per-side resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resources {
    /// Spendable population.
    pub population: u32,
    /// Number of hexes owned. Recomputed from the map.
    pub territories: u32,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            population: STARTING_POPULATION,
            territories: STARTING_TERRITORIES,
        }
    }
}

impl Resources {
    /// Whether the pool can pay `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.population >= cost
    }

    /// Deduct `cost`. Returns `false` and leaves the pool untouched if short.
    pub fn spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.population -= cost;
        true
    }

    /// Add income for `cities` owned cities, respecting the cap.
    ///
    /// Returns the amount actually gained.
    pub fn collect_income(&mut self, cities: u32) -> u32 {
        let before = self.population;
        self.population = self
            .population
            .saturating_add(CITY_INCOME.saturating_mul(cities))
            .min(POPULATION_CAP);
        self.population.saturating_sub(before)
    }

    /// Refresh the territory count of `side` from the map.
    pub fn refresh_territories(&mut self, map: &HexMap, side: Player) {
        self.territories = map.territory_count(side);
    }
}

/// Start-of-turn tick for `side`: collect city income and recount territory.
///
/// Returns the population gained.
pub fn begin_turn(resources: &mut Resources, map: &HexMap, side: Player) -> u32 {
    let cities = map.cities_owned_by(side).len() as u32;
    let gained = resources.collect_income(cities);
    resources.refresh_territories(map, side);
    tracing::debug!(
        ?side,
        cities,
        gained,
        population = resources.population,
        "resource tick"
    );
    gained
}

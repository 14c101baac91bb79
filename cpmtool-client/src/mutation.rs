//! Gameplay-state mutations.
//!
//! Each variant maps to one POST endpoint whose body is the auth token plus
//! the variant's arguments, and whose envelope `ok` is the result.

use serde_json::{Map, Value, json};

/// A state change applied to the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetRank,
    UnlockSmoke,
    UnlockW16,
    SetRaceLoses(i64),
    SetRaceWins(i64),
    UnlockClothesMale,
    UnlockClothesFemale,
    UnlockHouses,
    UnlockAnimations,
    SetName(String),
    SetId(String),
    SetMoney(i64),
    SetCoins(i64),
    UnlockHorns,
    UnlockWheels,
    DisableEngineDamage,
    UnlimitedFuel,
}

impl Mutation {
    /// Endpoint name, relative to the base URL.
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::SetRank => "set_rank",
            Self::UnlockSmoke => "unlock_smoke",
            Self::UnlockW16 => "unlock_w16",
            Self::SetRaceLoses(_) => "set_race_loses",
            Self::SetRaceWins(_) => "set_race_wins",
            Self::UnlockClothesMale => "unlock_clothes_male",
            Self::UnlockClothesFemale => "unlock_clothes_female",
            Self::UnlockHouses => "unlock_houses",
            Self::UnlockAnimations => "unlock_animations",
            Self::SetName(_) => "set_name",
            Self::SetId(_) => "set_id",
            Self::SetMoney(_) => "set_money",
            Self::SetCoins(_) => "set_coin",
            Self::UnlockHorns => "unlock_horns",
            Self::UnlockWheels => "unlock_wheels",
            Self::DisableEngineDamage => "unlock_disable_damage",
            Self::UnlimitedFuel => "unlimited_fuel",
        }
    }

    /// Body fields besides the auth token.
    #[must_use]
    pub fn arguments(&self) -> Map<String, Value> {
        let mut args = Map::new();
        match self {
            Self::SetRaceLoses(amount)
            | Self::SetRaceWins(amount)
            | Self::SetMoney(amount)
            | Self::SetCoins(amount) => {
                args.insert("amount".to_string(), json!(amount));
            }
            Self::SetName(name) => {
                args.insert("name".to_string(), json!(name));
            }
            Self::SetId(id) => {
                args.insert("id".to_string(), json!(id));
            }
            _ => {}
        }
        args
    }
}

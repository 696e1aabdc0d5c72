//! Game-sync assignments
//!
//! Game syncs are runtime variables (states and switches) set by the game.
//! A render context assigns one value per (type, group); an empty context
//! means "enumerate every alternative".

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of game sync variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameSyncType {
    Switch,
    State,
}

impl GameSyncType {
    /// Map the bank's `eGroupType` value.
    #[must_use]
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            0 => Some(GameSyncType::Switch),
            1 => Some(GameSyncType::State),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GameSyncType::Switch => "switch",
            GameSyncType::State => "state",
        }
    }
}

impl fmt::Display for GameSyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameSyncType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "switch" | "0" => Ok(GameSyncType::Switch),
            "state" | "1" => Ok(GameSyncType::State),
            other => Err(format!("unknown game sync type '{other}'")),
        }
    }
}

/// One game sync assignment: group `group` of type `gtype` set to `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameSync {
    #[serde(rename = "type")]
    pub gtype: GameSyncType,
    pub group: u32,
    pub value: u32,
}

impl GameSync {
    #[must_use]
    pub fn new(gtype: GameSyncType, group: u32, value: u32) -> Self {
        Self {
            gtype,
            group,
            value,
        }
    }
}

impl fmt::Display for GameSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.gtype, self.group, self.value)
    }
}

/// Parses `type:group:value`, e.g. `switch:1234:5678`.
impl FromStr for GameSync {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [gtype, group, value] = parts.as_slice() else {
            return Err(format!("expected type:group:value, got '{s}'"));
        };
        let group = group
            .parse()
            .map_err(|_| format!("invalid group id '{group}'"))?;
        let value = value
            .parse()
            .map_err(|_| format!("invalid value '{value}'"))?;
        Ok(GameSync::new(gtype.parse()?, group, value))
    }
}

/// Read-only view of the current game sync context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<GameSync>", into = "Vec<GameSync>")]
pub struct GameSyncParams {
    values: IndexMap<(GameSyncType, u32), u32>,
}

impl GameSyncParams {
    /// Empty context (enumerate alternatives).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context from a list of assignments; later entries override earlier ones.
    #[must_use]
    pub fn from_combo(combo: &[GameSync]) -> Self {
        let mut params = Self::new();
        for gs in combo {
            params.set(gs.gtype, gs.group, gs.value);
        }
        params
    }

    pub fn set(&mut self, gtype: GameSyncType, group: u32, value: u32) {
        self.values.insert((gtype, group), value);
    }

    /// Value assigned to a group, if any.
    pub fn value(&self, gtype: GameSyncType, group: u32) -> Option<u32> {
        self.values.get(&(gtype, group)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = GameSync> + '_ {
        self.values
            .iter()
            .map(|(&(gtype, group), &value)| GameSync::new(gtype, group, value))
    }
}

impl From<Vec<GameSync>> for GameSyncParams {
    fn from(combo: Vec<GameSync>) -> Self {
        Self::from_combo(&combo)
    }
}

impl From<GameSyncParams> for Vec<GameSync> {
    fn from(params: GameSyncParams) -> Self {
        params.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_game_sync() {
        let gs: GameSync = "switch:10:20".parse().unwrap();
        assert_eq!(gs, GameSync::new(GameSyncType::Switch, 10, 20));
        let gs: GameSync = "1:3:4".parse().unwrap();
        assert_eq!(gs.gtype, GameSyncType::State);

        assert!("switch:10".parse::<GameSync>().is_err());
        assert!("bus:1:2".parse::<GameSync>().is_err());
        assert!("state:x:2".parse::<GameSync>().is_err());
    }

    #[test]
    fn test_params_lookup_is_typed() {
        let params = GameSyncParams::from_combo(&[
            GameSync::new(GameSyncType::Switch, 10, 1),
            GameSync::new(GameSyncType::State, 10, 2),
        ]);
        assert_eq!(params.value(GameSyncType::Switch, 10), Some(1));
        assert_eq!(params.value(GameSyncType::State, 10), Some(2));
        assert_eq!(params.value(GameSyncType::State, 11), None);
        assert!(!params.is_empty());
    }

    #[test]
    fn test_params_serialize_as_list() {
        let params = GameSyncParams::from_combo(&[GameSync::new(GameSyncType::Switch, 1, 2)]);
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"[{"type":"switch","group":1,"value":2}]"#);
        let back: GameSyncParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}

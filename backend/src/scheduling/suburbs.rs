//! Suburb travel-time table.
//!
//! Each suburb carries a single "minutes from the CBD" value. The table is
//! built once at start-up and shared read-only; there is no mutation API.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Minutes assumed for suburbs the table does not know.
pub const DEFAULT_UNKNOWN_SUBURB_MINUTES: u32 = 30;

/// Built-in Melbourne metropolitan table (minutes from the CBD).
const MELBOURNE_SUBURBS: &[(&str, u32)] = &[
    ("Melbourne", 0),
    ("Carlton", 5),
    ("Fitzroy", 8),
    ("South Yarra", 10),
    ("Richmond", 12),
    ("St Kilda", 15),
    ("Prahran", 12),
    ("Windsor", 15),
    ("Brighton", 20),
    ("Camberwell", 18),
    ("Hawthorn", 15),
    ("Kew", 20),
    ("Malvern", 18),
    ("Armadale", 22),
    ("Toorak", 15),
    ("Glen Iris", 25),
    ("Caulfield", 20),
    ("Bentleigh", 25),
    ("Moorabbin", 30),
    ("Cheltenham", 35),
    ("Frankston", 45),
    ("Dandenong", 40),
    ("Box Hill", 30),
    ("Ringwood", 35),
    ("Blackburn", 28),
    ("Doncaster", 25),
    ("Templestowe", 30),
    ("Eltham", 35),
    ("Diamond Creek", 40),
    ("Heidelberg", 20),
    ("Ivanhoe", 18),
    ("Preston", 15),
    ("Northcote", 10),
    ("Thornbury", 12),
    ("Brunswick", 8),
    ("Coburg", 15),
    ("Reservoir", 20),
    ("Bundoora", 25),
    ("Mill Park", 30),
    ("Epping", 35),
    ("Craigieburn", 40),
    ("Sunbury", 45),
    ("Werribee", 35),
    ("Hoppers Crossing", 30),
    ("Point Cook", 32),
    ("Williams Landing", 28),
    ("Newport", 15),
    ("Footscray", 12),
    ("Yarraville", 15),
    ("Seddon", 18),
    ("Altona", 20),
    ("Essendon", 18),
    ("Moonee Ponds", 12),
    ("Ascot Vale", 10),
    ("Niddrie", 20),
    ("Airport West", 22),
    ("Keilor", 25),
    ("Tullamarine", 25),
];

/// Coarse area of Melbourne, used to spot routes that wander between areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    InnerCity,
    InnerNorth,
    InnerEast,
    InnerSouth,
    Bayside,
    Eastern,
    /// Everything not listed in a named zone.
    Outer,
}

const MELBOURNE_ZONES: &[(Zone, &[&str])] = &[
    (
        Zone::InnerCity,
        &["Melbourne", "Southbank", "Docklands", "Carlton", "Fitzroy", "Collingwood", "Richmond"],
    ),
    (
        Zone::InnerNorth,
        &["Brunswick", "Northcote", "Thornbury", "Preston", "Coburg", "Parkville"],
    ),
    (
        Zone::InnerEast,
        &["Hawthorn", "Camberwell", "Kew", "Auburn", "Burnley", "Abbotsford"],
    ),
    (
        Zone::InnerSouth,
        &["South Yarra", "Toorak", "Prahran", "Windsor", "St Kilda", "Albert Park"],
    ),
    (
        Zone::Bayside,
        &["Brighton", "Elwood", "Sandringham", "Bentleigh", "Elsternwick", "Balaclava"],
    ),
    (
        Zone::Eastern,
        &["Malvern", "Armadale", "Glen Iris", "Caulfield", "Oakleigh", "Cheltenham"],
    ),
];

impl Zone {
    /// Zone of a suburb name, matched like table lookups.
    pub fn of(suburb: &str) -> Zone {
        let key = normalize(suburb);
        MELBOURNE_ZONES
            .iter()
            .find(|(_, members)| members.iter().any(|name| normalize(name) == key))
            .map(|(zone, _)| *zone)
            .unwrap_or(Zone::Outer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suburb {
    pub name: String,
    pub minutes_from_center: u32,
}

/// Immutable suburb lookup: an arena of entries plus a normalized-name index.
#[derive(Debug, Clone)]
pub struct SuburbTable {
    suburbs: Vec<Suburb>,
    index: HashMap<String, usize>,
    unknown_minutes: u32,
}

impl SuburbTable {
    /// Build a table from `(name, minutes)` pairs. Later entries replace earlier
    /// ones with the same normalized name.
    pub fn from_entries<I, S>(entries: I, unknown_minutes: u32) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut suburbs: Vec<Suburb> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (name, minutes) in entries {
            let name = name.into();
            let key = normalize(&name);
            if key.is_empty() {
                continue;
            }
            match index.get(&key) {
                Some(&slot) => suburbs[slot].minutes_from_center = minutes,
                None => {
                    index.insert(key, suburbs.len());
                    suburbs.push(Suburb {
                        name: name.trim().to_string(),
                        minutes_from_center: minutes,
                    });
                }
            }
        }

        Self {
            suburbs,
            index,
            unknown_minutes,
        }
    }

    /// The built-in Melbourne table.
    pub fn melbourne() -> Self {
        Self::melbourne_with_overrides(&BTreeMap::new(), DEFAULT_UNKNOWN_SUBURB_MINUTES)
    }

    /// The built-in Melbourne table merged with configured overrides.
    pub fn melbourne_with_overrides(overrides: &BTreeMap<String, u32>, unknown_minutes: u32) -> Self {
        let builtin = MELBOURNE_SUBURBS
            .iter()
            .map(|(name, minutes)| ((*name).to_string(), *minutes));
        let extra = overrides.iter().map(|(name, minutes)| (name.clone(), *minutes));
        Self::from_entries(builtin.chain(extra), unknown_minutes)
    }

    /// Minutes from the CBD; unknown or blank names get the fallback value.
    pub fn lookup(&self, name: &str) -> u32 {
        self.get(name)
            .map(|suburb| suburb.minutes_from_center)
            .unwrap_or(self.unknown_minutes)
    }

    pub fn get(&self, name: &str) -> Option<&Suburb> {
        self.index
            .get(&normalize(name))
            .and_then(|&slot| self.suburbs.get(slot))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&normalize(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suburb> {
        self.suburbs.iter()
    }

    pub fn len(&self) -> usize {
        self.suburbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suburbs.is_empty()
    }

    pub fn unknown_minutes(&self) -> u32 {
        self.unknown_minutes
    }
}

impl Default for SuburbTable {
    fn default() -> Self {
        Self::melbourne()
    }
}

/// Case-insensitive key with collapsed whitespace.
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

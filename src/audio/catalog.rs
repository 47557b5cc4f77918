//! Sound catalog
//!
//! Static mapping from sound id to source URL and default volume, plus
//! variation groups (family name -> interchangeable ids).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::CatalogError;

/// Family played on ball/body collisions
pub const COLLISION: &str = "COLLISION";
/// Family played on wall bounces
pub const BOUNCE: &str = "BOUNCE";

/// Shipped sounds: (id, source, default volume)
const BUILTIN_SOUNDS: &[(&str, &str, f32)] = &[
    ("COLLISION_1", "/sounds/collision-1.mp3", 0.6),
    ("COLLISION_2", "/sounds/collision-2.mp3", 0.6),
    ("COLLISION_3", "/sounds/collision-3.mp3", 0.6),
    ("BOUNCE_1", "/sounds/bounce-1.mp3", 0.4),
    ("BOUNCE_2", "/sounds/bounce-2.mp3", 0.4),
    ("LAUNCH", "/sounds/launch.mp3", 0.5),
    ("GOAL", "/sounds/goal.mp3", 1.2), // boosted, the file is mastered quiet
    ("CLICK", "/sounds/click.mp3", 0.3),
    ("WIN", "/sounds/win.mp3", 0.8),
    ("GAME_OVER", "/sounds/game-over.mp3", 0.8),
];

/// Shipped variation groups
const BUILTIN_GROUPS: &[(&str, &[&str])] = &[
    (COLLISION, &["COLLISION_1", "COLLISION_2", "COLLISION_3"]),
    (BOUNCE, &["BOUNCE_1", "BOUNCE_2"]),
];

/// One playable effect
#[derive(Debug, Clone, PartialEq)]
pub struct SoundDescriptor {
    pub id: String,
    /// URL of the encoded audio asset
    pub source: String,
    /// Gain applied when the caller gives no volume (may exceed 1.0)
    pub default_volume: f32,
}

/// On-disk shape of one catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SoundEntry {
    source: String,
    default_volume: f32,
}

/// On-disk shape of a catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    sounds: BTreeMap<String, SoundEntry>,
    #[serde(default)]
    groups: BTreeMap<String, Vec<String>>,
}

/// Sound catalog with variation groups
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    sounds: BTreeMap<String, SoundDescriptor>,
    groups: BTreeMap<String, Vec<String>>,
}

impl SoundCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped with the game
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for &(id, source, volume) in BUILTIN_SOUNDS {
            catalog = catalog.with_sound(id, source, volume);
        }
        for &(family, members) in BUILTIN_GROUPS {
            catalog = catalog.with_group(family, members.iter().copied());
        }
        catalog
    }

    /// Parse and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let catalog = Self {
            sounds: file
                .sounds
                .into_iter()
                .map(|(id, entry)| {
                    let descriptor = SoundDescriptor {
                        id: id.clone(),
                        source: entry.source,
                        default_volume: entry.default_volume,
                    };
                    (id, descriptor)
                })
                .collect(),
            groups: file.groups,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Serialize to the JSON catalog shape
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let file = CatalogFile {
            sounds: self
                .sounds
                .values()
                .map(|d| {
                    let entry = SoundEntry {
                        source: d.source.clone(),
                        default_volume: d.default_volume,
                    };
                    (d.id.clone(), entry)
                })
                .collect(),
            groups: self.groups.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Add (or replace) a sound
    pub fn with_sound(mut self, id: &str, source: &str, default_volume: f32) -> Self {
        self.sounds.insert(
            id.to_owned(),
            SoundDescriptor {
                id: id.to_owned(),
                source: source.to_owned(),
                default_volume,
            },
        );
        self
    }

    /// Add (or replace) a variation group
    pub fn with_group<'a>(mut self, family: &str, members: impl IntoIterator<Item = &'a str>) -> Self {
        self.groups.insert(
            family.to_owned(),
            members.into_iter().map(str::to_owned).collect(),
        );
        self
    }

    /// Check the catalog invariants
    pub fn validate(&self) -> Result<(), CatalogError> {
        for d in self.sounds.values() {
            if !d.default_volume.is_finite() || d.default_volume < 0.0 {
                return Err(CatalogError::InvalidVolume {
                    id: d.id.clone(),
                    volume: d.default_volume,
                });
            }
        }
        for (family, members) in &self.groups {
            if members.is_empty() {
                return Err(CatalogError::EmptyGroup(family.clone()));
            }
            if let Some(id) = members.iter().find(|id| !self.sounds.contains_key(*id)) {
                return Err(CatalogError::UnknownMember {
                    group: family.clone(),
                    id: id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Candidate ids for a family name or bare id.
    ///
    /// A name that is not a group key resolves to itself, known or not.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        match self.groups.get(name) {
            Some(members) => members.iter().map(String::as_str).collect(),
            None => vec![name],
        }
    }

    pub fn get(&self, id: &str) -> Option<&SoundDescriptor> {
        self.sounds.get(id)
    }

    /// All descriptors, sorted by id
    pub fn descriptors(&self) -> impl Iterator<Item = &SoundDescriptor> {
        self.sounds.values()
    }

    /// All variation groups, sorted by family name
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// the three browsable entity kinds, in the order the header lists them
pub const CATEGORIES: [Category; 3] = [
    Category::Characters,
    Category::Locations,
    Category::Episodes,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Characters,
    Locations,
    Episodes,
}

impl Category {
    /// The tag used in the view query string (`category=Characters`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Characters => "Characters",
            Self::Locations => "Locations",
            Self::Episodes => "Episodes",
        }
    }

    /// Lowercase, depluralized tag addressing the listing endpoint.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Characters => "character",
            Self::Locations => "location",
            Self::Episodes => "episode",
        }
    }

    /// Exact tag match, as the view query requires.
    pub fn from_tag(tag: &str) -> Option<Self> {
        CATEGORIES.into_iter().find(|c| c.as_str() == tag)
    }

    /// Lenient match for command-line input: case-insensitive tag or endpoint name.
    pub fn parse_loose(value: &str) -> Option<Self> {
        let v = value.trim();
        CATEGORIES.into_iter().find(|c| {
            c.as_str().eq_ignore_ascii_case(v) || c.endpoint().eq_ignore_ascii_case(v)
        })
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Characters
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| {
            format!("unknown category '{s}', expected Characters, Locations or Episodes")
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterStatus {
    Alive,
    Dead,
    #[serde(rename = "unknown")]
    Unknown,
}

impl CharacterStatus {
    pub const TAGS: [&'static str; 3] = ["Alive", "Dead", "unknown"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "Alive",
            Self::Dead => "Dead",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub name: String,
    pub status: CharacterStatus,
    pub species: String,
    pub gender: String,
    pub image: String,
    pub origin: Origin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub dimension: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub air_date: String,
    pub name: String,
    pub episode: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Character(CharacterRecord),
    Location(LocationRecord),
    Episode(EpisodeRecord),
}

impl Record {
    pub fn category(&self) -> Category {
        match self {
            Self::Character(_) => Category::Characters,
            Self::Location(_) => Category::Locations,
            Self::Episode(_) => Category::Episodes,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Character(c) => &c.name,
            Self::Location(l) => &l.name,
            Self::Episode(e) => &e.name,
        }
    }
}

/// One page of validated records together with the server-reported page count.
///
/// `total_pages == 0` marks a fetch that failed or came back malformed; callers
/// must not read it as "list exhausted".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    pub records: Vec<Record>,
    pub total_pages: u32,
}

impl ListPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.total_pages == 0 && self.records.is_empty()
    }
}

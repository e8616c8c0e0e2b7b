//! Game versions an add-on can be built for.
//!
//! Each version is one build target with its own interface id, manifest
//! suffix and table of engine-provided globals.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A build target game version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameVersion {
    /// Classic Era
    Classic,
    /// Wrath of the Lich King
    Wrath,
    /// Retail (mainline)
    Retail,
}

impl GameVersion {
    /// All known versions in declaration order.
    pub const ALL: [GameVersion; 3] = [GameVersion::Classic, GameVersion::Wrath, GameVersion::Retail];

    /// Canonical name, as written in directives and config.
    pub fn name(&self) -> &'static str {
        match self {
            GameVersion::Classic => "Classic",
            GameVersion::Wrath => "Wrath",
            GameVersion::Retail => "Retail",
        }
    }

    /// Default `## Interface:` id for this version.
    pub fn default_interface(&self) -> &'static str {
        match self {
            GameVersion::Classic => "11306",
            GameVersion::Wrath => "30300",
            GameVersion::Retail => "90005",
        }
    }

    /// Suffix used for the manifest and import manifest file names.
    pub fn toc_suffix(&self) -> &'static str {
        match self {
            GameVersion::Classic => "Classic",
            GameVersion::Wrath => "Wrath",
            GameVersion::Retail => "Mainline",
        }
    }

    /// Comma separated list of valid names, for error messages.
    pub fn valid_names() -> String {
        Self::ALL.iter().map(|v| v.name()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a name is not a known game version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid game version: {0}. Valid game versions are: {valid}", valid = GameVersion::valid_names())]
pub struct UnknownVersion(pub String);

impl FromStr for GameVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(GameVersion::Classic),
            "wrath" | "wotlk" => Ok(GameVersion::Wrath),
            "retail" | "mainline" => Ok(GameVersion::Retail),
            _ => Err(UnknownVersion(s.to_string())),
        }
    }
}

impl Serialize for GameVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for GameVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        assert_eq!("Classic".parse::<GameVersion>().unwrap(), GameVersion::Classic);
        assert_eq!("Wrath".parse::<GameVersion>().unwrap(), GameVersion::Wrath);
        assert_eq!("Retail".parse::<GameVersion>().unwrap(), GameVersion::Retail);
    }

    #[test]
    fn test_parse_aliases_case_insensitive() {
        assert_eq!("WOTLK".parse::<GameVersion>().unwrap(), GameVersion::Wrath);
        assert_eq!("mainline".parse::<GameVersion>().unwrap(), GameVersion::Retail);
        assert_eq!("classic".parse::<GameVersion>().unwrap(), GameVersion::Classic);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "Cata".parse::<GameVersion>().unwrap_err();
        assert_eq!(err, UnknownVersion("Cata".to_string()));
        assert!(err.to_string().contains("Classic, Wrath, Retail"));
    }

    #[test]
    fn test_toc_suffix() {
        assert_eq!(GameVersion::Retail.toc_suffix(), "Mainline");
        assert_eq!(GameVersion::Wrath.toc_suffix(), "Wrath");
    }

    #[test]
    fn test_serde_roundtrip_through_toml() {
        #[derive(Deserialize)]
        struct Holder {
            versions: Vec<GameVersion>,
        }
        let holder: Holder = toml::from_str(r#"versions = ["retail", "Classic"]"#).unwrap();
        assert_eq!(holder.versions, vec![GameVersion::Retail, GameVersion::Classic]);
    }
}

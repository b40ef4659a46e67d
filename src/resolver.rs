//! Board/system resolution.
//!
//! Maps (board, system label) pairs onto Launchpad distro coordinates.
//! The catalog is immutable data handed to the resolver at construction
//! so tests can substitute their own tables; `Default` loads the
//! supported-hardware catalog. Resolution is pure, no remote calls.

use std::collections::HashMap;
use std::fmt;

use regex_lite::Regex;
use serde::{Serialize, Serializer};

/// Ubuntu release codename derived from the two-digit system year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codename {
    Xenial,
    Bionic,
}

impl Codename {
    pub fn as_str(&self) -> &'static str {
        match self {
            Codename::Xenial => "xenial",
            Codename::Bionic => "bionic",
        }
    }
}

impl fmt::Display for Codename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Codename {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Livefs project the image is built under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Project {
    UbuntuCore,
    UbuntuCpc,
}

impl Project {
    pub fn as_str(&self) -> &'static str {
        match self {
            Project::UbuntuCore => "ubuntu-core",
            Project::UbuntuCpc => "ubuntu-cpc",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Project {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Architecture coordinates for one (board, system) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchSpec {
    pub arch: String,
    pub subarch: String,
}

impl ArchSpec {
    pub fn new(arch: impl Into<String>, subarch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            subarch: subarch.into(),
        }
    }
}

/// Catalog of supported hardware and codename mappings.
///
/// This is a fixed inventory, not something inferred: a pair absent
/// from the tables is unsupported.
#[derive(Debug, Clone)]
pub struct BoardCatalog {
    codenames: HashMap<String, Codename>,
    boards: HashMap<String, HashMap<String, ArchSpec>>,
}

impl BoardCatalog {
    pub fn new(
        codenames: HashMap<String, Codename>,
        boards: HashMap<String, HashMap<String, ArchSpec>>,
    ) -> Self {
        Self { codenames, boards }
    }

    /// The hardware supported by the image build service.
    pub fn builtin() -> Self {
        let codenames = HashMap::from([
            ("16".to_string(), Codename::Xenial),
            ("18".to_string(), Codename::Bionic),
        ]);

        let boards = HashMap::from([
            board(
                "raspberrypi2",
                &[
                    ("core16", "armhf", "raspi2"),
                    ("core18", "armhf", "raspi3"),
                    ("classic16.04", "armhf", "raspi3"),
                    ("classic18.04", "armhf", "raspi3"),
                ],
            ),
            board(
                "raspberrypi3",
                &[
                    ("core16", "armhf", "raspi3"),
                    ("core18", "armhf", "raspi3"),
                    ("classic16.04", "armhf", "raspi3"),
                    ("classic18.04", "armhf", "raspi3"),
                    ("classic6418.04", "arm64", "raspi3"),
                ],
            ),
            board(
                "raspberrypi4",
                &[
                    ("core18", "armhf", "raspi3"),
                    ("classic18.04", "armhf", "raspi3"),
                    ("classic6418.04", "arm64", "raspi3"),
                ],
            ),
            board(
                "intelnuc",
                &[("core16", "amd64", ""), ("core18", "amd64", "")],
            ),
            board(
                "snapdragon",
                &[
                    ("core16", "arm64", "snapdragon"),
                    ("core18", "arm64", "snapdragon"),
                ],
            ),
            board(
                "cm3",
                &[("core16", "armhf", "cm3"), ("core18", "armhf", "raspi3")],
            ),
        ]);

        Self::new(codenames, boards)
    }

    fn codename(&self, year: &str) -> Option<Codename> {
        self.codenames.get(year).copied()
    }

    fn arch_spec(&self, board: &str, system: &str) -> Option<&ArchSpec> {
        self.boards.get(board)?.get(system)
    }
}

impl Default for BoardCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn board(
    name: &str,
    systems: &[(&str, &str, &str)],
) -> (String, HashMap<String, ArchSpec>) {
    (
        name.to_string(),
        systems
            .iter()
            .map(|(system, arch, subarch)| (system.to_string(), ArchSpec::new(*arch, *subarch)))
            .collect(),
    )
}

/// Fully resolved coordinates for one image build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
    pub board: String,
    pub system: String,
    pub codename: Codename,
    pub arch: String,
    pub subarch: String,
    pub project: Project,
}

impl BuildTarget {
    /// Livefs path under the owning user, e.g.
    /// `~imagebuild/+livefs/ubuntu/xenial/ubuntu-core`.
    pub fn livefs_path(&self, livefs_owner: &str) -> String {
        format!(
            "~{}/+livefs/ubuntu/{}/{}",
            livefs_owner, self.codename, self.project
        )
    }

    /// Distro-arch-series link used in `requestBuild` bodies.
    pub fn distro_arch_series(&self) -> String {
        format!(
            "https://api.launchpad.net/1.0/ubuntu/{}/{}",
            self.codename, self.arch
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("system label '{0}' does not encode a system year")]
    UnrecognizedSystemLabel(String),

    #[error("no codename mapped for system year '{year}'")]
    UnknownCodename { year: String },

    #[error("unsupported board/system combination: {board}/{system}")]
    UnknownBoardSystem { board: String, system: String },
}

/// Resolves (board, system label) pairs against a catalog.
#[derive(Debug, Clone)]
pub struct Resolver {
    catalog: BoardCatalog,
    year_pattern: Regex,
}

impl Resolver {
    pub fn new(catalog: BoardCatalog) -> Self {
        // Two-digit system year, skipping a bitness infix: "core16" -> 16,
        // "classic6418.04" -> 18.
        let year_pattern =
            Regex::new(r"^[^\d]+(?:64)?(\d{2})(\.\d{2})?$").expect("valid year pattern");
        Self {
            catalog,
            year_pattern,
        }
    }

    pub fn resolve(&self, board: &str, system: &str) -> Result<BuildTarget, ResolveError> {
        self.resolve_with_arch(board, system, None)
    }

    /// Resolve with an optional caller-supplied architecture override
    /// replacing the catalog architecture.
    pub fn resolve_with_arch(
        &self,
        board: &str,
        system: &str,
        arch_override: Option<&str>,
    ) -> Result<BuildTarget, ResolveError> {
        let captures = self
            .year_pattern
            .captures(system)
            .ok_or_else(|| ResolveError::UnrecognizedSystemLabel(system.to_string()))?;
        let year = captures
            .get(1)
            .ok_or_else(|| ResolveError::UnrecognizedSystemLabel(system.to_string()))?
            .as_str();

        let codename = self
            .catalog
            .codename(year)
            .ok_or_else(|| ResolveError::UnknownCodename {
                year: year.to_string(),
            })?;

        let spec = self.catalog.arch_spec(board, system).ok_or_else(|| {
            ResolveError::UnknownBoardSystem {
                board: board.to_string(),
                system: system.to_string(),
            }
        })?;

        let project = if system.starts_with("classic") {
            Project::UbuntuCpc
        } else {
            Project::UbuntuCore
        };

        Ok(BuildTarget {
            board: board.to_string(),
            system: system.to_string(),
            codename,
            arch: arch_override
                .map(str::to_string)
                .unwrap_or_else(|| spec.arch.clone()),
            subarch: spec.subarch.clone(),
            project,
        })
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(BoardCatalog::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_core_system() {
        let target = Resolver::default().resolve("cm3", "core16").unwrap();
        assert_eq!(target.codename, Codename::Xenial);
        assert_eq!(target.arch, "armhf");
        assert_eq!(target.subarch, "cm3");
        assert_eq!(target.project, Project::UbuntuCore);
    }

    #[test]
    fn resolves_classic_64bit_system() {
        let target = Resolver::default()
            .resolve("raspberrypi3", "classic6418.04")
            .unwrap();
        assert_eq!(target.codename, Codename::Bionic);
        assert_eq!(target.arch, "arm64");
        assert_eq!(target.subarch, "raspi3");
        assert_eq!(target.project, Project::UbuntuCpc);
    }

    #[test]
    fn resolution_is_deterministic_over_the_catalog() {
        let resolver = Resolver::default();
        for (board, system) in [
            ("raspberrypi2", "core16"),
            ("raspberrypi2", "classic18.04"),
            ("raspberrypi3", "classic16.04"),
            ("raspberrypi4", "classic6418.04"),
            ("intelnuc", "core18"),
            ("snapdragon", "core16"),
            ("cm3", "core18"),
        ] {
            let first = resolver.resolve(board, system).unwrap();
            let second = resolver.resolve(board, system).unwrap();
            assert_eq!(first, second, "{board}/{system}");
        }
    }

    #[test]
    fn label_without_year_is_rejected() {
        let err = Resolver::default().resolve("cm3", "core").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnrecognizedSystemLabel("core".to_string())
        );
    }

    #[test]
    fn unmapped_year_is_rejected() {
        let err = Resolver::default().resolve("cm3", "core20").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownCodename {
                year: "20".to_string()
            }
        );
    }

    #[test]
    fn unknown_board_is_rejected() {
        let err = Resolver::default().resolve("beagle", "core16").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownBoardSystem {
                board: "beagle".to_string(),
                system: "core16".to_string()
            }
        );
    }

    #[test]
    fn board_without_that_system_is_rejected() {
        // raspberrypi4 never shipped a core16 image.
        let err = Resolver::default()
            .resolve("raspberrypi4", "core16")
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownBoardSystem { .. }));
    }

    #[test]
    fn arch_override_replaces_catalog_arch() {
        let target = Resolver::default()
            .resolve_with_arch("cm3", "core16", Some("arm64"))
            .unwrap();
        assert_eq!(target.arch, "arm64");
        assert_eq!(target.subarch, "cm3");
    }

    #[test]
    fn livefs_path_and_series_links() {
        let target = Resolver::default().resolve("cm3", "core16").unwrap();
        assert_eq!(
            target.livefs_path("imagebuild"),
            "~imagebuild/+livefs/ubuntu/xenial/ubuntu-core"
        );
        assert_eq!(
            target.distro_arch_series(),
            "https://api.launchpad.net/1.0/ubuntu/xenial/armhf"
        );
    }

    #[test]
    fn custom_catalog_substitutes_the_builtin() {
        let codenames = HashMap::from([("16".to_string(), Codename::Xenial)]);
        let boards = HashMap::from([board("testboard", &[("core16", "riscv64", "")])]);
        let resolver = Resolver::new(BoardCatalog::new(codenames, boards));

        let target = resolver.resolve("testboard", "core16").unwrap();
        assert_eq!(target.arch, "riscv64");
        assert!(resolver.resolve("cm3", "core16").is_err());
    }
}

//! Game data loading for headless runs.
//!
//! Reads RON files from disk and hands their text to the core parsers. Any
//! file not given falls back to the shipped defaults.

use std::fs;
use std::path::{Path, PathBuf};

use hearth_core::data::{ArchetypeCatalog, ComboCatalog, GameData, SimConfig, SpawnSchedule};
use hearth_core::error::GameError;
use thiserror::Error;

/// Optional override files.
#[derive(Debug, Clone, Default)]
pub struct DataPaths {
    /// `SimConfig` RON file.
    pub config: Option<PathBuf>,
    /// `ComboCatalog` RON file.
    pub combos: Option<PathBuf>,
    /// `ArchetypeCatalog` RON file.
    pub archetypes: Option<PathBuf>,
    /// `SpawnSchedule` RON file.
    pub schedule: Option<PathBuf>,
}

/// Failure loading a data file.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// Failed to read file.
    #[error("IO error reading '{path}': {message}")]
    Io {
        /// File path.
        path: String,
        /// OS error text.
        message: String,
    },
    /// File was read but did not parse.
    #[error("Parse error in '{path}': {source}")]
    Parse {
        /// File path.
        path: String,
        /// Parser error.
        source: GameError,
    },
}

fn read(path: &Path) -> Result<String, DataLoadError> {
    fs::read_to_string(path).map_err(|e| DataLoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn load<T>(
    path: Option<&Path>,
    parse: impl FnOnce(&str) -> hearth_core::error::Result<T>,
) -> Result<Option<T>, DataLoadError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let text = read(path)?;
    let value = parse(&text).map_err(|source| DataLoadError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Loaded data file");
    Ok(Some(value))
}

impl DataPaths {
    /// Build the game data, overriding defaults with whichever files are set.
    pub fn load(&self) -> Result<GameData, DataLoadError> {
        let mut data = GameData::default();
        if let Some(config) = load(self.config.as_deref(), SimConfig::from_ron_str)? {
            data.config = config;
        }
        if let Some(combos) = load(self.combos.as_deref(), ComboCatalog::from_ron_str)? {
            data.combos = combos;
        }
        if let Some(archetypes) = load(self.archetypes.as_deref(), ArchetypeCatalog::from_ron_str)? {
            data.archetypes = archetypes;
        }
        if let Some(schedule) = load(self.schedule.as_deref(), SpawnSchedule::from_ron_str)? {
            data.schedule = schedule;
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::combat::{calculate_damage, DamageKind};
    use hearth_core::components::ArchetypeId;

    #[test]
    fn test_no_paths_is_default() {
        assert_eq!(DataPaths::default().load().unwrap(), GameData::default());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let paths = DataPaths {
            config: Some(PathBuf::from("/definitely/not/here.ron")),
            ..DataPaths::default()
        };
        let err = paths.load().unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
        assert!(err.to_string().contains("here.ron"));
    }

    #[test]
    fn test_bad_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        fs::write(&path, "(starting_heat: \"lots\")").unwrap();

        let paths = DataPaths {
            config: Some(path),
            ..DataPaths::default()
        };
        let err = paths.load().unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { .. }));
        assert!(err.to_string().contains("config.ron"));
    }

    #[test]
    fn test_config_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        fs::write(&path, "(starting_heat: 80)").unwrap();

        let paths = DataPaths {
            config: Some(path),
            ..DataPaths::default()
        };
        let data = paths.load().unwrap();
        assert_eq!(data.config.starting_heat, 80);
        assert_eq!(data.config.max_heat, 100);
    }

    #[test]
    fn test_large_archetype_stats_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archetypes.ron");
        fs::write(
            &path,
            "(archetypes: [(id: PorkScrap, faction: Player, stats: (max_hp: 100, hp: 100, \
             phys_atk: 30000000, mag_atk: 0, armor: 0, resist: 0, move_range: 2, attack_range: 1))])",
        )
        .unwrap();

        let paths = DataPaths {
            archetypes: Some(path),
            ..DataPaths::default()
        };
        let data = paths.load().unwrap();
        let pork = data.archetypes.resolve(ArchetypeId::PorkScrap).initial_stats();
        assert_eq!(pork.phys_atk, 30_000_000);

        let slime = data.archetypes.resolve(ArchetypeId::Slime).initial_stats();
        let damage = calculate_damage(&pork, &slime, DamageKind::Physical, 100, 50);
        assert_eq!(slime.armor, 0);
        assert_eq!(damage, 30_000_000);
    }
}

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use world::{
    AppPaths, ConfigError, GameConfig, MapBuildError, ResourceBundle, SaveError, StartupError,
    VehicleError,
};

pub(crate) const MAP_DIR_ENV_VAR: &str = "TQ_MAP_DIR";
pub(crate) const MAP_NAME_ENV_VAR: &str = "TQ_MAP";
pub(crate) const SAVE_FILE_ENV_VAR: &str = "TQ_SAVE_FILE";
pub(crate) const COINS_ENV_VAR: &str = "TQ_COINS";
pub(crate) const CONFIG_ENV_VAR: &str = "TQ_CONFIG";

pub(crate) const DEFAULT_MAP_NAME: &str = "main";

// Tiles compiled into the binary, relative to the maps directory.
const BUNDLED_TILES: &[(&str, &str)] = &[
    ("main/0,0.tqmap", include_str!("../../../assets/maps/main/0,0.tqmap")),
    ("main/1,0.tqmap", include_str!("../../../assets/maps/main/1,0.tqmap")),
    ("main/0,1.tqmap", include_str!("../../../assets/maps/main/0,1.tqmap")),
    ("main/1,1.tqmap", include_str!("../../../assets/maps/main/1,1.tqmap")),
    (
        "main/0005,0004/0,0.tqmap",
        include_str!("../../../assets/maps/main/0005,0004/0,0.tqmap"),
    ),
];

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("{var} must be a number 0 or more, got '{value}'")]
    InvalidCoins { var: &'static str, value: String },
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] MapBuildError),
    #[error("I/O error loading saved game file: {0}")]
    Save(#[from] SaveError),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error("map '{name}' is not loaded and has no entrance on the main map")]
    UnknownMap { name: String },
    #[error("terminal I/O failed: {0}")]
    Input(#[source] std::io::Error),
}

/// Everything the session needs that comes from the environment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuestSettings {
    pub(crate) maps_dir: PathBuf,
    pub(crate) map_name: String,
    pub(crate) save_path: PathBuf,
    pub(crate) game: GameConfig,
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Project paths, falling back to the working directory when no project root
/// can be found next to the executable.
pub(crate) fn resolve_paths() -> Result<AppPaths, AppError> {
    match world::resolve_app_paths() {
        Ok(paths) => Ok(paths),
        Err(error @ StartupError::RootNotFound { .. }) => {
            warn!(error = %error, "project_root_not_found");
            let cwd = env::current_dir().map_err(AppError::CurrentDir)?;
            Ok(AppPaths::from_root(cwd))
        }
        Err(error) => Err(error.into()),
    }
}

pub(crate) fn load_settings(paths: &AppPaths) -> Result<QuestSettings, AppError> {
    settings_from(paths, read_env_var)
}

fn read_env_var(var: &'static str) -> Result<Option<String>, AppError> {
    match env::var(var) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(AppError::EnvVar { var, source }),
    }
}

fn settings_from<F>(paths: &AppPaths, lookup: F) -> Result<QuestSettings, AppError>
where
    F: Fn(&'static str) -> Result<Option<String>, AppError>,
{
    let non_empty = |var| -> Result<Option<String>, AppError> {
        Ok(lookup(var)?
            .map(|raw| raw.trim().to_string())
            .filter(|value| !value.is_empty()))
    };

    let maps_dir = non_empty(MAP_DIR_ENV_VAR)?
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.maps_dir.clone());
    let map_name = non_empty(MAP_NAME_ENV_VAR)?.unwrap_or_else(|| DEFAULT_MAP_NAME.to_string());
    let save_path = non_empty(SAVE_FILE_ENV_VAR)?
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.save_path.clone());

    let mut game = match non_empty(CONFIG_ENV_VAR)? {
        Some(config_path) => GameConfig::load(Path::new(&config_path))?,
        None => GameConfig::default(),
    };
    if let Some(raw) = non_empty(COINS_ENV_VAR)? {
        let coins = raw.parse::<u32>().map_err(|_| AppError::InvalidCoins {
            var: COINS_ENV_VAR,
            value: raw.clone(),
        })?;
        game = game.with_initial_coins(coins);
    }

    info!(
        maps_dir = %maps_dir.display(),
        map = %map_name,
        save_path = %save_path.display(),
        initial_coins = game.initial_coins,
        "settings_resolved"
    );
    Ok(QuestSettings {
        maps_dir,
        map_name,
        save_path,
        game,
    })
}

/// Tiles shipped inside the binary, rooted at `maps_dir`.
pub(crate) fn bundled_tiles(maps_dir: &Path) -> ResourceBundle {
    let mut bundle = ResourceBundle::new();
    for (relative, contents) in BUNDLED_TILES {
        bundle.insert(format!("{}/{relative}", maps_dir.display()), *contents);
    }
    bundle
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn lookup_from(
        vars: &[(&'static str, &str)],
    ) -> impl Fn(&'static str) -> Result<Option<String>, AppError> {
        let vars = vars
            .iter()
            .map(|(key, value)| (*key, value.to_string()))
            .collect::<HashMap<_, _>>();
        move |var| Ok(vars.get(var).cloned())
    }

    fn paths() -> AppPaths {
        AppPaths::from_root(PathBuf::from("/tq"))
    }

    #[test]
    fn defaults_come_from_app_paths() {
        let settings = settings_from(&paths(), lookup_from(&[])).expect("settings");
        assert_eq!(settings.maps_dir, PathBuf::from("/tq/assets/maps"));
        assert_eq!(settings.map_name, "main");
        assert_eq!(settings.save_path, PathBuf::from("/tq/game.tqsave"));
        assert_eq!(settings.game, GameConfig::default());
    }

    #[test]
    fn env_overrides_paths_and_coins() {
        let settings = settings_from(
            &paths(),
            lookup_from(&[
                (MAP_DIR_ENV_VAR, "/custom/maps"),
                (MAP_NAME_ENV_VAR, " island "),
                (SAVE_FILE_ENV_VAR, "/tmp/slot1.tqsave"),
                (COINS_ENV_VAR, "250"),
            ]),
        )
        .expect("settings");
        assert_eq!(settings.maps_dir, PathBuf::from("/custom/maps"));
        assert_eq!(settings.map_name, "island");
        assert_eq!(settings.save_path, PathBuf::from("/tmp/slot1.tqsave"));
        assert_eq!(settings.game.initial_coins, 250);
    }

    #[test]
    fn negative_or_garbage_coins_are_rejected() {
        for raw in ["-1", "lots", "1.5"] {
            let err = settings_from(&paths(), lookup_from(&[(COINS_ENV_VAR, raw)]))
                .expect_err("bad coins");
            assert!(matches!(err, AppError::InvalidCoins { .. }), "{raw}");
        }
    }

    #[test]
    fn config_file_is_applied_before_coin_override() {
        let temp = TempDir::new().expect("temp");
        let config_path = temp.path().join("game.json");
        fs::write(&config_path, r#"{"initial_coins": 5, "ship_cost": 40}"#).expect("write");
        let config_value = config_path.to_string_lossy().to_string();

        let settings = settings_from(&paths(), lookup_from(&[(CONFIG_ENV_VAR, config_value.as_str())]))
            .expect("settings");
        assert_eq!(settings.game.initial_coins, 5);
        assert_eq!(settings.game.ship_cost, 40);

        let settings = settings_from(
            &paths(),
            lookup_from(&[(CONFIG_ENV_VAR, config_value.as_str()), (COINS_ENV_VAR, "9")]),
        )
        .expect("settings");
        assert_eq!(settings.game.initial_coins, 9);
        assert_eq!(settings.game.ship_cost, 40);
    }

    #[test]
    fn bundled_tiles_build_the_default_map() {
        let maps_dir = PathBuf::from("/nowhere/maps");
        let bundle = bundled_tiles(&maps_dir);
        let atlas = world::MapAtlas::open(Some(bundle), &maps_dir, DEFAULT_MAP_NAME)
            .expect("bundled map");
        assert_eq!(atlas.main().width(), 24);
        assert_eq!(atlas.main().height(), 16);
        assert_eq!(atlas.main().starting_coordinate(), world::Coordinate::new(3, 3));
    }
}

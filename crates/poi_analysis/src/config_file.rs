use std::fs;
use std::path::{Path, PathBuf};

use poi_core::AnalysisConfig;

pub(crate) const CONFIG_ENV_VAR: &str = "POI_ANALYSIS_CONFIG";

/// Explicit argument first, then the environment variable.
pub(crate) fn config_path_from(arg: Option<&str>, env_value: Option<String>) -> Option<PathBuf> {
    arg.map(PathBuf::from)
        .or_else(|| env_value.filter(|value| !value.trim().is_empty()).map(PathBuf::from))
}

/// Defaults when no file is given. Relative paths resolve against the config
/// file's directory, or `cwd` without a file.
pub(crate) fn load_config(path: Option<&Path>, cwd: &Path) -> Result<AnalysisConfig, String> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default().resolved_against(cwd));
    };
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read config '{}': {error}", path.display()))?;
    let config = parse_config_json(&raw)
        .map_err(|error| format!("config '{}': {error}", path.display()))?;
    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd.to_path_buf(),
    };
    Ok(config.resolved_against(&base_dir))
}

pub(crate) fn parse_config_json(raw: &str) -> Result<AnalysisConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, AnalysisConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {path}: {source}"))
            }
        }
    }
}

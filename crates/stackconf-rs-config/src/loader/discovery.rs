//! Finding the settings files that make up a layer stack.

use super::{
    ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LayerPlan, LayeredConfigOptions,
    PlannedLayer,
};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[cfg(unix)]
const SYSTEM_DIR: Option<&str> = Some("/etc/stackconf");
#[cfg(windows)]
const SYSTEM_DIR: Option<&str> = Some("C:\\ProgramData\\stackconf");
#[cfg(not(any(unix, windows)))]
const SYSTEM_DIR: Option<&str> = None;

pub(super) fn system_config_path() -> Option<PathBuf> {
    SYSTEM_DIR.map(|dir| Path::new(dir).join(DEFAULT_CONFIG_FILE))
}

pub(super) fn requirements_path() -> Option<PathBuf> {
    SYSTEM_DIR.map(|dir| Path::new(dir).join("requirements.json5"))
}

pub(super) fn user_config_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(dirs.home_dir().join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE))
}

/// Lay out every candidate layer for the given options.
pub(super) fn plan(options: &LayeredConfigOptions) -> Result<LayerPlan, ConfigError> {
    let cwd = match options.cwd.canonicalize() {
        Ok(path) => path,
        Err(err) if err.kind() == ErrorKind::NotFound => options.cwd.clone(),
        Err(err) => return Err(ConfigError::ReadFailed(err)),
    };
    let optional = |source, path: PathBuf| PlannedLayer {
        source,
        path,
        required: false,
    };

    let mut layers = Vec::new();
    if let Some(path) = &options.system_config_path {
        layers.push(optional(ConfigLayerSource::System, path.clone()));
    }
    if let Some(path) = &options.user_config_path {
        layers.push(optional(ConfigLayerSource::User, path.clone()));
    }

    let root = project_root(&cwd, &options.project_root_markers);
    match &root {
        Some(root) => {
            debug!("project root {}", root.display());
            layers.push(optional(
                ConfigLayerSource::Project,
                root.join(DEFAULT_CONFIG_FILE),
            ));
        }
        None => debug!("no project root above {}", cwd.display()),
    }
    layers.push(optional(ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
    if let Some(root) = &root {
        layers.push(optional(
            ConfigLayerSource::Repo,
            root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        ));
    }

    layers.extend(options.runtime_paths.iter().map(|path| PlannedLayer {
        source: ConfigLayerSource::Runtime,
        path: path.clone(),
        required: true,
    }));

    Ok(LayerPlan {
        requirements: options.requirements_path.clone(),
        layers,
    })
}

/// Nearest ancestor of `cwd` holding one of the markers.
pub(super) fn project_root(cwd: &Path, markers: &[String]) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}

/// Key under which a file counts as already loaded.
pub(super) fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn plan_without_project_root_skips_project_layers() {
        let temp = TempDir::new().expect("tmp");
        let plan = plan(&LayeredConfigOptions::local_only(temp.path())).expect("plan");
        let sources: Vec<_> = plan.layers.iter().map(|layer| layer.source).collect();
        assert!(plan.requirements.is_none());
        assert_eq!(sources, vec![ConfigLayerSource::Cwd]);
    }

    #[test]
    fn runtime_layers_are_required_and_last() {
        let temp = TempDir::new().expect("tmp");
        fs::create_dir_all(temp.path().join(".git")).expect("git");
        let options = LayeredConfigOptions::local_only(temp.path()).with_runtime_path("over.json5");
        let plan = plan(&options).expect("plan");
        let sources: Vec<_> = plan.layers.iter().map(|layer| layer.source).collect();
        assert_eq!(
            sources,
            vec![
                ConfigLayerSource::Project,
                ConfigLayerSource::Cwd,
                ConfigLayerSource::Repo,
                ConfigLayerSource::Runtime,
            ]
        );
        let runtime = plan.layers.last().expect("runtime");
        assert!(runtime.required);
        assert!(plan.layers[..3].iter().all(|layer| !layer.required));
    }
}

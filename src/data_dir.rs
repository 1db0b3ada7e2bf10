use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV_VAR: &str = "NOTESEARCH_DATA_DIR";

const XDG_PREFIX: &str = "notesearch";
const STATE_DB_FILE: &str = "state.redb";

/// Which setting picked the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirSource {
    Flag,
    Env,
    Xdg,
}

impl fmt::Display for DataDirSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flag => "--data-dir",
            Self::Env => DATA_DIR_ENV_VAR,
            Self::Xdg => "XDG data home",
        })
    }
}

/// Directory holding the persisted analytics store.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
    source: DataDirSource,
}

impl DataDir {
    /// Resolve and create the data directory.
    ///
    /// `--data-dir` wins over [`DATA_DIR_ENV_VAR`], which wins over
    /// `$XDG_DATA_HOME/notesearch`. An empty variable counts as unset.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let (root, source) =
            choose_root(explicit, std::env::var_os(DATA_DIR_ENV_VAR), || {
                xdg::BaseDirectories::with_prefix(XDG_PREFIX).get_data_home()
            })
            .ok_or_else(|| {
                Error::Config(
                    "could not determine XDG data home directory".into(),
                )
            })?;

        if let Err(e) = std::fs::create_dir_all(&root) {
            tracing::error!(
                path = %root.display(),
                "cannot create data directory: {e}"
            );
            return Err(Error::DataDir(root));
        }

        Ok(Self { root, source })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self) -> DataDirSource {
        self.source
    }

    /// redb file holding persisted analytics.
    pub fn state_db(&self) -> PathBuf {
        self.root.join(STATE_DB_FILE)
    }
}

fn choose_root(
    explicit: Option<&Path>,
    env: Option<OsString>,
    xdg_home: impl FnOnce() -> Option<PathBuf>,
) -> Option<(PathBuf, DataDirSource)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), DataDirSource::Flag));
    }
    if let Some(value) = env.filter(|v| !v.is_empty()) {
        return Some((PathBuf::from(value), DataDirSource::Env));
    }
    xdg_home().map(|home| (home, DataDirSource::Xdg))
}

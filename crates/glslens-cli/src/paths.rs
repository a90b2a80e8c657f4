use std::env;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "GLSLENS_CONFIG_DIR";

const QUALIFIER: &str = "com";
const ORGANISATION: &str = "glslens";
const APPLICATION: &str = "glslens";
const CONFIG_FILE: &str = "config.toml";

/// Directory holding `config.toml`; `GLSLENS_CONFIG_DIR` wins over the
/// platform default.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(value) = env_override(ENV_CONFIG_DIR) {
        return Some(value);
    }
    ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// The default configuration file, if one exists on disk.
pub fn default_config_file() -> Option<PathBuf> {
    config_dir()
        .map(|dir| config_file_in(&dir))
        .filter(|path| path.is_file())
}

fn config_file_in(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_takes_precedence() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        assert_eq!(config_dir().as_deref(), Some(root.path()));
    }

    #[test]
    fn default_config_file_requires_existing_file() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        assert_eq!(default_config_file(), None);

        fs::write(root.path().join(CONFIG_FILE), "").unwrap();
        assert_eq!(default_config_file(), Some(root.path().join(CONFIG_FILE)));
    }
}

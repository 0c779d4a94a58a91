use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub quota_bytes: Option<usize>,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = lookup("MOCKUP_STORE_DIR").filter(|d| !d.trim().is_empty());

        let backend = match lookup("MOCKUP_STORE_BACKEND").as_deref().map(str::trim) {
            Some("memory") => StoreBackend::Memory,
            Some("file") => StoreBackend::File {
                dir: dir
                    .map(PathBuf::from)
                    .ok_or_else(|| "MOCKUP_STORE_DIR: required for the file backend".to_string())?,
            },
            Some(other) => {
                return Err(format!(
                    "MOCKUP_STORE_BACKEND: unknown backend '{other}' (expected 'memory' or 'file')"
                ));
            }
            None => match dir {
                Some(dir) => StoreBackend::File {
                    dir: PathBuf::from(dir),
                },
                None => StoreBackend::Memory,
            },
        };

        let quota_bytes = match lookup("MOCKUP_STORE_QUOTA_BYTES") {
            Some(raw) => {
                let quota = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| format!("MOCKUP_STORE_QUOTA_BYTES: {}", e))?;
                if quota == 0 {
                    return Err("MOCKUP_STORE_QUOTA_BYTES: must be greater than zero".to_string());
                }
                Some(quota)
            }
            None => None,
        };

        Ok(Self {
            backend,
            quota_bytes,
        })
    }
}

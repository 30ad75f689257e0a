use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
    pub db_path: PathBuf,
}

pub fn resolve_runtime_paths(
    home_dir: &Path,
    cwd: &Path,
    db_override: Option<&Path>,
) -> Result<RuntimePaths> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    let home_dir = normalize_lexical(home_dir);
    let cwd = normalize_lexical(cwd);
    let db_path = match db_override {
        Some(path) => resolve_user_path(path, &home_dir, &cwd)?,
        None => home_dir.join(".motordash").join("motordash.sqlite"),
    };

    Ok(RuntimePaths {
        home_dir,
        cwd,
        db_path: normalize_lexical(&db_path),
    })
}

fn resolve_user_path(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path, home_dir)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    Ok(normalize_lexical(&resolved))
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}

/// Outbound language-model settings, resolved from the environment at the
/// composition root and injected into the client from there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl LlmSettings {
    pub fn from_env() -> Result<Self> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(value) if !value.trim().is_empty() => value,
            _ => bail!("OPENAI_API_KEY is not set; export it to enable natural language queries"),
        };

        Ok(Self {
            api_key,
            base_url: env_or_default("MOTORDASH_OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            model: env_or_default("MOTORDASH_OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
        })
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

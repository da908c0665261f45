mod company;
mod session;
mod settings;

pub use company::CompanyInfo;
pub use session::Session;
pub use settings::{ApiSettings, BrandingSettings, Config, ExportSettings};

use crate::error::{ReportError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (XDG, falling back to ~/.rentreport/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "rentreport") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".rentreport"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the export directory; relative paths are anchored at the config dir
pub fn resolve_output_dir(output_dir: &str, config_dir: &Path) -> PathBuf {
    let expanded = expand_path(output_dir);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(ReportError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| ReportError::ConfigParse { path, source: e })
}

/// Load session.json (empty session if missing)
pub fn load_session(config_dir: &Path) -> Result<Session> {
    let path = config_dir.join("session.json");
    if !path.exists() {
        return Ok(Session::default());
    }
    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|e| ReportError::SessionParse { path, source: e })
}

/// Save session.json
pub fn save_session(config_dir: &Path, session: &Session) -> Result<()> {
    let path = config_dir.join("session.json");
    let content = serde_json::to_string_pretty(session)?;
    fs::write(path, content)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[api]
base_url = "http://localhost:5000/api"
# token = "your-api-token"     # optional, sent as a Bearer token
timeout_secs = 10

[branding]
cache_ttl_secs = 300           # company info is re-fetched after 5 minutes

[export]
output_dir = "exports"         # relative to this directory, or absolute / ~/...
currency_symbol = "KES "
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.export.output_dir, "exports");
    }

    #[test]
    fn test_resolve_output_dir() {
        let base = Path::new("/tmp/rentreport");
        assert_eq!(
            resolve_output_dir("exports", base),
            PathBuf::from("/tmp/rentreport/exports")
        );
        assert_eq!(
            resolve_output_dir("/var/reports", base),
            PathBuf::from("/var/reports")
        );
    }

    #[test]
    fn test_missing_session_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let session = load_session(dir.path()).unwrap();
        assert!(session.store.current_report().is_none());
        assert!(session.branding.is_none());
    }
}

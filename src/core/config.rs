use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// WatchConfig — file-based config loader (loto6-watch.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "LOTO6_WATCH_CONFIG";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_DATABASE_PATH: &str = "LOTO6_WATCH_DB";

/// Current-results page; the monthly archive pages hang off the same prefix.
pub const DEFAULT_RESULTS_URL: &str =
    "https://www.mizuhobank.co.jp/takarakuji/check/loto/loto6/index.html";
pub const ARCHIVE_URL_PREFIX: &str = "https://www.mizuhobank.co.jp/takarakuji/check/loto/loto6/";

/// How the rendered retriever resolves its browser binary.
///
/// No process-global handle: the resolved value is passed into the retriever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderingBackend {
    /// Auto-discover an installed Chromium-family browser
    /// (env override → PATH scan → well-known install paths).
    Bundled,
    /// Use exactly this executable.
    ExternalBinary(PathBuf),
}

/// Top-level config loaded from `loto6-watch.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct WatchConfig {
    /// Result-page URLs scraped by `update`. Empty → the official index page.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Rendered retrieval: page navigation budget. Default: 30 000.
    pub navigation_timeout_ms: Option<u64>,
    /// Rendered retrieval: network-idle wait budget. Default: 10 000.
    pub idle_timeout_ms: Option<u64>,
    /// Rendered retrieval: grace period for the marker element when the page
    /// never goes idle. Default: 2 500.
    pub render_grace_ms: Option<u64>,
    /// `"bundled"` (default) or `"external"`.
    pub rendering_backend: Option<String>,
    /// Browser executable for the `external` backend. Also consulted as an
    /// explicit override under `bundled`.
    pub chrome_executable: Option<String>,
    /// SQLite file for the draw history. Default: `~/.loto6-watch/draws.db`.
    pub database_path: Option<String>,
}

impl WatchConfig {
    pub fn resolve_sources(&self) -> Vec<String> {
        if self.sources.is_empty() {
            vec![DEFAULT_RESULTS_URL.to_string()]
        } else {
            self.sources.clone()
        }
    }

    pub fn resolve_navigation_timeout_ms(&self) -> u64 {
        self.navigation_timeout_ms.unwrap_or(30_000)
    }

    pub fn resolve_idle_timeout_ms(&self) -> u64 {
        self.idle_timeout_ms.unwrap_or(10_000)
    }

    pub fn resolve_render_grace_ms(&self) -> u64 {
        self.render_grace_ms.unwrap_or(2_500)
    }

    /// Backend: JSON field → `bundled`. An `external` backend requires
    /// `chrome_executable` (or the `CHROME_EXECUTABLE` env var).
    pub fn resolve_rendering_backend(&self) -> RenderingBackend {
        let wants_external = self
            .rendering_backend
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case("external"))
            .unwrap_or(false);
        if wants_external {
            if let Some(exe) = self.resolve_chrome_executable() {
                return RenderingBackend::ExternalBinary(exe);
            }
            tracing::warn!(
                "rendering_backend=external but no chrome_executable resolved; \
                 falling back to auto-discovery"
            );
        }
        RenderingBackend::Bundled
    }

    /// Executable override: JSON field → `CHROME_EXECUTABLE` env var → `None`.
    /// Only existing paths are returned.
    pub fn resolve_chrome_executable(&self) -> Option<PathBuf> {
        if let Some(p) = &self.chrome_executable {
            let p = p.trim();
            if !p.is_empty() && Path::new(p).exists() {
                return Some(PathBuf::from(p));
            }
        }
        let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
        let p = p.trim();
        if !p.is_empty() && Path::new(p).exists() {
            Some(PathBuf::from(p))
        } else {
            None
        }
    }

    /// Store path: JSON field → `LOTO6_WATCH_DB` env var → `~/.loto6-watch/draws.db`.
    pub fn resolve_database_path(&self) -> PathBuf {
        if let Some(p) = &self.database_path {
            if !p.trim().is_empty() {
                return PathBuf::from(p.trim());
            }
        }
        if let Ok(p) = std::env::var(ENV_DATABASE_PATH) {
            if !p.trim().is_empty() {
                return PathBuf::from(p.trim());
            }
        }
        match dirs::home_dir() {
            Some(home) => home.join(".loto6-watch").join("draws.db"),
            None => PathBuf::from("draws.db"),
        }
    }
}

/// Load `loto6-watch.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `LOTO6_WATCH_CONFIG` env var path
/// 2. `./loto6-watch.json`
/// 3. `../loto6-watch.json`
///
/// Missing file → defaults (all env-var fallbacks apply).
/// Parse error → log a warning, return defaults.
pub fn load_config() -> WatchConfig {
    let mut candidates = vec![
        PathBuf::from("loto6-watch.json"),
        PathBuf::from("../loto6-watch.json"),
    ];
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        match serde_json::from_str::<WatchConfig>(&contents) {
            Ok(cfg) => {
                tracing::info!("loto6-watch.json loaded from {}", path.display());
                return cfg;
            }
            Err(e) => {
                tracing::warn!(
                    "loto6-watch.json parse error at {}: {} — using defaults",
                    path.display(),
                    e
                );
                return WatchConfig::default();
            }
        }
    }

    WatchConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = WatchConfig::default();
        assert_eq!(cfg.resolve_sources(), vec![DEFAULT_RESULTS_URL.to_string()]);
        assert_eq!(cfg.resolve_navigation_timeout_ms(), 30_000);
        assert_eq!(cfg.resolve_idle_timeout_ms(), 10_000);
        assert_eq!(cfg.resolve_render_grace_ms(), 2_500);
        assert_eq!(cfg.resolve_rendering_backend(), RenderingBackend::Bundled);
    }

    #[test]
    fn external_backend_without_executable_falls_back() {
        let cfg = WatchConfig {
            rendering_backend: Some("external".into()),
            chrome_executable: Some("/definitely/not/a/browser".into()),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_rendering_backend(), RenderingBackend::Bundled);
    }

    #[test]
    fn config_json_round_trip() {
        let cfg: WatchConfig = serde_json::from_str(
            r#"{
                "sources": ["https://example.com/loto6.html"],
                "navigation_timeout_ms": 15000,
                "rendering_backend": "bundled"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.resolve_sources().len(), 1);
        assert_eq!(cfg.resolve_navigation_timeout_ms(), 15_000);
    }
}

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loading messages cycled while the overlay is visible without a custom message.
pub const DEFAULT_MESSAGES: [&str; 5] = [
    "Carregando dados...",
    "Processando informações...",
    "Sincronizando com a API...",
    "Preparando interface...",
    "Finalizando carregamento...",
];

/// Stage names used by the staged progress run.
pub const DEFAULT_STAGES: [&str; 5] = [
    "Verificando Cache",
    "Carregando Mapeamentos",
    "Carregando Serviços",
    "Calculando Estatísticas",
    "Preparando Dashboard",
];

/// Message shown once a staged run reaches 100%.
pub const STAGES_DONE_MESSAGE: &str = "Carregamento concluído!";

/// All timing knobs of the coordinator, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Floor on how long a navigation overlay stays up
    pub min_navigation_display_ms: u64,
    /// Grace period between fade-out and hiding the node
    pub fade_out_ms: u64,
    /// Progress animation tick
    pub progress_tick_ms: u64,
    /// Simulated progress duration for first paint
    pub normal_progress_ms: u64,
    /// Simulated progress duration for navigation
    pub navigation_progress_ms: u64,
    /// Forced hide for a Normal overlay that nobody hid
    pub first_paint_safety_ms: u64,
    /// Forced hide for a Navigation overlay that nobody hid
    pub navigation_safety_ms: u64,
    /// Forced hide for a busy overlay (custom message)
    pub busy_safety_ms: u64,
    /// Delay between "page loaded" and hide, first paint
    pub first_paint_settle_ms: u64,
    /// Delay between "page loaded" and hide, navigation
    pub navigation_settle_ms: u64,
    /// Loading message rotation period
    pub message_rotation_ms: u64,
    /// Staged progress tick
    pub stage_tick_ms: u64,
    /// Delay between a finished staged run and hide
    pub stage_complete_hide_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            min_navigation_display_ms: 1500,
            fade_out_ms: 500,
            progress_tick_ms: 50,
            normal_progress_ms: 3000,
            navigation_progress_ms: 2500,
            first_paint_safety_ms: 6000,
            navigation_safety_ms: 8000,
            busy_safety_ms: 5000,
            first_paint_settle_ms: 800,
            navigation_settle_ms: 300,
            message_rotation_ms: 2000,
            stage_tick_ms: 50,
            stage_complete_hide_ms: 500,
        }
    }
}

impl Timings {
    pub fn min_navigation_display(&self) -> Duration {
        Duration::from_millis(self.min_navigation_display_ms)
    }

    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn normal_progress(&self) -> Duration {
        Duration::from_millis(self.normal_progress_ms)
    }

    pub fn navigation_progress(&self) -> Duration {
        Duration::from_millis(self.navigation_progress_ms)
    }

    pub fn first_paint_safety(&self) -> Duration {
        Duration::from_millis(self.first_paint_safety_ms)
    }

    pub fn navigation_safety(&self) -> Duration {
        Duration::from_millis(self.navigation_safety_ms)
    }

    pub fn busy_safety(&self) -> Duration {
        Duration::from_millis(self.busy_safety_ms)
    }

    pub fn first_paint_settle(&self) -> Duration {
        Duration::from_millis(self.first_paint_settle_ms)
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn message_rotation(&self) -> Duration {
        Duration::from_millis(self.message_rotation_ms)
    }

    pub fn stage_tick(&self) -> Duration {
        Duration::from_millis(self.stage_tick_ms)
    }

    pub fn stage_complete_hide(&self) -> Duration {
        Duration::from_millis(self.stage_complete_hide_ms)
    }
}

/// Coordinator configuration.
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```toml
/// landing_paths = ["/", "/dashboard"]
///
/// [timings]
/// navigation_safety_ms = 10000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloaderConfig {
    pub timings: Timings,
    /// Rotating loading messages (empty disables rotation)
    pub messages: Vec<String>,
    /// Default stage names for a staged progress run
    pub stages: Vec<String>,
    /// Paths that always get the first-paint overlay
    pub landing_paths: Vec<String>,
}

impl Default for PreloaderConfig {
    fn default() -> Self {
        PreloaderConfig {
            timings: Timings::default(),
            messages: DEFAULT_MESSAGES.iter().map(|s| s.to_string()).collect(),
            stages: DEFAULT_STAGES.iter().map(|s| s.to_string()).collect(),
            landing_paths: vec!["/".to_string()],
        }
    }
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

impl PreloaderConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: PreloaderConfig = toml::from_str(s).context("Invalid preloader TOML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a JSON document and validate it (used by the browser surface)
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: PreloaderConfig =
            serde_json::from_str(s).context("Invalid preloader JSON config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a TOML config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Check every timing against the range it can sensibly take
    pub fn validate(&self) -> Result<()> {
        let t = &self.timings;
        validate_in_range(t.min_navigation_display_ms, 0, 10_000, "min_navigation_display_ms")?;
        validate_in_range(t.fade_out_ms, 0, 5_000, "fade_out_ms")?;
        validate_in_range(t.progress_tick_ms, 10, 1_000, "progress_tick_ms")?;
        validate_in_range(t.normal_progress_ms, 100, 60_000, "normal_progress_ms")?;
        validate_in_range(t.navigation_progress_ms, 100, 60_000, "navigation_progress_ms")?;
        validate_in_range(t.first_paint_safety_ms, 500, 120_000, "first_paint_safety_ms")?;
        validate_in_range(t.navigation_safety_ms, 500, 120_000, "navigation_safety_ms")?;
        validate_in_range(t.busy_safety_ms, 500, 120_000, "busy_safety_ms")?;
        validate_in_range(t.first_paint_settle_ms, 0, 10_000, "first_paint_settle_ms")?;
        validate_in_range(t.navigation_settle_ms, 0, 10_000, "navigation_settle_ms")?;
        validate_in_range(t.message_rotation_ms, 100, 60_000, "message_rotation_ms")?;
        validate_in_range(t.stage_tick_ms, 10, 1_000, "stage_tick_ms")?;
        validate_in_range(t.stage_complete_hide_ms, 0, 10_000, "stage_complete_hide_ms")?;

        if t.navigation_safety_ms <= t.min_navigation_display_ms {
            return Err(anyhow!(
                "navigation_safety_ms ({}) must exceed min_navigation_display_ms ({})",
                t.navigation_safety_ms,
                t.min_navigation_display_ms
            ));
        }
        if let Some(bad) = self.landing_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(anyhow!("landing path '{bad}' must start with '/'"));
        }
        Ok(())
    }
}

/// Autêntica preloader simulator
///
/// Replays one page load against the coordinator in virtual time and prints
/// the overlay timeline.
/// Configuration priority: CLI args > Environment variables > Config file > Defaults
#[derive(Parser, Debug, Clone)]
#[command(name = "preloader-sim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Replay a page load against the preloader coordinator", long_about = None)]
pub struct SimArgs {
    /// Optional config file path (TOML format)
    #[arg(long, env = "PRELOADER_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Previous page left the navigation marker behind
    #[arg(long)]
    pub pending_navigation: bool,

    /// Session already completed one full page load
    #[arg(long)]
    pub app_loaded: bool,

    /// Current page path
    #[arg(long, default_value = "/")]
    pub path: String,

    /// document.readyState when the script starts: loading, interactive, complete
    #[arg(long, default_value = "loading")]
    pub ready_state: String,

    /// Virtual time (ms) of DOMContentLoaded
    #[arg(long)]
    pub dom_parsed_at: Option<u64>,

    /// Virtual time (ms) of the window load event (omit to simulate a hung resource)
    #[arg(long)]
    pub loaded_at: Option<u64>,

    /// Extra hidePreloader() calls at these virtual times (comma-separated ms)
    #[arg(long, value_delimiter = ',')]
    pub hide_at: Vec<u64>,

    /// Run a staged progress sequence at this virtual time (ms)
    #[arg(long)]
    pub stages_at: Option<u64>,

    /// Stop the simulation at this virtual time (ms)
    #[arg(long, default_value = "10000")]
    pub until: u64,

    /// Minimum navigation display time override (ms)
    #[arg(long, env = "PRELOADER_MIN_DISPLAY_MS")]
    pub min_display_ms: Option<u64>,

    /// Navigation safety timeout override (ms)
    #[arg(long, env = "PRELOADER_NAVIGATION_SAFETY_MS")]
    pub navigation_safety_ms: Option<u64>,

    /// First paint safety timeout override (ms)
    #[arg(long, env = "PRELOADER_FIRST_PAINT_SAFETY_MS")]
    pub first_paint_safety_ms: Option<u64>,

    /// Include every progress update in the timeline
    #[arg(long)]
    pub verbose: bool,

    /// Print the timeline as JSON
    #[arg(long)]
    pub json: bool,
}

impl SimArgs {
    /// Resolve the coordinator config: CLI/env overrides on top of the file on top of defaults
    pub fn resolve_config(&self) -> Result<PreloaderConfig> {
        let mut cfg = match self.config_file {
            Some(ref path) => {
                log::info!("Loading configuration from {}", path.display());
                PreloaderConfig::load_file(path)?
            }
            None => PreloaderConfig::default(),
        };

        if let Some(ms) = self.min_display_ms {
            cfg.timings.min_navigation_display_ms = ms;
        }
        if let Some(ms) = self.navigation_safety_ms {
            cfg.timings.navigation_safety_ms = ms;
        }
        if let Some(ms) = self.first_paint_safety_ms {
            cfg.timings.first_paint_safety_ms = ms;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = PreloaderConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.timings.min_navigation_display(), Duration::from_millis(1500));
        assert_eq!(cfg.timings.fade_out(), Duration::from_millis(500));
        assert_eq!(cfg.messages.len(), 5);
        assert_eq!(cfg.landing_paths, vec!["/".to_string()]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = PreloaderConfig::from_toml_str(
            r#"
            landing_paths = ["/", "/dashboard"]

            [timings]
            navigation_safety_ms = 10000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timings.navigation_safety_ms, 10_000);
        assert_eq!(cfg.timings.first_paint_safety_ms, 6000);
        assert_eq!(cfg.landing_paths.len(), 2);
        assert_eq!(cfg.stages.len(), 5);
    }

    #[test]
    fn test_json_config() {
        let cfg = PreloaderConfig::from_json_str(r#"{"timings":{"fade_out_ms":250}}"#).unwrap();
        assert_eq!(cfg.timings.fade_out_ms, 250);
        assert_eq!(cfg.timings.progress_tick_ms, 50);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = PreloaderConfig::from_toml_str("[timings]\nprogress_tick_ms = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("progress_tick_ms"));
    }

    #[test]
    fn test_safety_must_exceed_min_display() {
        let mut cfg = PreloaderConfig::default();
        cfg.timings.navigation_safety_ms = 1000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_landing_paths_must_be_absolute() {
        let mut cfg = PreloaderConfig::default();
        cfg.landing_paths = vec!["dashboard".into()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let args = SimArgs::parse_from(["preloader-sim", "--min-display-ms", "900"]);
        let cfg = args.resolve_config().unwrap();
        assert_eq!(cfg.timings.min_navigation_display_ms, 900);
        assert_eq!(cfg.timings.navigation_safety_ms, 8000);
    }
}

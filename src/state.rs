//! Application State - render settings and the render cache
//!
//! `RenderSettings` is the flat record the visualization reads. `AppState`
//! holds the loaded config and caches finished grids by settings.

use crate::backend;
use crate::config::Config;
use crate::fractal::{self, Grid, RenderError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Largest accepted samples-per-axis
pub const MAX_RESOLUTION: u32 = 8192;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Grid resolution n must be at least 1")]
    EmptyGrid,
    #[error("Grid resolution n must be at most {max}, got {0}", max = MAX_RESOLUTION)]
    GridTooLarge(u32),
    #[error("max_iter must be at least 1")]
    NoIterations,
    #[error("{field} must be finite and positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("threshold must be finite and non-negative, got {0}")]
    BadThreshold(f64),
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },
}

/// Viewport, iteration limits and display flags
///
/// Keys serialize under the names the browser front end uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub x0: f64,
    pub y0: f64,
    /// Half-width of the viewport before aspect scaling
    pub eps: f64,
    pub ratio_x: f64,
    pub ratio_y: f64,
    /// Samples per axis
    pub n: u32,
    pub max_iter: u32,
    pub escape_radius: f64,
    /// Successive iterates closer than this count as settled
    pub threshold: f64,
    #[serde(rename = "isDarkMode")]
    pub is_dark_mode: bool,
    #[serde(rename = "isRendering")]
    pub is_rendering: bool,
    #[serde(rename = "fastRender")]
    pub fast_render: bool,
    #[serde(rename = "useCaching")]
    pub use_caching: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            eps: 5.0,
            ratio_x: 1.0,
            ratio_y: 1.0,
            n: 400,
            max_iter: 500,
            escape_radius: 1e10,
            threshold: 1e-9,
            is_dark_mode: false,
            is_rendering: false,
            fast_render: false,
            use_caching: true,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::NotPositive { field, value })
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.n == 0 {
            return Err(SettingsError::EmptyGrid);
        }
        if self.n > MAX_RESOLUTION {
            return Err(SettingsError::GridTooLarge(self.n));
        }
        if self.max_iter == 0 {
            return Err(SettingsError::NoIterations);
        }
        for (field, value) in [("x0", self.x0), ("y0", self.y0)] {
            if !value.is_finite() {
                return Err(SettingsError::NotFinite { field, value });
            }
        }
        positive("eps", self.eps)?;
        positive("ratio_x", self.ratio_x)?;
        positive("ratio_y", self.ratio_y)?;
        positive("escape_radius", self.escape_radius)?;
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(SettingsError::BadThreshold(self.threshold));
        }
        Ok(())
    }

    /// Samples per axis after `fast_render` halving
    pub fn resolution(&self) -> u32 {
        if self.fast_render {
            (self.n / 2).max(1)
        } else {
            self.n
        }
    }

    /// Key over every field that changes the rendered grid
    ///
    /// Display flags (dark mode, rendering, caching) are left out.
    pub fn cache_key(&self) -> String {
        format!(
            "{:?}:{:?}:{:?}:{:?}:{:?}:{}:{}:{:?}:{:?}",
            self.x0,
            self.y0,
            self.eps,
            self.ratio_x,
            self.ratio_y,
            self.resolution(),
            self.max_iter,
            self.escape_radius,
            self.threshold,
        )
    }
}

/// Application state shared across render requests
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub renders: Arc<RwLock<HashMap<String, Arc<Grid>>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            renders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Settings from the loaded config
    pub fn settings(&self) -> &RenderSettings {
        &self.config.render
    }

    /// Render a grid, reusing a cached one when `use_caching` is set
    pub async fn render(&self, settings: &RenderSettings) -> Result<Arc<Grid>, RenderError> {
        settings.validate()?;
        let key = settings.cache_key();

        if settings.use_caching {
            let renders = self.renders.read().await;
            if let Some(grid) = renders.get(&key) {
                tracing::debug!("Render cache hit for {}", key);
                return Ok(grid.clone());
            }
        }
        tracing::debug!("Render cache miss for {}", key);

        let grid = if self.config.backend.enabled {
            tracing::info!("Rendering {0}x{0} through numeric backend", settings.resolution());
            fractal::render_with_backend(backend::shared(), settings).await?
        } else {
            tracing::info!("Rendering {0}x{0} with native arithmetic", settings.resolution());
            let owned = settings.clone();
            tokio::task::spawn_blocking(move || fractal::render(&owned)).await??
        };
        let grid = Arc::new(grid);

        if settings.use_caching {
            let mut renders = self.renders.write().await;
            renders.insert(key, grid.clone());
            tracing::debug!("Render cached ({} entries)", renders.len());
        }

        Ok(grid)
    }

    pub async fn clear_cache(&self) {
        self.renders.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> RenderSettings {
        RenderSettings {
            n: 6,
            max_iter: 50,
            ..RenderSettings::default()
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert_eq!(RenderSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_n = RenderSettings { n: 0, ..small() };
        assert_eq!(zero_n.validate(), Err(SettingsError::EmptyGrid));

        let no_iter = RenderSettings { max_iter: 0, ..small() };
        assert_eq!(no_iter.validate(), Err(SettingsError::NoIterations));

        let bad_eps = RenderSettings { eps: -1.0, ..small() };
        assert!(matches!(bad_eps.validate(), Err(SettingsError::NotPositive { field: "eps", .. })));

        let bad_threshold = RenderSettings { threshold: f64::NAN, ..small() };
        assert!(matches!(bad_threshold.validate(), Err(SettingsError::BadThreshold(_))));

        let bad_center = RenderSettings { x0: f64::INFINITY, ..small() };
        assert!(matches!(bad_center.validate(), Err(SettingsError::NotFinite { field: "x0", .. })));
    }

    #[test]
    fn test_validate_caps_resolution() {
        let at_limit = RenderSettings { n: MAX_RESOLUTION, ..small() };
        assert_eq!(at_limit.validate(), Ok(()));

        let over = RenderSettings { n: MAX_RESOLUTION + 1, ..small() };
        assert_eq!(over.validate(), Err(SettingsError::GridTooLarge(MAX_RESOLUTION + 1)));

        let huge = RenderSettings { n: 65536, max_iter: 1, ..small() };
        assert_eq!(huge.validate(), Err(SettingsError::GridTooLarge(65536)));
    }

    #[test]
    fn test_fast_render_halves_resolution() {
        let s = RenderSettings { n: 5, fast_render: true, ..small() };
        assert_eq!(s.resolution(), 2);
        let tiny = RenderSettings { n: 1, fast_render: true, ..small() };
        assert_eq!(tiny.resolution(), 1);
    }

    #[test]
    fn test_cache_key_ignores_display_flags() {
        let a = small();
        let b = RenderSettings { is_dark_mode: true, is_rendering: true, ..small() };
        assert_eq!(a.cache_key(), b.cache_key());

        let c = RenderSettings { x0: 0.5, ..small() };
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_serde_uses_front_end_keys() {
        let json = serde_json::to_value(RenderSettings::default()).unwrap();
        assert!(json.get("isDarkMode").is_some());
        assert!(json.get("max_iter").is_some());
        assert!(json.get("is_dark_mode").is_none());

        let parsed: RenderSettings =
            serde_json::from_str(r#"{"n": 32, "fastRender": true}"#).unwrap();
        assert_eq!(parsed.n, 32);
        assert!(parsed.fast_render);
        assert_eq!(parsed.max_iter, RenderSettings::default().max_iter);
    }

    #[tokio::test]
    async fn test_render_is_cached() {
        let state = AppState::new(Config::default());
        let settings = small();

        let first = state.render(&settings).await.unwrap();
        let second = state.render(&settings).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(state.renders.read().await.len(), 1);

        state.clear_cache().await;
        assert!(state.renders.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_render_without_caching_recomputes() {
        let state = AppState::new(Config::default());
        let settings = RenderSettings { use_caching: false, ..small() };

        let first = state.render(&settings).await.unwrap();
        let second = state.render(&settings).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert!(state.renders.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_render_rejects_invalid_settings() {
        let state = AppState::new(Config::default());
        let settings = RenderSettings { n: 0, ..small() };
        assert!(matches!(
            state.render(&settings).await,
            Err(RenderError::Settings(SettingsError::EmptyGrid))
        ));
    }
}

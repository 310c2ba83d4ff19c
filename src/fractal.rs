//! Tetration Escape-Time Renderer
//!
//! Iterates the power tower z_{k+1} = c^{z_k}, z_0 = c, for every sample
//! point c of the viewport and records how each orbit ends.

use crate::backend::{Backend, BackendError, ProviderLoader};
use crate::complex::{self, Complex};
use crate::state::{RenderSettings, SettingsError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render settings: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// How an orbit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "iter", rename_all = "snake_case")]
pub enum Cell {
    /// Left the escape radius (or became non-finite) at this iteration
    Escaped(u32),
    /// Successive iterates came within the threshold at this iteration
    Settled(u32),
    /// Neither within max_iter
    Bounded,
}

/// Row-major cells, row 0 at the top of the viewport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<Cell>,
}

impl Grid {
    pub fn get(&self, col: u32, row: u32) -> Option<Cell> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let index = row as usize * self.width as usize + col as usize;
        self.cells.get(index).copied()
    }

    pub fn escaped_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Escaped(_)))
            .count()
    }
}

/// Sample lattice over the complex plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub n: u32,
}

fn linspace(min: f64, max: f64, n: u32, i: u32) -> f64 {
    if n <= 1 {
        return (min + max) / 2.0;
    }
    min + (max - min) * i as f64 / (n - 1) as f64
}

impl Viewport {
    pub fn from_settings(s: &RenderSettings) -> Self {
        let half_x = s.eps * s.ratio_x;
        let half_y = s.eps * s.ratio_y;
        Self {
            x_min: s.x0 - half_x,
            x_max: s.x0 + half_x,
            y_min: s.y0 - half_y,
            y_max: s.y0 + half_y,
            n: s.resolution(),
        }
    }

    pub fn point(&self, col: u32, row: u32) -> Complex {
        Complex::new(
            linspace(self.x_min, self.x_max, self.n, col),
            linspace(self.y_max, self.y_min, self.n, row),
        )
    }
}

/// Iteration limits pulled out of the settings
#[derive(Debug, Clone, Copy)]
struct Limits {
    max_iter: u32,
    escape_radius: f64,
    threshold: f64,
}

impl Limits {
    fn from_settings(s: &RenderSettings) -> Self {
        Self {
            max_iter: s.max_iter,
            escape_radius: s.escape_radius,
            threshold: s.threshold,
        }
    }

    /// Verdict after iteration `k` produced `next`, or None to keep going
    fn judge(&self, k: u32, next: Complex, next_mag: f64, delta: f64) -> Option<Cell> {
        if !next.re.is_finite() || !next.im.is_finite() || next_mag > self.escape_radius {
            return Some(Cell::Escaped(k + 1));
        }
        if delta < self.threshold {
            return Some(Cell::Settled(k + 1));
        }
        None
    }
}

fn classify_with(c: Complex, limits: Limits) -> Cell {
    let mut z = c;
    for k in 0..limits.max_iter {
        let next = complex::power(c, z);
        let delta = complex::magnitude(complex::subtract(next, z));
        if let Some(cell) = limits.judge(k, next, complex::magnitude(next), delta) {
            return cell;
        }
        z = next;
    }
    Cell::Bounded
}

/// Classify one point of the power tower
pub fn classify(c: Complex, max_iter: u32, escape_radius: f64, threshold: f64) -> Cell {
    classify_with(c, Limits { max_iter, escape_radius, threshold })
}

/// Render the whole viewport with the local arithmetic library
pub fn render(settings: &RenderSettings) -> Result<Grid, RenderError> {
    settings.validate()?;
    let viewport = Viewport::from_settings(settings);
    let limits = Limits::from_settings(settings);
    let n = viewport.n;

    let mut cells = Vec::with_capacity(n as usize * n as usize);
    for row in 0..n {
        for col in 0..n {
            cells.push(classify_with(viewport.point(col, row), limits));
        }
    }

    tracing::debug!("Rendered {}x{} grid", n, n);
    Ok(Grid { width: n, height: n, cells })
}

/// Render the whole viewport through a numeric backend adapter
pub async fn render_with_backend<L: ProviderLoader>(
    backend: &Backend<L>,
    settings: &RenderSettings,
) -> Result<Grid, RenderError> {
    settings.validate()?;
    let viewport = Viewport::from_settings(settings);
    let limits = Limits::from_settings(settings);
    let n = viewport.n;

    let mut cells = Vec::with_capacity(n as usize * n as usize);
    for row in 0..n {
        for col in 0..n {
            let c = viewport.point(col, row);
            let mut z = c;
            let mut cell = Cell::Bounded;
            for k in 0..limits.max_iter {
                let next = backend.power(c, z).await?;
                let delta = backend.magnitude(backend.subtract(next, z).await?).await?;
                let next_mag = backend.magnitude(next).await?;
                if let Some(verdict) = limits.judge(k, next, next_mag, delta) {
                    cell = verdict;
                    break;
                }
                z = next;
            }
            cells.push(cell);
        }
    }

    tracing::debug!("Rendered {}x{} grid through backend", n, n);
    Ok(Grid { width: n, height: n, cells })
}

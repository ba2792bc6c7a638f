//! Canvas ↔ viewport coordinate mapping.
//!
//! The whole canvas is scaled by one uniform factor and never enlarged:
//!
//! ```text
//! scale = min(1, viewport.max_width / canvas.width, viewport.max_height / canvas.height)
//! ```
//!
//! A zero or negative viewport floors the scale at
//! [`MIN_SCALE`] so the inverse mapping stays finite.
//!
//! The renderer and the drag controller share one [`CanvasTransform`], so a
//! pointer position maps back onto exactly the pixels that were drawn there.

use serde::{Deserialize, Serialize};

use crate::template::CanvasSize;

/// Largest area the canvas may occupy on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub max_width: f32,
    pub max_height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            max_width: 800.0,
            max_height: 600.0,
        }
    }
}

/// A point in either space. Which one is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Smallest scale [`fit_scale`] returns.
pub const MIN_SCALE: f32 = 0.01;

/// Uniform fit-to-viewport factor, between [`MIN_SCALE`] and 1.
#[inline]
pub fn fit_scale(canvas: CanvasSize, viewport: Viewport) -> f32 {
    (viewport.max_width / canvas.width)
        .min(viewport.max_height / canvas.height)
        .min(1.0)
        .max(MIN_SCALE)
}

/// Scale between canvas px and viewport px.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasTransform {
    pub scale: f32,
}

impl CanvasTransform {
    pub fn fit(canvas: CanvasSize, viewport: Viewport) -> Self {
        Self {
            scale: fit_scale(canvas, viewport),
        }
    }

    /// Viewport → canvas (inverse scale).
    #[inline]
    pub fn to_canvas(&self, p: Point) -> Point {
        Point::new(p.x / self.scale, p.y / self.scale)
    }

    /// Canvas → viewport.
    #[inline]
    pub fn to_viewport(&self, p: Point) -> Point {
        Point::new(p.x * self.scale, p.y * self.scale)
    }

    pub fn rect_to_viewport(&self, r: Rect) -> Rect {
        Rect::new(
            r.x * self.scale,
            r.y * self.scale,
            r.width * self.scale,
            r.height * self.scale,
        )
    }
}

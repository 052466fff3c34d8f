//! Viewport controller.
//!
//! Owns the scale/pan triple for one viewer and computes the transforms for
//! cursor-anchored zoom, button zoom, centering and fit-to-view.

use serde::Serialize;

use crate::geometry::{ContainerSize, Point};
use crate::layout::TreeBounds;

/// Zoom multiplier for one wheel tick or one zoom button press.
pub const ZOOM_STEP: f64 = 1.1;

/// Padding added to the bounds when centering the tree.
pub const CENTER_PADDING: f64 = 100.0;

/// Padding added to the bounds for zoom-to-fit.
pub const FIT_PADDING: f64 = 50.0;

/// Pan offset restored by [`ViewportController::reset`].
pub const DEFAULT_RESET_PAN: Point = Point::new(50.0, 50.0);

/// The transform applied uniformly to the whole node/edge group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportTransform {
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0);

    pub const fn new(scale: f64, pan_x: f64, pan_y: f64) -> Self {
        Self {
            scale,
            pan_x,
            pan_y,
        }
    }

    /// Content point shown at a container point.
    #[inline]
    pub fn to_content(&self, container: Point) -> Point {
        Point::new(
            (container.x - self.pan_x) / self.scale,
            (container.y - self.pan_y) / self.scale,
        )
    }

    /// Container point where a content point is shown.
    #[inline]
    pub fn to_container(&self, content: Point) -> Point {
        Point::new(
            content.x * self.scale + self.pan_x,
            content.y * self.scale + self.pan_y,
        )
    }

    /// Transform that fits `bounds` grown by `padding` into `container`,
    /// never magnifying beyond 1:1, with the bounds centered.
    ///
    /// Returns `None` if the container has no area (or the inputs are not
    /// finite), since no positive scale exists.
    pub fn fit(bounds: &TreeBounds, container: ContainerSize, padding: f64) -> Option<Self> {
        let width = bounds.width();
        let height = bounds.height();

        let scale_x = container.width / (width + padding);
        let scale_y = container.height / (height + padding);
        let scale = scale_x.min(scale_y).min(1.0);
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }

        let pan_x = (container.width - width * scale) / 2.0 - bounds.min_x * scale;
        let pan_y = (container.height - height * scale) / 2.0 - bounds.min_y * scale;
        if !(pan_x.is_finite() && pan_y.is_finite()) {
            return None;
        }

        Some(Self::new(scale, pan_x, pan_y))
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Viewport controller for one viewer instance.
#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: ViewportTransform,
    reset_pan: Point,
}

impl ViewportController {
    /// Create a controller at the identity transform.
    pub fn new() -> Self {
        Self {
            transform: ViewportTransform::IDENTITY,
            reset_pan: DEFAULT_RESET_PAN,
        }
    }

    /// Create a controller whose [`reset`](Self::reset) uses `reset_pan`.
    pub fn with_reset_pan(reset_pan: Point) -> Self {
        Self {
            transform: ViewportTransform::IDENTITY,
            reset_pan,
        }
    }

    #[inline]
    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    /// Assign the transform directly. No validation.
    pub fn set_transform(&mut self, scale: f64, pan_x: f64, pan_y: f64) {
        self.transform = ViewportTransform::new(scale, pan_x, pan_y);
    }

    /// Set only the pan offset.
    pub fn set_pan(&mut self, pan_x: f64, pan_y: f64) {
        self.transform.pan_x = pan_x;
        self.transform.pan_y = pan_y;
    }

    /// Zoom by `factor` keeping the content under `cursor` (container
    /// coordinates) in place.
    ///
    /// Returns false (and changes nothing) for non-finite or non-positive
    /// factors.
    pub fn zoom_around_point(&mut self, cursor: Point, factor: f64) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            return false;
        }

        let anchor = self.transform.to_content(cursor);
        let scale = self.transform.scale * factor;
        self.transform = ViewportTransform::new(
            scale,
            cursor.x - anchor.x * scale,
            cursor.y - anchor.y * scale,
        );
        true
    }

    /// Button zoom: scale changes, pan stays.
    pub fn zoom_by(&mut self, factor: f64) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            return false;
        }
        self.transform.scale *= factor;
        true
    }

    /// Compute the fit transform without applying it.
    pub fn compute_fit_transform(
        &self,
        bounds: &TreeBounds,
        container: ContainerSize,
        padding: f64,
    ) -> Option<ViewportTransform> {
        ViewportTransform::fit(bounds, container, padding)
    }

    /// Fit `bounds` into `container` and apply it.
    ///
    /// Leaves the transform untouched when no fit exists.
    pub fn fit(&mut self, bounds: &TreeBounds, container: ContainerSize, padding: f64) -> bool {
        match ViewportTransform::fit(bounds, container, padding) {
            Some(transform) => {
                self.transform = transform;
                true
            }
            None => {
                tracing::debug!(?container, "container has no area, keeping transform");
                false
            }
        }
    }

    /// Back to scale 1 at the configured pan offset, regardless of content.
    pub fn reset(&mut self) {
        self.transform = ViewportTransform::new(1.0, self.reset_pan.x, self.reset_pan.y);
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

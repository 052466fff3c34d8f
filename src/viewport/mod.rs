//! Viewport state: the pan/zoom transform between content and container.
//!
//! A container point `c` and a content point `p` are related by
//! `c = p * scale + pan`.

mod controller;

pub use controller::{
    CENTER_PADDING, DEFAULT_RESET_PAN, FIT_PADDING, ViewportController, ViewportTransform,
    ZOOM_STEP,
};

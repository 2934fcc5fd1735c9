//! CPU compositing of output frames.

/// Premultiplied RGBA8 blend operations.
pub mod composite;
/// Output frame assembly with the cross-dissolve overlay.
pub mod compositor;
/// Frame buffer type.
pub mod frame;
/// Bilinear crop resampling.
pub mod sample;
/// Per-clip crop, zoom and flip.
pub mod transform;

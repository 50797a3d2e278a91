//! Error types for warpfield.
//!
//! Capability failures, configuration problems and host/runtime failures each
//! get their own enum. Per-frame sink failures are plain values
//! ([`SinkError`]) so the render loop can branch on them without unwinding.

use thiserror::Error;

/// Errors that can occur while acquiring a GPU rendering context.
///
/// Any of these means the backdrop cannot run. The host treats them as
/// "capability absent" and renders nothing.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    #[error("surface exposes no supported texture format")]
    NoSurfaceFormat,
}

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid configuration JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration parsed but holds inconsistent values.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur when running the backdrop host or a snapshot.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to create or run the event loop.
    #[error("event loop failure: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Writing a snapshot image failed.
    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),
}

/// Outcome of a failed draw submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The output surface is gone; all state must be rebuilt.
    #[error("rendering surface lost")]
    Lost,
    /// This frame could not be presented (timeout, outdated surface).
    #[error("frame skipped")]
    Skipped,
}

//! Window host.
//!
//! [`Backdrop`] is the builder and `App` the winit application that owns
//! the window, the GPU state and the render loop. The host feeds the loop
//! everything it consumes from the outside world: viewport size and scale
//! factor, pointer and touch positions, visibility, and the one-time GPU
//! capability probe.
//!
//! ```ignore
//! Backdrop::new()
//!     .with_seed(42)
//!     .with_reduced_motion(false)
//!     .run()?;
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::WarpConfig;
use crate::error::{ConfigError, RunError};
use crate::gpu::{self, Capability, GpuState};
use crate::input::Input;
use crate::raster::Raster;
use crate::render_loop::{FrameOutcome, MotionMode, RenderContext, RenderLoop};
use crate::viewport::{SurfaceSize, Viewport};

/// Surface rebuilds allowed per session before the host gives up.
pub const MAX_REBUILDS: u32 = 3;

/// Environment variable that requests reduced motion when set to `1`.
pub const REDUCED_MOTION_ENV: &str = "WARPFIELD_REDUCED_MOTION";

/// Counts surface rebuilds against a fixed allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildBudget {
    used: u32,
    max: u32,
}

impl RebuildBudget {
    pub fn new(max: u32) -> Self {
        Self { used: 0, max }
    }

    /// Spend one rebuild. Returns `false` once the allowance is gone.
    pub fn try_consume(&mut self) -> bool {
        if self.used >= self.max {
            return false;
        }
        self.used += 1;
        true
    }

    #[inline]
    pub fn used(&self) -> u32 {
        self.used
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }
}

impl Default for RebuildBudget {
    fn default() -> Self {
        Self::new(MAX_REBUILDS)
    }
}

/// Backdrop builder.
///
/// Use method chaining to configure, then call `.run()` to open a window or
/// `.snapshot()` to render one static frame to a PNG.
#[derive(Debug, Clone, Default)]
pub struct Backdrop {
    config: Option<WarpConfig>,
    seed: Option<u64>,
    motion: MotionMode,
    title: Option<String>,
}

impl Backdrop {
    /// Defaults picked from the window size at startup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration instead of viewport-derived defaults.
    pub fn with_config(mut self, config: WarpConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Fix the generation seed. Overrides any seed in the configuration.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.motion = if reduced {
            MotionMode::Reduced
        } else {
            MotionMode::Continuous
        };
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Configuration for a viewport: the explicit one, or small/large defaults.
    pub fn config_for(&self, viewport: &Viewport) -> WarpConfig {
        match &self.config {
            Some(config) => config.clone(),
            None => WarpConfig::for_viewport(viewport.is_small()),
        }
    }

    /// Validated configuration for a viewport.
    pub fn checked_config(&self, viewport: &Viewport) -> Result<WarpConfig, ConfigError> {
        let config = self.config_for(viewport);
        config.validate()?;
        Ok(config)
    }

    /// Seed from the builder, then the explicit configuration, then the clock.
    pub fn resolve_seed(&self) -> u64 {
        self.seed
            .or(self.config.as_ref().and_then(|c| c.seed))
            .unwrap_or_else(clock_seed)
    }

    /// Open a window and run until it is closed.
    pub fn run(self) -> Result<(), RunError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;
        Ok(())
    }

    /// Render the static frame headlessly at `size` and write it as a PNG.
    pub fn snapshot(self, size: SurfaceSize, path: impl AsRef<Path>) -> Result<(), RunError> {
        let viewport = Viewport::new(size.width as f64, size.height as f64, 1.0);
        let config = self.checked_config(&viewport)?;
        let seed = self.resolve_seed();

        let context = RenderContext::new(config, seed, viewport, MotionMode::Reduced);
        let mut render_loop = RenderLoop::new(context);
        let mut raster = Raster::new(size);
        render_loop.start(&mut raster);
        render_loop.frame(&mut raster);

        raster.save_png(path.as_ref())?;
        log::info!(
            "wrote {}x{} snapshot (seed {seed}) to {}",
            size.width,
            size.height,
            path.as_ref().display()
        );
        Ok(())
    }
}

/// `true` if the environment asks for reduced motion.
pub fn reduced_motion_from_env() -> bool {
    std::env::var(REDUCED_MOTION_ENV).is_ok_and(|v| v.trim() == "1")
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn viewport_of(window: &Window) -> Viewport {
    let size = window.inner_size();
    Viewport::from_physical(size.width, size.height, window.scale_factor())
}

struct App {
    settings: Backdrop,
    /// Resolved once so a rebuild regenerates the same fields.
    seed: u64,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    render_loop: Option<RenderLoop>,
    input: Input,
    occluded: bool,
    minimized: bool,
    rebuilds: RebuildBudget,
    /// Capability absent, config invalid or rebuilds exhausted; nothing is rendered.
    disabled: bool,
}

impl App {
    fn new(settings: Backdrop) -> Self {
        let seed = settings.resolve_seed();
        Self {
            settings,
            seed,
            window: None,
            gpu: None,
            render_loop: None,
            input: Input::new(),
            occluded: false,
            minimized: false,
            rebuilds: RebuildBudget::default(),
            disabled: false,
        }
    }

    fn visible(&self) -> bool {
        !self.occluded && !self.minimized
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// Probe the GPU and build the render loop from configuration.
    fn build(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let viewport = viewport_of(&window);
        let config = match self.settings.checked_config(&viewport) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("{err}; backdrop disabled");
                self.disabled = true;
                return;
            }
        };

        let mut gpu = match gpu::probe(window.clone()) {
            Capability::Ready(gpu) => gpu,
            Capability::Unavailable(_) => {
                self.disabled = true;
                return;
            }
        };

        let context = RenderContext::new(config, self.seed, viewport, self.settings.motion);
        gpu.load_fields(&context.fields);

        let mut render_loop = RenderLoop::new(context);
        let started = render_loop.start(&mut gpu);
        if !self.visible() {
            render_loop.set_visible(false);
        } else if started {
            window.request_redraw();
        }

        self.gpu = Some(gpu);
        self.render_loop = Some(render_loop);
    }

    /// Drop GPU state and the loop, then rebuild both, at most `MAX_REBUILDS` times.
    fn rebuild(&mut self) {
        self.render_loop = None;
        self.gpu = None;
        if self.disabled {
            return;
        }

        if !self.rebuilds.try_consume() {
            log::warn!("surface lost {} times; backdrop disabled", self.rebuilds.used() + 1);
            self.disabled = true;
            return;
        }
        log::info!(
            "rebuilding after surface loss ({}/{MAX_REBUILDS})",
            self.rebuilds.used()
        );
        self.build();
    }

    fn resized(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let size = window.inner_size();
        self.minimized = size.width == 0 || size.height == 0;
        self.input.set_window_size(size.width, size.height);

        let visible = self.visible();
        if let (Some(gpu), Some(render_loop)) = (&mut self.gpu, &mut self.render_loop) {
            gpu.resize_surface(size.width, size.height);
            if render_loop.resize(viewport_of(&window), gpu) && visible {
                window.request_redraw();
            }
        }
        self.update_visibility();
    }

    fn update_visibility(&mut self) {
        let visible = self.visible();
        if let Some(render_loop) = &mut self.render_loop {
            if render_loop.set_visible(visible) {
                self.request_redraw();
            }
        }
    }

    fn redraw(&mut self) {
        let (Some(gpu), Some(render_loop)) = (&mut self.gpu, &mut self.render_loop) else {
            return;
        };
        match render_loop.frame(gpu) {
            FrameOutcome::Rendered { next: true } | FrameOutcome::Dropped => self.request_redraw(),
            FrameOutcome::Rendered { next: false } | FrameOutcome::Idle => {}
            FrameOutcome::SurfaceLost => self.rebuild(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.disabled {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.settings.title.as_deref().unwrap_or("warpfield"))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);
        self.window = Some(window);
        self.build();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.input.handle_event(&event) {
            if let (Some(pointer), Some(render_loop)) =
                (self.input.take_pointer(), &mut self.render_loop)
            {
                render_loop.set_pointer(pointer);
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.resized();
            }
            WindowEvent::Occluded(occluded) => {
                self.occluded = occluded;
                self.update_visibility();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_priority() {
        let mut config = WarpConfig::default();
        config.seed = Some(5);
        let configured = Backdrop::new().with_config(config);
        assert_eq!(configured.clone().with_seed(9).resolve_seed(), 9);
        assert_eq!(configured.resolve_seed(), 5);
    }

    #[test]
    fn test_seed_is_kept_across_rebuilds() {
        let mut app = App::new(Backdrop::new());
        let seed = app.seed;
        app.rebuild();
        app.rebuild();
        assert_eq!(app.seed, seed);
    }

    #[test]
    fn test_rebuild_budget() {
        let mut budget = RebuildBudget::new(MAX_REBUILDS);
        for _ in 0..MAX_REBUILDS {
            assert!(budget.try_consume());
        }
        assert!(budget.is_exhausted());
        assert!(!budget.try_consume());
        assert_eq!(budget.used(), MAX_REBUILDS);
    }

    #[test]
    fn test_fourth_surface_loss_disables_backdrop() {
        let mut app = App::new(Backdrop::new().with_seed(1));
        for _ in 0..MAX_REBUILDS {
            app.rebuild();
            assert!(!app.disabled);
        }
        assert_eq!(app.rebuilds.used(), MAX_REBUILDS);

        app.rebuild();
        assert!(app.disabled);
        assert!(app.gpu.is_none() && app.render_loop.is_none());

        // Disabled hosts stop spending the budget.
        let before = app.rebuilds;
        app.rebuild();
        assert_eq!(app.rebuilds, before);
        assert!(app.disabled);
    }

    #[test]
    fn test_invalid_explicit_config_is_rejected() {
        let mut config = WarpConfig::default();
        config.stars.size_bounds = [2.0, 1.0];
        let backdrop = Backdrop::new().with_config(config);

        let viewport = Viewport::new(1280.0, 720.0, 1.0);
        assert!(matches!(backdrop.checked_config(&viewport), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            backdrop.snapshot(SurfaceSize::new(32, 32), std::env::temp_dir().join("warpfield-unused.png")),
            Err(RunError::Config(_))
        ));
    }

    #[test]
    fn test_config_follows_viewport_unless_explicit() {
        let small = Viewport::new(600.0, 800.0, 2.0);
        let large = Viewport::new(1600.0, 900.0, 1.0);
        let b = Backdrop::new();
        assert_eq!(b.config_for(&small), WarpConfig::for_viewport(true));
        assert_eq!(b.config_for(&large), WarpConfig::for_viewport(false));

        let explicit = Backdrop::new().with_config(WarpConfig::for_viewport(false));
        assert_eq!(explicit.config_for(&small), WarpConfig::for_viewport(false));
    }

    #[test]
    fn test_snapshot_writes_png() {
        let path = std::env::temp_dir().join(format!("warpfield-snapshot-{}.png", std::process::id()));
        Backdrop::new()
            .with_seed(3)
            .snapshot(SurfaceSize::new(96, 64), &path)
            .unwrap();

        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (96, 64));
        let _ = std::fs::remove_file(&path);
    }
}

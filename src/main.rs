use std::any::Any;
use std::env;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use pollster::block_on;
use thiserror::Error;
use winit::dpi::LogicalSize;
use winit::event::{
    ElementState, Event, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;
use winit::window::WindowBuilder;

use mesh_viewer::camera::PIXELS_PER_SCROLL_LINE;
use mesh_viewer::{
    frame_params, load_obj, LoadOptions, LoadStats, Mesh, MouseButton, OrbitController, Renderer,
    Vector3, ViewerSettings,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let loaded = load_obj(
        &options.path,
        LoadOptions {
            weld: options.weld,
        },
    )
    .with_context(|| format!("failed to load mesh {}", options.path))?;
    let mut mesh = loaded.mesh;

    println!(
        "Loaded {} vertices and {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    report_fallbacks(&loaded.stats);
    if mesh.is_empty() {
        warn!("{} contains no faces; nothing will be drawn", options.path);
    }

    mesh.normalize();
    println!(
        "Mesh normalized. Bounds: {} to {}",
        format_point(mesh.min_bounds),
        format_point(mesh.max_bounds)
    );

    if options.summary_only {
        return Ok(());
    }
    match run_interactive(&mesh, &options) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or WAYLAND_DISPLAY to enable rendering)."
                );
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

fn report_fallbacks(stats: &LoadStats) {
    if stats.normals_generated {
        info!("no normals in file; generated them from face geometry");
    }
    if stats.placeholder_normals > 0 {
        println!(
            "Note: {} corner(s) use a placeholder normal",
            stats.placeholder_normals
        );
    }
    if stats.extra_corners_ignored > 0 {
        println!(
            "Note: {} polygon corner(s) beyond the first triangle were ignored",
            stats.extra_corners_ignored
        );
    }
}

fn format_point(point: Vector3) -> String {
    format!("({:.2}, {:.2}, {:.2})", point.x(), point.y(), point.z())
}

fn run_interactive(mesh: &Mesh, options: &CliOptions) -> Result<()> {
    let settings = ViewerSettings::default();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let mut event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;

    let (width, height) = settings.window_size;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&settings.window_title)
            .with_inner_size(LogicalSize::new(f64::from(width), f64::from(height)))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let renderer = block_on(Renderer::new(Arc::clone(&window), mesh, settings))?;
    if let Err(err) = renderer.shader_program().check() {
        if options.strict_shaders {
            return Err(err).context("shader program is unusable");
        }
        warn!("continuing without a working shader program: {err}");
    }

    let mut app = AppState {
        renderer,
        controller: OrbitController::default(),
        started: Instant::now(),
        last_error: None,
    };

    event_loop.run_on_demand(|event, target| {
        target.set_control_flow(ControlFlow::Poll);
        if let Err(err) = app.process_event(&event, target) {
            app.last_error = Some(err);
            target.exit();
        }
    })?;

    app.shutdown()
}

struct AppState {
    renderer: Renderer,
    controller: OrbitController,
    started: Instant,
    last_error: Option<anyhow::Error>,
}

#[derive(Debug, Error)]
#[error("failed to initialize {stage}: {message}")]
struct WindowInitError {
    stage: &'static str,
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &'static str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            stage,
            message: panic_message(panic),
        }
    }

    fn from_error(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

impl AppState {
    fn process_event(
        &mut self,
        event: &Event<()>,
        target: &EventLoopWindowTarget<()>,
    ) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => target.exit(),
                    WindowEvent::Resized(size) => self.renderer.resize(*size),
                    WindowEvent::MouseInput { state, button, .. } => {
                        let pressed = *state == ElementState::Pressed;
                        self.controller
                            .on_mouse_button(map_mouse_button(*button), pressed);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        self.controller.on_cursor_moved(position.x, position.y);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let (dx, dy) = scroll_lines(delta);
                        self.controller.on_scroll(dx, dy);
                    }
                    WindowEvent::RedrawRequested => self.redraw()?,
                    _ => {}
                }
            }
            Event::AboutToWait => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let frame = frame_params(
            self.controller.camera(),
            self.started.elapsed().as_secs_f32(),
            self.renderer.aspect(),
            self.renderer.settings(),
        );
        if let Err(err) = self.renderer.render(&frame) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = self.renderer.window().inner_size();
                    self.renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => {
                    return Err(anyhow!("GPU is out of memory"));
                }
                wgpu::SurfaceError::Timeout => {
                    info!("Surface timeout; retrying next frame");
                }
            }
        }
        Ok(())
    }

    /// Releases GPU resources before the window goes away and reports the
    /// first error raised inside the event loop.
    fn shutdown(self) -> Result<()> {
        let Self {
            renderer,
            last_error,
            ..
        } = self;
        drop(renderer);
        last_error.map_or(Ok(()), Err)
    }
}

fn map_mouse_button(button: WinitMouseButton) -> MouseButton {
    let index = match button {
        WinitMouseButton::Left => 0,
        WinitMouseButton::Right => 1,
        WinitMouseButton::Middle => 2,
        WinitMouseButton::Back => 3,
        WinitMouseButton::Forward => 4,
        WinitMouseButton::Other(value) => u8::try_from(value).unwrap_or(u8::MAX),
    };
    MouseButton::new(index)
}

fn scroll_lines(delta: &MouseScrollDelta) -> (f32, f32) {
    match *delta {
        MouseScrollDelta::LineDelta(x, y) => (x, y),
        MouseScrollDelta::PixelDelta(position) => (
            position.x as f32 / PIXELS_PER_SCROLL_LINE,
            position.y as f32 / PIXELS_PER_SCROLL_LINE,
        ),
    }
}

struct CliOptions {
    path: String,
    summary_only: bool,
    weld: bool,
    strict_shaders: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: mesh-viewer <mesh.obj> [--summary-only] [--weld] [--strict-shaders]"
            ));
        };
        let mut options = Self {
            path,
            summary_only: false,
            weld: false,
            strict_shaders: false,
        };
        for arg in args {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--weld" => options.weld = true,
                "--strict-shaders" => options.strict_shaders = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --summary-only, --weld or --strict-shaders"
                    ));
                }
            }
        }
        Ok(options)
    }
}

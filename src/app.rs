use std::sync::Arc;

use log::{info, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::ball::{Ball, LaunchParams};
use crate::camera::{FirstPersonCamera, MoveKeys};
use crate::clock::FrameClock;
use crate::config::{AppConfig, SceneConfig};
use crate::controls::BallControls;
use crate::error::{Error, StartupError};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::light::{Light, LightConfig};
use crate::render::{CameraView, GpuRenderer, PassOrder, render_frame};
use crate::scene::Scene;
use crate::shader::ShaderSources;

/// Open the window and run the demo until it is closed.
///
/// Returns once the window closes. Any startup failure, or the GPU running
/// out of memory, ends the event loop and is returned here.
///
/// ```no_run
/// use freekick::{AppConfig, SceneConfig};
///
/// fn main() -> Result<(), freekick::Error> {
///     freekick::run(AppConfig::default(), SceneConfig::floodlit().asset_root("assets"))
/// }
/// ```
pub fn run(config: AppConfig, scene: SceneConfig) -> Result<(), Error> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FreekickApp::Pending { config, scene };
    event_loop.run_app(&mut app)?;

    match app {
        FreekickApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

enum FreekickApp {
    Pending {
        config: AppConfig,
        scene: SceneConfig,
    },
    Running(Box<Demo>),
    Failed(Error),
}

impl ApplicationHandler for FreekickApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let FreekickApp::Pending { config, scene } = self else {
            return;
        };

        match Demo::start(event_loop, config, scene) {
            Ok(demo) => {
                demo.window.request_redraw();
                *self = FreekickApp::Running(Box::new(demo));
            }
            Err(err) => {
                *self = FreekickApp::Failed(err.into());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let FreekickApp::Running(demo) = self else {
            return;
        };

        demo.input.handle_event(&event);
        if demo.input.close_requested() || demo.input.key_down(KeyCode::Escape) {
            info!("closing");
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                demo.gpu.resize(size.width, size.height);
            }
            WindowEvent::Focused(true) => grab_cursor(&demo.window),
            WindowEvent::RedrawRequested => {
                if let Err(err) = demo.frame() {
                    *self = FreekickApp::Failed(err);
                    event_loop.exit();
                    return;
                }
                demo.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let FreekickApp::Running(demo) = self {
            demo.input.handle_device_event(&event);
        }
    }
}

/// Everything the running demo owns.
struct Demo {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: GpuRenderer,
    scene: Scene,
    ball: Ball,
    launch: LaunchParams,
    light: LightConfig,
    camera: FirstPersonCamera,
    controls: BallControls,
    input: Input,
    clock: FrameClock,
    order: PassOrder,
}

impl Demo {
    fn start(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        scene: &SceneConfig,
    ) -> Result<Self, StartupError> {
        let attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(attrs)?);
        grab_cursor(&window);

        let gpu = GpuContext::new(window.clone(), config.vsync)?;
        let light = Light::new(&gpu, scene.light.clone())?;

        let shaders = scene
            .shader_dir
            .as_ref()
            .map(ShaderSources::with_dir)
            .unwrap_or_default();
        let (graph, model_paths) = scene.build_scene();
        let renderer = GpuRenderer::new(
            &gpu,
            &shaders,
            light,
            &model_paths,
            scene.skybox_paths().as_ref(),
            scene.clear_color,
        )?;

        info!(
            "scene ready: {} instances, F to kick, R to reset, Esc to quit",
            graph.len()
        );

        Ok(Self {
            window,
            gpu,
            renderer,
            scene: graph,
            ball: Ball::new(scene.launch),
            launch: scene.launch,
            light: scene.light.clone(),
            camera: scene.camera.clone(),
            controls: BallControls::new(scene.trigger),
            input: Input::new(),
            clock: FrameClock::new(scene.step_policy),
            order: PassOrder::new(),
        })
    }

    /// Advance the simulation by one frame and draw it.
    fn frame(&mut self) -> Result<(), Error> {
        let dt = self.clock.tick();

        let look = self.input.look_delta();
        self.camera.apply_look(look.x, look.y);
        self.camera
            .apply_movement(MoveKeys::from_input(&self.input), dt);
        self.controls
            .apply(&self.input, &mut self.ball, &self.launch);
        self.input.begin_frame();

        let instances = self.scene.resolve(&mut self.ball, dt);
        let camera = CameraView::from_camera(&self.camera, self.gpu.aspect());

        match self.renderer.begin_frame(&self.gpu) {
            Ok(mut frame) => {
                render_frame(&mut frame, &mut self.order, &self.light, &camera, &instances);
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring and dropping this frame");
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(Error::OutOfMemory),
            Err(err) => warn!("dropped frame: {err}"),
        }
        Ok(())
    }
}

/// Hide the cursor and lock it to the window for mouse look.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        warn!("could not grab cursor, mouse look may drift: {err}");
    }
    window.set_cursor_visible(false);
}

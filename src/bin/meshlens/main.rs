//! Interactive viewer for meshlens.
//!
//! Usage: meshlens <MESH>
//!
//! Controls:
//! - Left mouse drag: Rotate camera
//! - Scroll wheel: Zoom in/out
//! - K: Gaussian curvature
//! - N: Vertex normals
//! - P: LSCM parameterization
//! - G: Geodesic distance from the source vertex
//! - Up/Down or +/-: Change the source vertex
//! - Tab: Cycle the displayed quantity
//! - V: Toggle normal vectors
//! - W: Toggle wireframe mode
//! - R: Reset camera
//! - Escape: Quit

mod camera;
mod mesh_gpu;
mod renderer;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use camera::OrbitCamera;
use mesh_gpu::GpuMesh;
use renderer::Renderer;

use meshlens::demo::{Action, Demo, MESH_NAME};

const CONTROLS: &str = "\
Controls:
  Left mouse drag   Rotate camera
  Scroll wheel      Zoom in/out
  K                 Gaussian curvature
  N                 Vertex normals
  P                 LSCM parameterization
  G                 Geodesic distance from the source vertex
  Up/Down, +/-      Change the source vertex
  Tab               Cycle the displayed quantity
  V                 Toggle normal vectors
  W                 Toggle wireframe
  R                 Reset camera
  Escape            Quit";

/// Look at a triangle mesh through curvature, normals, a conformal map and geodesic distance.
#[derive(Parser, Debug)]
#[command(name = "meshlens", version, after_help = CONTROLS)]
struct Cli {
    /// Mesh file to load (OBJ, STL or PLY)
    mesh: PathBuf,
}

/// Exit status for a failed argument parse. Help and version are not failures.
fn parse_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// User input that changes what is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run(Action),
    StepSource(i64),
    CycleQuantity,
    ToggleVectors,
    ToggleWireframe,
    ResetCamera,
    Quit,
}

fn command_for_key(key: &Key) -> Option<Command> {
    match key {
        Key::Named(NamedKey::Escape) => Some(Command::Quit),
        Key::Named(NamedKey::ArrowUp) => Some(Command::StepSource(1)),
        Key::Named(NamedKey::ArrowDown) => Some(Command::StepSource(-1)),
        Key::Named(NamedKey::Tab) => Some(Command::CycleQuantity),
        Key::Character(c) => match c.to_lowercase().as_str() {
            "k" => Some(Command::Run(Action::Curvature)),
            "n" => Some(Command::Run(Action::Normals)),
            "p" => Some(Command::Run(Action::Parameterization)),
            "g" => Some(Command::Run(Action::Distance)),
            "+" | "=" => Some(Command::StepSource(1)),
            "-" => Some(Command::StepSource(-1)),
            "v" => Some(Command::ToggleVectors),
            "w" => Some(Command::ToggleWireframe),
            "r" => Some(Command::ResetCamera),
            _ => None,
        },
        _ => None,
    }
}

/// Window title summarizing the viewer state.
fn window_title(demo: &Demo) -> String {
    let showing = demo
        .surface_mesh()
        .and_then(|m| m.enabled_color_quantity())
        .map_or("surface", |q| q.name());
    let mut title = format!(
        "meshlens | source vertex {} | showing {}",
        demo.source_vertex(),
        showing
    );
    if let Some(message) = demo.scene().last_message() {
        title.push_str(" | ");
        title.push_str(message);
    }
    title
}

/// Application state.
struct App {
    demo: Demo,
    /// The window (created after resume).
    window: Option<Arc<Window>>,
    /// The renderer (created after window).
    renderer: Option<Renderer>,
    gpu_mesh: Option<GpuMesh>,
    /// Surface mesh revision that `gpu_mesh` was built from.
    uploaded_revision: Option<u64>,
    camera: OrbitCamera,
    wireframe: bool,
    mouse_pressed: bool,
    last_mouse_pos: Option<PhysicalPosition<f64>>,
}

impl App {
    fn new(demo: Demo) -> Self {
        Self {
            demo,
            window: None,
            renderer: None,
            gpu_mesh: None,
            uploaded_revision: None,
            camera: OrbitCamera::default(),
            wireframe: false,
            mouse_pressed: false,
            last_mouse_pos: None,
        }
    }

    fn request_redraw(&self) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn reset_camera(&mut self) {
        if let Some(ref gpu_mesh) = self.gpu_mesh {
            self.camera.fit(gpu_mesh.center, gpu_mesh.radius);
        }
    }

    /// Rebuild GPU buffers if the scene changed since the last upload.
    fn sync_gpu_mesh(&mut self) {
        let (Some(renderer), Some(mesh)) = (&self.renderer, self.demo.surface_mesh()) else {
            return;
        };
        if self.uploaded_revision == Some(mesh.revision()) && self.gpu_mesh.is_some() {
            return;
        }

        let first_upload = self.gpu_mesh.is_none();
        self.gpu_mesh = Some(GpuMesh::from_surface_mesh(renderer.device(), mesh));
        self.uploaded_revision = Some(mesh.revision());
        if first_upload {
            self.reset_camera();
        }
    }

    fn execute(&mut self, command: Command, event_loop: &ActiveEventLoop) {
        match command {
            Command::Quit => event_loop.exit(),
            Command::Run(action) => {
                if let Err(e) = self.demo.run(action) {
                    log::error!("{:?} failed: {}", action, e);
                    self.demo
                        .scene_mut()
                        .warning(format!("{:?} failed: {}", action, e));
                }
            }
            Command::StepSource(delta) => {
                let source = self.demo.step_source_vertex(delta);
                log::info!("source vertex: {}", source);
            }
            Command::CycleQuantity => {
                if let Some(mesh) = self.demo.scene_mut().get_surface_mesh_mut(MESH_NAME) {
                    let shown = mesh.cycle_enabled_color_quantity().unwrap_or("surface");
                    log::info!("showing {}", shown);
                }
            }
            Command::ToggleVectors => {
                if let Some(mesh) = self.demo.scene_mut().get_surface_mesh_mut(MESH_NAME) {
                    let shown = mesh.toggle_vector_quantities();
                    log::info!("vectors: {}", if shown { "ON" } else { "OFF" });
                }
            }
            Command::ToggleWireframe => {
                self.wireframe = !self.wireframe;
                log::info!("wireframe: {}", if self.wireframe { "ON" } else { "OFF" });
            }
            Command::ResetCamera => {
                self.reset_camera();
                log::info!("camera reset");
            }
        }

        self.sync_gpu_mesh();
        if let Some(ref window) = self.window {
            window.set_title(&window_title(&self.demo));
        }
        self.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(window_title(&self.demo))
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 1024));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window);
        self.sync_gpu_mesh();
        self.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(ref mut renderer) = self.renderer {
                    renderer.resize(new_size);
                }
                self.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let Some(command) = command_for_key(&event.logical_key) {
                        self.execute(command, event_loop);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some(last_pos) = self.last_mouse_pos {
                        let dx = position.x - last_pos.x;
                        let dy = position.y - last_pos.y;

                        let sensitivity = 0.005;
                        self.camera
                            .rotate(-dx as f32 * sensitivity, dy as f32 * sensitivity);
                        self.request_redraw();
                    }
                    self.last_mouse_pos = Some(position);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.camera.zoom(1.0 - scroll * 0.1);
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                if let (Some(ref mut renderer), Some(ref gpu_mesh)) =
                    (&mut self.renderer, &self.gpu_mesh)
                {
                    match renderer.render(gpu_mesh, &self.camera, self.wireframe) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            if let Some(ref window) = self.window {
                                renderer.resize(window.inner_size());
                            }
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("out of memory");
                            event_loop.exit();
                        }
                        Err(e) => {
                            log::error!("render error: {:?}", e);
                        }
                    }
                }
            }

            _ => {}
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap renders the error together with the usage line
            let code = parse_exit_code(&e);
            let _ = e.print();
            std::process::exit(code);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let demo = match Demo::load(&cli.mesh) {
        Ok(demo) => demo,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            eprintln!("Error: failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(demo);
    if let Err(e) = event_loop.run_app(&mut app) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_single_mesh_argument() {
        let cli = Cli::try_parse_from(["meshlens", "bunny.obj"]).unwrap();
        assert_eq!(cli.mesh, PathBuf::from("bunny.obj"));
    }

    #[test]
    fn test_parse_errors_exit_with_one() {
        for args in [
            vec!["meshlens"],
            vec!["meshlens", "a.obj", "b.obj"],
            vec!["meshlens", "--bogus", "a.obj"],
        ] {
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(parse_exit_code(&err), 1);
            assert!(err.render().to_string().contains("Usage:"));
        }
    }

    #[test]
    fn test_help_exits_with_zero() {
        let err = Cli::try_parse_from(["meshlens", "--help"]).unwrap_err();
        assert_eq!(parse_exit_code(&err), 0);
        assert!(err.render().to_string().contains("Controls:"));
    }

    #[test]
    fn test_key_bindings() {
        let key = |s: &str| Key::Character(s.into());
        assert_eq!(
            command_for_key(&key("K")),
            Some(Command::Run(Action::Curvature))
        );
        assert_eq!(
            command_for_key(&key("g")),
            Some(Command::Run(Action::Distance))
        );
        assert_eq!(command_for_key(&key("-")), Some(Command::StepSource(-1)));
        assert_eq!(
            command_for_key(&Key::Named(NamedKey::ArrowUp)),
            Some(Command::StepSource(1))
        );
        assert_eq!(command_for_key(&key("x")), None);
    }

    #[test]
    fn test_title_reports_state() {
        let vertices = vec![
            nalgebra::Point3::new(0.0, 0.0, 0.0),
            nalgebra::Point3::new(1.0, 0.0, 0.0),
            nalgebra::Point3::new(0.5, 1.0, 0.0),
            nalgebra::Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mesh = meshlens::mesh::build_from_triangles(&vertices, &faces).unwrap();
        let mut demo = Demo::from_mesh(mesh);

        assert_eq!(window_title(&demo), "meshlens | source vertex 7 | showing surface");

        demo.run(Action::Parameterization).unwrap();
        demo.run(Action::Curvature).unwrap();
        let title = window_title(&demo);
        assert!(title.contains("showing gaussian curvature"));
        assert!(title.ends_with("mesh has no boundary, cannot parameterize"));
    }
}

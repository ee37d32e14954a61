//! `scene-viewer <model.obj|model.gltf>`: imports a scene and spins it around the y axis.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use anyhow::Context as _;
use cgmath::{Deg, Matrix4, Point3, Rotation3, Vector3};
use scene_import::{Instance, Model, ModelShader, data_structures::texture::Texture};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

// wgpu's clip space has z in [0, 1], cgmath builds OpenGL's [-1, 1]
#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

struct Viewer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: Texture,
    shader: ModelShader,
    model: Model,
    started: Instant,
}

impl Viewer {
    async fn new(window: Arc<Window>, model_path: &Path) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("viewer device"),
                ..Default::default()
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // the shader writes linear colour, so prefer an sRGB surface
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface supports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );
        let shader = ModelShader::new(&device, &queue, format, Some(Texture::DEPTH_FORMAT));
        let model = scene_import::load_model(model_path, &device, &queue)?;
        log::info!(
            "{} meshes, {} textures from {}",
            model.meshes().len(),
            model.textures().len(),
            model.directory().display()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            shader,
            model,
            started: Instant::now(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    fn update(&self) -> anyhow::Result<()> {
        let angle = Deg(self.started.elapsed().as_secs_f32() * 45.0);
        let spin = Instance {
            rotation: cgmath::Quaternion::from_angle_y(angle),
            ..Instance::new()
        };
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 1.5, 4.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let aspect = self.config.width as f32 / self.config.height as f32;
        let projection = OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(45.0), aspect, 0.1, 100.0);

        self.shader.set_matrix4(&self.queue, "model", spin.to_matrix())?;
        self.shader.set_matrix4(&self.queue, "view", view)?;
        self.shader.set_matrix4(&self.queue, "projection", projection)?;
        Ok(())
    }

    fn render(&self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.2,
                            b: 0.3,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.shader.bind(&mut render_pass);
            self.model.draw(&mut render_pass, &self.shader);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

struct App {
    model_path: PathBuf,
    viewer: Option<Viewer>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        let attributes = Window::default_attributes().with_title("scene viewer");
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not open a window: {e}");
                event_loop.exit();
                return;
            }
        };
        match futures::executor::block_on(Viewer::new(window, &self.model_path)) {
            Ok(viewer) => {
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(e) => {
                log::error!("{e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => viewer.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if let Err(e) = viewer.update() {
                    log::error!("{e:#}");
                }
                match viewer.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = viewer.window.inner_size();
                        viewer.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("Unable to render {e}"),
                }
                viewer.window.request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _: &ActiveEventLoop) {
        if let Some(viewer) = self.viewer.take() {
            viewer.model.release();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let model_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: scene-viewer <model.obj|model.gltf|model.glb>")?;

    let event_loop = EventLoop::new()?;
    let mut app = App {
        model_path,
        viewer: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use glam::Vec3;
use transylvania::{
    init_logging, AnimatedSprite, Camera2D, FrameAnimation, Light, LoggingConfig, Renderer,
    RendererConfig, Sprite, SpriteManager, Vec2,
};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Draw one animated, normal-mapped sprite", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "./sprites")]
    sprite_dir: PathBuf,
    #[arg(short, long, help = "Sprite directory name inside --sprite-dir")]
    name: String,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,
    #[arg(long, default_value_t = 0.15, help = "Seconds per animation frame")]
    frame_time: f32,
    #[arg(long)]
    no_vsync: bool,
}

struct Viewer {
    cli: Cli,
    sprites: SpriteManager,
    renderer: Option<Renderer<'static>>,
    window: Option<&'static Window>,
    actor: Option<AnimatedSprite>,
    camera: Camera2D,
    light: Light,
    last_frame: Instant,
}

impl Viewer {
    fn new(cli: Cli) -> Result<Self> {
        let mut sprites = SpriteManager::new(&cli.sprite_dir);
        sprites.load(&[cli.name.as_str()])?;
        log::info!(
            "loaded {} from {}",
            sprites.names().collect::<Vec<_>>().join(", "),
            sprites.sprite_dir().display()
        );

        Ok(Self {
            cli,
            sprites,
            renderer: None,
            window: None,
            actor: None,
            camera: Camera2D::default(),
            light: Light {
                position: Vec3::new(0.0, 0.0, 64.0),
                ..Light::default()
            }
            .with_color([1.0, 0.9, 0.7])
            .with_power(1.2),
            last_frame: Instant::now(),
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(format!("sprite viewer - {}", self.cli.name))
            .with_inner_size(LogicalSize::new(self.cli.width, self.cli.height));
        let window = event_loop.create_window(attributes)?;

        // Leak the window to get a 'static reference for the renderer's surface.
        let window: &'static Window = Box::leak(Box::new(window));

        let config = RendererConfig::default()
            .with_vsync(!self.cli.no_vsync)
            .with_clear_color([0.05, 0.05, 0.08, 1.0]);
        let renderer = Renderer::new(window, config)?;

        let sheet = self
            .sprites
            .get_sprite(&self.cli.name)
            .ok_or_else(|| anyhow::anyhow!("sprite {} not loaded", self.cli.name))?;
        let (w, h) = renderer.surface_size();
        let frame = *sheet.frame();
        let position = Vec2::new(
            (w as f32 - frame.width()) * 0.5,
            (h as f32 - frame.height()) * 0.5,
        );
        self.actor = Some(
            AnimatedSprite::new(
                &self.cli.name,
                frame,
                FrameAnimation::from_frames(&frame, self.cli.frame_time),
            )
            .with_position(position),
        );

        self.renderer = Some(renderer);
        self.window = Some(window);
        window.request_redraw();
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let (Some(renderer), Some(actor)) = (self.renderer.as_mut(), self.actor.as_mut()) else {
            return Ok(());
        };

        let now = Instant::now();
        actor.update((now - self.last_frame).as_secs_f32());
        self.last_frame = now;

        let Some(sheet) = self.sprites.get_sprite(&actor.sheet) else {
            return Ok(());
        };

        let (w, h) = renderer.surface_size();
        let params = actor.draw_params(
            self.camera.projection(w, h),
            self.camera.view(),
            Some(self.light),
        );

        let mut frame = renderer.begin_frame()?;
        renderer.draw_sprite(&mut frame, sheet, &params)?;
        renderer.end_frame(frame)
    }

    fn move_light(&mut self, x: f64, y: f64) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let (w, h) = renderer.surface_size();
        let world = self
            .camera
            .screen_to_world(Vec2::new(x as f32, y as f32), w, h);
        self.light.position = Vec3::new(world.x, world.y, self.light.position.z);
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            log::error!("failed to start viewer: {err:?}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.move_light(position.x, position.y),
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.draw() {
                    log::error!("draw failed: {err:?}");
                    event_loop.exit();
                    return;
                }
                if let Some(window) = self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let cli = Cli::parse();

    let mut viewer = Viewer::new(cli)?;
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut viewer)?;
    Ok(())
}

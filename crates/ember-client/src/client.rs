// client.rs — the client instance and its fixed-timestep run loop.
//
// The winit event loop (ControlFlow::Poll) drives frames from
// about_to_wait. Each frame banks elapsed wall-clock time, drains whole
// simulation ticks from the accumulator, then renders once with the
// leftover fraction as the interpolation factor.

use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::config::ClientConfig;
use crate::game::Simulation;
use crate::timing::FixedTimestep;
use crate::vulkan::VkRenderer;
use crate::window;

pub struct ClientInstance {
    config: ClientConfig,
    window: Option<Window>,
    renderer: Option<VkRenderer>,
    sim: Simulation,
    timestep: FixedTimestep,
    previous_frame: Option<Instant>,
    stats: FrameStats,
    fatal_error: Option<String>,
}

impl ClientInstance {
    pub fn new(config: ClientConfig) -> Self {
        let timestep = FixedTimestep::new(
            config.timing.tick_rate,
            config.timing.max_ticks_per_frame,
        );

        Self {
            config,
            window: None,
            renderer: None,
            sim: Simulation::new(),
            timestep,
            previous_frame: None,
            stats: FrameStats::new(),
            fatal_error: None,
        }
    }

    /// Run until the window closes or a stage of the bootstrap fails.
    pub fn run(&mut self) -> Result<(), String> {
        let event_loop =
            EventLoop::new().map_err(|e| format!("Failed to create event loop: {}", e))?;

        event_loop
            .run_app(self)
            .map_err(|e| format!("Event loop error: {}", e))?;

        if let Some(error) = self.fatal_error.take() {
            return Err(error);
        }

        log::info!(
            "Client shut down after {} ticks, {} frames",
            self.sim.tick_count(),
            self.renderer
                .as_ref()
                .map(|r| r.frames_rendered())
                .unwrap_or(0)
        );
        Ok(())
    }

    /// One pass of the accumulator loop: bank time, drain ticks, render
    /// with the leftover fraction.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if let Some(previous) = self.previous_frame {
            self.timestep.advance(now - previous);
        }
        self.previous_frame = Some(now);

        let ticks = self.timestep.drain_ticks();
        for _ in 0..ticks {
            self.sim.tick();
        }

        let alpha = self.timestep.alpha();
        let snapshot = self.sim.snapshot(alpha);

        if let Some(renderer) = self.renderer.as_mut() {
            if let Err(e) = renderer.frame(&snapshot, alpha) {
                self.fail(event_loop, format!("Frame failed: {}", e));
                return;
            }
        }

        self.stats.record(ticks);
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: String) {
        log::error!("{}", error);
        self.fatal_error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for ClientInstance {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        event_loop.set_control_flow(ControlFlow::Poll);

        let window = match window::create_window(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, e),
        };

        match VkRenderer::new(&window, &self.config.graphics) {
            Ok(renderer) => {
                log::info!("Renderer ready on {}", renderer.device_name());
                self.renderer = Some(renderer);
            }
            Err(e) => return self.fail(event_loop, format!("Vulkan bootstrap failed: {}", e)),
        }

        self.window = Some(window);
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

            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    if let Err(e) = renderer.handle_resize(size.width, size.height) {
                        self.fail(event_loop, format!("Swapchain recreation failed: {}", e));
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    event_loop.exit();
                }
            }

            WindowEvent::Focused(focused) => {
                log::debug!("Window focus: {}", focused);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.fatal_error.is_some() || self.window.is_none() {
            return;
        }
        self.frame(event_loop);
    }
}

/// Once-per-second tick/frame counters for the stats log line.
struct FrameStats {
    window_start: Option<Instant>,
    frames: u32,
    ticks: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            window_start: None,
            frames: 0,
            ticks: 0,
        }
    }

    fn record(&mut self, ticks: u32) {
        let now = Instant::now();
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        self.ticks += ticks;

        let elapsed = now - start;
        if elapsed >= Duration::from_secs(1) {
            let seconds = elapsed.as_secs_f64();
            log::debug!(
                "{:.0} fps, {:.1} tps",
                f64::from(self.frames) / seconds,
                f64::from(self.ticks) / seconds
            );
            self.window_start = Some(now);
            self.frames = 0;
            self.ticks = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_instance_starts_cold() {
        let client = ClientInstance::new(ClientConfig::default());
        assert_eq!(client.sim.tick_count(), 0);
        assert!(client.window.is_none());
        assert!(client.renderer.is_none());
        assert!(client.fatal_error.is_none());
    }

    #[test]
    fn timestep_follows_config() {
        let mut config = ClientConfig::default();
        config.timing.tick_rate = 50;
        let client = ClientInstance::new(config);
        assert_eq!(client.timestep.tick_interval(), Duration::from_millis(20));
    }
}

//! Renderer bootstrap: owns the full Vulkan object chain.
//!
//! Objects are created strictly in dependency order (instance, surface,
//! device, swapchain, image views, render pass, pipeline, framebuffers,
//! command pool) and destroyed in reverse. A failure at any stage aborts
//! the client: the caller writes a crash report and exits, so partially
//! built chains are not unwound individually.

use std::path::Path;

use ash::vk;
use raw_window_handle::HasDisplayHandle;
use winit::window::Window;

use ember_common::files;

use crate::config::GraphicsConfig;
use crate::game::EntityState;

use super::commands::FrameCommands;
use super::context::{VulkanDevice, VulkanInstance};
use super::pipeline::{self, RenderPipeline};
use super::surface::{SurfaceConfig, VulkanSurface};
use super::swapchain::Swapchain;

pub struct VkRenderer {
    instance: VulkanInstance,
    surface: VulkanSurface,
    device: VulkanDevice,
    surface_config: SurfaceConfig,
    swapchain: Swapchain,
    pipeline: RenderPipeline,
    framebuffers: Vec<vk::Framebuffer>,
    commands: FrameCommands,

    // Kept so the pipeline can be rebuilt after a resize
    vert_spv: Vec<u8>,
    frag_spv: Vec<u8>,

    /// Set while the window has zero area (minimized).
    suspended: bool,
    frames: u64,
}

impl VkRenderer {
    pub fn new(window: &Window, config: &GraphicsConfig) -> Result<Self, String> {
        let (vert_spv, frag_spv) = load_shaders(&config.shader_dir)?;
        let size = window.inner_size();

        unsafe {
            let display_handle = window
                .display_handle()
                .map_err(|e| format!("Failed to get display handle: {:?}", e))?
                .as_raw();

            let instance = VulkanInstance::new(display_handle, config.validation)?;
            let surface = VulkanSurface::new(&instance, window)?;
            let device = VulkanDevice::new(&instance, &surface)?;
            let surface_config = SurfaceConfig::query(&surface, device.physical, config.vsync)?;
            let swapchain = Swapchain::new(
                &device,
                &surface,
                &surface_config,
                size.width,
                size.height,
                None,
            )?;
            let pipeline = RenderPipeline::new(
                &device,
                swapchain.format,
                swapchain.extent,
                &vert_spv,
                &frag_spv,
            )?;
            let framebuffers = pipeline::create_framebuffers(
                &device,
                pipeline.render_pass,
                &swapchain.image_views,
                swapchain.extent,
            )?;
            let commands = FrameCommands::new(&device, swapchain.images.len() as u32)?;

            log::info!(
                "Vulkan bootstrap complete: {} swapchain images at {}x{}, {:?}",
                swapchain.images.len(),
                swapchain.extent.width,
                swapchain.extent.height,
                surface_config.present_mode
            );

            Ok(Self {
                instance,
                surface,
                device,
                surface_config,
                swapchain,
                pipeline,
                framebuffers,
                commands,
                vert_spv,
                frag_spv,
                suspended: false,
                frames: 0,
            })
        }
    }

    pub fn device_name(&self) -> String {
        self.device.device_name()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Per-frame hook for the client loop.
    ///
    /// The bootstrap stops at resource creation; nothing is recorded or
    /// submitted, so a frame only accounts statistics. The interpolated
    /// snapshot is what a recording step would turn into push constants.
    pub fn frame(&mut self, _snapshot: &EntityState, _alpha: f32) -> Result<(), String> {
        if self.suspended {
            return Ok(());
        }
        self.frames += 1;
        Ok(())
    }

    /// Rebuild everything derived from the window size.
    pub fn handle_resize(&mut self, width: u32, height: u32) -> Result<(), String> {
        if width == 0 || height == 0 {
            // Minimized; nothing presentable until restored
            self.suspended = true;
            return Ok(());
        }
        self.suspended = false;

        unsafe {
            self.device.wait_idle();

            self.commands.destroy(&self.device);
            for framebuffer in self.framebuffers.drain(..) {
                self.device.handle.destroy_framebuffer(framebuffer, None);
            }
            self.pipeline.destroy(&self.device);

            self.surface_config
                .refresh(&self.surface, self.device.physical)?;
            self.swapchain.recreate(
                &self.device,
                &self.surface,
                &self.surface_config,
                width,
                height,
            )?;

            self.pipeline = RenderPipeline::new(
                &self.device,
                self.swapchain.format,
                self.swapchain.extent,
                &self.vert_spv,
                &self.frag_spv,
            )?;
            self.framebuffers = pipeline::create_framebuffers(
                &self.device,
                self.pipeline.render_pass,
                &self.swapchain.image_views,
                self.swapchain.extent,
            )?;
            self.commands = FrameCommands::new(&self.device, self.swapchain.images.len() as u32)?;
        }

        log::debug!(
            "Recreated swapchain chain at {}x{}",
            self.swapchain.extent.width,
            self.swapchain.extent.height
        );
        Ok(())
    }
}

impl Drop for VkRenderer {
    fn drop(&mut self) {
        unsafe {
            self.device.wait_idle();

            self.commands.destroy(&self.device);
            for framebuffer in self.framebuffers.drain(..) {
                self.device.handle.destroy_framebuffer(framebuffer, None);
            }
            self.pipeline.destroy(&self.device);
            self.swapchain.destroy(&self.device);
            self.surface.destroy();
            self.device.destroy();
            self.instance.destroy();
        }
    }
}

/// Load the compiled vertex and fragment shader binaries.
fn load_shaders(shader_dir: &str) -> Result<(Vec<u8>, Vec<u8>), String> {
    let load = |name: &str| -> Result<Vec<u8>, String> {
        let path = Path::new(shader_dir).join(name);
        files::load_file(&path).ok_or_else(|| {
            format!(
                "Missing shader binary {} (compile the GLSL sources in {} with glslc)",
                path.display(),
                shader_dir
            )
        })
    };

    Ok((load("basic.vert.spv")?, load("basic.frag.spv")?))
}

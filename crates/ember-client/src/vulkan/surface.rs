//! Vulkan surface: stage two of the bootstrap.
//!
//! The surface handle is created right after the instance, but its format,
//! present mode, and capabilities can only be chosen once a physical device
//! exists, so that configuration lives in [`SurfaceConfig`].

use ash::khr::surface;
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

use super::context::VulkanInstance;

/// The surface handle plus its loader.
pub struct VulkanSurface {
    pub loader: surface::Instance,
    pub handle: vk::SurfaceKHR,
}

impl VulkanSurface {
    /// Create a surface for a winit window.
    ///
    /// # Safety
    /// The window must outlive the surface.
    pub unsafe fn new(instance: &VulkanInstance, window: &Window) -> Result<Self, String> {
        let display_handle = window
            .display_handle()
            .map_err(|e| format!("Failed to get display handle: {:?}", e))?
            .as_raw();
        let window_handle = window
            .window_handle()
            .map_err(|e| format!("Failed to get window handle: {:?}", e))?
            .as_raw();

        let handle = ash_window::create_surface(
            &instance.entry,
            &instance.handle,
            display_handle,
            window_handle,
            None,
        )
        .map_err(|e| format!("Failed to create Vulkan surface: {:?}", e))?;

        let loader = surface::Instance::new(&instance.entry, &instance.handle);

        Ok(Self { loader, handle })
    }

    pub unsafe fn destroy(&mut self) {
        self.loader.destroy_surface(self.handle, None);
        self.handle = vk::SurfaceKHR::null();
    }
}

/// Presentation parameters negotiated between surface and device.
pub struct SurfaceConfig {
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
}

impl SurfaceConfig {
    /// Query the surface against a physical device and pick presentation
    /// parameters.
    pub unsafe fn query(
        vk_surface: &VulkanSurface,
        physical: vk::PhysicalDevice,
        vsync: bool,
    ) -> Result<Self, String> {
        let capabilities = vk_surface
            .loader
            .get_physical_device_surface_capabilities(physical, vk_surface.handle)
            .map_err(|e| format!("Failed to get surface capabilities: {:?}", e))?;

        let formats = vk_surface
            .loader
            .get_physical_device_surface_formats(physical, vk_surface.handle)
            .map_err(|e| format!("Failed to get surface formats: {:?}", e))?;

        let present_modes = vk_surface
            .loader
            .get_physical_device_surface_present_modes(physical, vk_surface.handle)
            .map_err(|e| format!("Failed to get present modes: {:?}", e))?;

        Ok(Self {
            format: choose_surface_format(&formats),
            present_mode: choose_present_mode(&present_modes, vsync),
            capabilities,
        })
    }

    /// Refresh capabilities after a window resize.
    pub unsafe fn refresh(
        &mut self,
        vk_surface: &VulkanSurface,
        physical: vk::PhysicalDevice,
    ) -> Result<(), String> {
        self.capabilities = vk_surface
            .loader
            .get_physical_device_surface_capabilities(physical, vk_surface.handle)
            .map_err(|e| format!("Failed to refresh surface capabilities: {:?}", e))?;
        Ok(())
    }

    /// The extent to use, clamped to surface capabilities.
    pub fn clamp_extent(&self, desired_width: u32, desired_height: u32) -> vk::Extent2D {
        clamp_extent(&self.capabilities, desired_width, desired_height)
    }
}

/// Choose the best surface format, preferring SRGB B8G8R8A8.
pub(crate) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    for format in formats {
        if format.format == vk::Format::B8G8R8A8_SRGB
            && format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        {
            return *format;
        }
    }

    for format in formats {
        if format.format == vk::Format::B8G8R8A8_UNORM {
            return *format;
        }
    }

    formats.first().copied().unwrap_or(vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    })
}

/// Choose the best present mode. FIFO is the only mode guaranteed to be
/// available.
pub(crate) fn choose_present_mode(
    modes: &[vk::PresentModeKHR],
    vsync: bool,
) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }

    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        return vk::PresentModeKHR::MAILBOX;
    }

    if modes.contains(&vk::PresentModeKHR::IMMEDIATE) {
        return vk::PresentModeKHR::IMMEDIATE;
    }

    vk::PresentModeKHR::FIFO
}

/// Clamp a desired extent to what the surface allows. A current extent of
/// u32::MAX means the window manager lets the application decide.
pub(crate) fn clamp_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    desired_width: u32,
    desired_height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: desired_width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: desired_height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    #[test]
    fn format_prefers_srgb() {
        let formats = [
            fmt(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            fmt(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::B8G8R8A8_SRGB
        );
    }

    #[test]
    fn format_falls_back_to_unorm_then_first() {
        let formats = [
            fmt(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            fmt(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::B8G8R8A8_UNORM
        );

        let formats = [fmt(
            vk::Format::R16G16B16A16_SFLOAT,
            vk::ColorSpaceKHR::SRGB_NONLINEAR,
        )];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::R16G16B16A16_SFLOAT
        );
    }

    #[test]
    fn present_mode_vsync_is_fifo() {
        let modes = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn present_mode_uncapped_prefers_mailbox() {
        let modes = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::MAILBOX,
        ];
        assert_eq!(
            choose_present_mode(&modes, false),
            vk::PresentModeKHR::MAILBOX
        );

        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(
            choose_present_mode(&modes, false),
            vk::PresentModeKHR::IMMEDIATE
        );

        let modes = [vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn extent_uses_surface_size_when_defined() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 800,
                height: 600,
            },
            ..Default::default()
        };
        let extent = clamp_extent(&caps, 1920, 1080);
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn extent_clamps_when_window_manager_defers() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 320,
                height: 240,
            },
            max_image_extent: vk::Extent2D {
                width: 1280,
                height: 720,
            },
            ..Default::default()
        };

        let extent = clamp_extent(&caps, 4096, 100);
        assert_eq!((extent.width, extent.height), (1280, 240));
    }
}

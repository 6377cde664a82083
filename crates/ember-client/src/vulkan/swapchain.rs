//! Swapchain and image views: stages four and five of the bootstrap.

use ash::vk;

use super::context::VulkanDevice;
use super::surface::{SurfaceConfig, VulkanSurface};

/// The swapchain with one 2D color view per image.
pub struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

impl Swapchain {
    pub unsafe fn new(
        device: &VulkanDevice,
        vk_surface: &VulkanSurface,
        config: &SurfaceConfig,
        width: u32,
        height: u32,
        old_swapchain: Option<vk::SwapchainKHR>,
    ) -> Result<Self, String> {
        let extent = config.clamp_extent(width, height);
        let image_count = desired_image_count(&config.capabilities);

        // Concurrent sharing only when graphics and present are distinct
        // families
        let graphics = device.queue_families.graphics.ok_or("No graphics queue family")?;
        let present = device.queue_families.present.ok_or("No present queue family")?;
        let family_indices = [graphics, present];
        let (sharing_mode, family_slice): (vk::SharingMode, &[u32]) = if graphics != present {
            (vk::SharingMode::CONCURRENT, &family_indices)
        } else {
            (vk::SharingMode::EXCLUSIVE, &[])
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(vk_surface.handle)
            .min_image_count(image_count)
            .image_format(config.format.format)
            .image_color_space(config.format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(family_slice)
            .pre_transform(config.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain.unwrap_or(vk::SwapchainKHR::null()));

        let handle = device
            .swapchain_loader
            .create_swapchain(&create_info, None)
            .map_err(|e| format!("Failed to create swapchain: {:?}", e))?;

        if let Some(old) = old_swapchain {
            device.swapchain_loader.destroy_swapchain(old, None);
        }

        let images = device
            .swapchain_loader
            .get_swapchain_images(handle)
            .map_err(|e| format!("Failed to get swapchain images: {:?}", e))?;

        let image_views = Self::create_image_views(device, &images, config.format.format)?;

        Ok(Self {
            handle,
            images,
            image_views,
            format: config.format.format,
            extent,
        })
    }

    /// One 2D color view per swapchain image.
    unsafe fn create_image_views(
        device: &VulkanDevice,
        images: &[vk::Image],
        format: vk::Format,
    ) -> Result<Vec<vk::ImageView>, String> {
        images
            .iter()
            .map(|&image| {
                let create_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(format)
                    .components(vk::ComponentMapping {
                        r: vk::ComponentSwizzle::IDENTITY,
                        g: vk::ComponentSwizzle::IDENTITY,
                        b: vk::ComponentSwizzle::IDENTITY,
                        a: vk::ComponentSwizzle::IDENTITY,
                    })
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });

                device
                    .handle
                    .create_image_view(&create_info, None)
                    .map_err(|e| format!("Failed to create image view: {:?}", e))
            })
            .collect()
    }

    /// Recreate after a resize, reusing the old swapchain as the base.
    pub unsafe fn recreate(
        &mut self,
        device: &VulkanDevice,
        vk_surface: &VulkanSurface,
        config: &SurfaceConfig,
        width: u32,
        height: u32,
    ) -> Result<(), String> {
        for view in &self.image_views {
            device.handle.destroy_image_view(*view, None);
        }
        self.image_views.clear();

        *self = Self::new(device, vk_surface, config, width, height, Some(self.handle))?;
        Ok(())
    }

    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        for view in &self.image_views {
            device.handle.destroy_image_view(*view, None);
        }
        self.image_views.clear();

        device.swapchain_loader.destroy_swapchain(self.handle, None);
        self.handle = vk::SwapchainKHR::null();
    }
}

/// Image count to request: one more than the minimum, clamped to the
/// maximum (zero meaning "no limit").
pub(crate) fn desired_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let max = if capabilities.max_image_count == 0 {
        u32::MAX
    } else {
        capabilities.max_image_count
    };
    (capabilities.min_image_count + 1).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            ..Default::default()
        }
    }

    #[test]
    fn image_count_is_min_plus_one() {
        assert_eq!(desired_image_count(&caps(2, 8)), 3);
    }

    #[test]
    fn image_count_unlimited_max() {
        assert_eq!(desired_image_count(&caps(2, 0)), 3);
    }

    #[test]
    fn image_count_clamped_to_max() {
        assert_eq!(desired_image_count(&caps(3, 3)), 3);
    }
}

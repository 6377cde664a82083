//! Vulkan bootstrap: the ordered object pipeline from instance to command
//! pool. Each stage depends on the one before it; the chain is assembled by
//! [`renderer::VkRenderer`] and torn down in reverse.

pub mod commands;
pub mod context;
pub mod pipeline;
pub mod renderer;
pub mod surface;
pub mod swapchain;

pub use context::{VulkanDevice, VulkanInstance};
pub use renderer::VkRenderer;
pub use surface::{SurfaceConfig, VulkanSurface};
pub use swapchain::Swapchain;

use ash::vk;
use std::ffi::CStr;

/// Check a Vulkan result, mapping failure to a readable error.
pub fn check_vk_result(result: vk::Result) -> Result<(), String> {
    if result == vk::Result::SUCCESS {
        Ok(())
    } else {
        Err(format!("Vulkan error: {:?}", result))
    }
}

/// Minimum instance version the bootstrap asks for.
pub const REQUIRED_VK_VERSION: u32 = vk::make_api_version(0, 1, 1, 0);

/// Application name for the Vulkan instance.
pub const APP_NAME: &CStr = c"Ember";

/// Engine name for the Vulkan instance.
pub const ENGINE_NAME: &CStr = c"Ember Engine";

/// Engine version.
pub const ENGINE_VERSION: u32 = vk::make_api_version(0, 0, 1, 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vk_result_mapping() {
        assert!(check_vk_result(vk::Result::SUCCESS).is_ok());
        let err = check_vk_result(vk::Result::ERROR_OUT_OF_DATE_KHR).unwrap_err();
        assert!(err.contains("ERROR_OUT_OF_DATE_KHR"));
    }
}

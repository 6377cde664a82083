//! Command pool and primary command buffers: the final bootstrap stage.
//!
//! Buffers are allocated but never recorded or submitted; the bootstrap
//! ends at resource creation.

use ash::vk;

use super::context::VulkanDevice;

/// Command pool on the graphics family with one primary buffer per
/// swapchain image.
pub struct FrameCommands {
    pub pool: vk::CommandPool,
    pub buffers: Vec<vk::CommandBuffer>,
}

impl FrameCommands {
    pub unsafe fn new(device: &VulkanDevice, image_count: u32) -> Result<Self, String> {
        let graphics_family = device
            .queue_families
            .graphics
            .ok_or("No graphics queue family")?;

        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(graphics_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = device
            .handle
            .create_command_pool(&pool_info, None)
            .map_err(|e| format!("Failed to create command pool: {:?}", e))?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(image_count);

        let buffers = match device.handle.allocate_command_buffers(&alloc_info) {
            Ok(buffers) => buffers,
            Err(e) => {
                device.handle.destroy_command_pool(pool, None);
                return Err(format!("Failed to allocate command buffers: {:?}", e));
            }
        };

        Ok(Self { pool, buffers })
    }

    /// Destroying the pool frees every buffer allocated from it.
    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        device.handle.destroy_command_pool(self.pool, None);
        self.pool = vk::CommandPool::null();
        self.buffers.clear();
    }
}

//! Vulkan instance and device: stages one and three of the bootstrap.
//!
//! The instance exists before the surface; the device can only be chosen
//! once a surface exists to test presentation support against, which is why
//! the two live in separate types instead of one constructor.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use ash::khr::swapchain;
use ash::{vk, Device, Entry, Instance};
use raw_window_handle::RawDisplayHandle;

use super::surface::VulkanSurface;
use super::{APP_NAME, ENGINE_NAME, ENGINE_VERSION, REQUIRED_VK_VERSION};

/// Queue family indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }
}

/// Stage one: the Vulkan instance, with optional validation.
pub struct VulkanInstance {
    pub entry: Entry,
    pub handle: Instance,
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    pub unsafe fn new(
        display_handle: RawDisplayHandle,
        enable_validation: bool,
    ) -> Result<Self, String> {
        let entry =
            Entry::load().map_err(|e| format!("Failed to load Vulkan library: {}", e))?;

        let api_version = match entry
            .try_enumerate_instance_version()
            .map_err(|e| format!("Failed to enumerate instance version: {:?}", e))?
        {
            Some(version) => version,
            None => vk::API_VERSION_1_0,
        };

        if api_version < REQUIRED_VK_VERSION {
            return Err(format!(
                "Vulkan 1.1 required, but only {}.{}.{} available",
                vk::api_version_major(api_version),
                vk::api_version_minor(api_version),
                vk::api_version_patch(api_version)
            ));
        }

        let app_info = vk::ApplicationInfo::default()
            .application_name(APP_NAME)
            .application_version(ENGINE_VERSION)
            .engine_name(ENGINE_NAME)
            .engine_version(ENGINE_VERSION)
            .api_version(REQUIRED_VK_VERSION);

        // Surface extensions for the windowing system, plus debug utils
        // when validating
        let mut extensions = ash_window::enumerate_required_extensions(display_handle)
            .map_err(|e| format!("Failed to get required extensions: {:?}", e))?
            .to_vec();

        if enable_validation {
            extensions.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        let layer_names: Vec<CString> = if enable_validation {
            vec![CString::new("VK_LAYER_KHRONOS_validation").unwrap()]
        } else {
            vec![]
        };
        let layer_name_ptrs: Vec<*const c_char> =
            layer_names.iter().map(|n| n.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_name_ptrs);

        let handle = entry
            .create_instance(&create_info, None)
            .map_err(|e| format!("Failed to create Vulkan instance: {:?}", e))?;

        let debug_utils = if enable_validation {
            Some(Self::setup_debug_messenger(&entry, &handle)?)
        } else {
            None
        };

        Ok(Self {
            entry,
            handle,
            debug_utils,
        })
    }

    unsafe fn setup_debug_messenger(
        entry: &Entry,
        instance: &Instance,
    ) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT), String> {
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let messenger = debug_utils
            .create_debug_utils_messenger(&create_info, None)
            .map_err(|e| format!("Failed to create debug messenger: {:?}", e))?;

        Ok((debug_utils, messenger))
    }

    pub unsafe fn destroy(&mut self) {
        if let Some((loader, messenger)) = self.debug_utils.take() {
            loader.destroy_debug_utils_messenger(messenger, None);
        }
        self.handle.destroy_instance(None);
    }
}

/// Stage three: physical device selection and the logical device.
pub struct VulkanDevice {
    pub physical: vk::PhysicalDevice,
    pub handle: Device,
    pub queue_families: QueueFamilyIndices,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    pub swapchain_loader: swapchain::Device,
    pub properties: vk::PhysicalDeviceProperties,
}

impl VulkanDevice {
    /// Pick the best GPU that can present to `surface` and open a logical
    /// device on it.
    pub unsafe fn new(
        instance: &VulkanInstance,
        vk_surface: &VulkanSurface,
    ) -> Result<Self, String> {
        let devices = instance
            .handle
            .enumerate_physical_devices()
            .map_err(|e| format!("Failed to enumerate physical devices: {:?}", e))?;

        if devices.is_empty() {
            return Err("No Vulkan-capable GPU found".to_string());
        }

        let mut scored: Vec<_> = devices
            .iter()
            .filter_map(|&device| {
                let score = Self::rate_device(instance, device, vk_surface);
                if score > 0 {
                    Some((device, score))
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let (physical, _) = *scored
            .first()
            .ok_or("No GPU supports graphics and presentation")?;

        let queue_families = Self::find_queue_families(instance, physical, vk_surface);
        let properties = instance.handle.get_physical_device_properties(physical);

        let name = CStr::from_ptr(properties.device_name.as_ptr()).to_string_lossy();
        log::info!("Selected GPU: {}", name);

        let (handle, graphics_queue, present_queue) =
            Self::create_logical_device(instance, physical, &queue_families)?;

        let swapchain_loader = swapchain::Device::new(&instance.handle, &handle);

        Ok(Self {
            physical,
            handle,
            queue_families,
            graphics_queue,
            present_queue,
            swapchain_loader,
            properties,
        })
    }

    /// Rate a physical device; zero means unusable.
    unsafe fn rate_device(
        instance: &VulkanInstance,
        device: vk::PhysicalDevice,
        vk_surface: &VulkanSurface,
    ) -> u32 {
        let queue_families = Self::find_queue_families(instance, device, vk_surface);
        if !queue_families.is_complete() {
            return 0;
        }

        if !Self::supports_swapchain(instance, device) {
            return 0;
        }

        let props = instance.handle.get_physical_device_properties(device);

        let mut score = 0u32;
        if props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
            score += 10000;
        } else if props.device_type == vk::PhysicalDeviceType::INTEGRATED_GPU {
            score += 1000;
        }

        // VRAM as a tiebreaker (MB of device-local heap)
        let memory_props = instance.handle.get_physical_device_memory_properties(device);
        for i in 0..memory_props.memory_heap_count as usize {
            let heap = memory_props.memory_heaps[i];
            if heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL) {
                score += (heap.size / (1024 * 1024)) as u32;
            }
        }

        score
    }

    unsafe fn supports_swapchain(instance: &VulkanInstance, device: vk::PhysicalDevice) -> bool {
        let extensions = match instance.handle.enumerate_device_extension_properties(device) {
            Ok(ext) => ext,
            Err(_) => return false,
        };

        extensions.iter().any(|e| {
            let name = CStr::from_ptr(e.extension_name.as_ptr());
            name == swapchain::NAME
        })
    }

    unsafe fn find_queue_families(
        instance: &VulkanInstance,
        device: vk::PhysicalDevice,
        vk_surface: &VulkanSurface,
    ) -> QueueFamilyIndices {
        let queue_families = instance
            .handle
            .get_physical_device_queue_family_properties(device);

        let mut indices = QueueFamilyIndices::default();

        for (i, family) in queue_families.iter().enumerate() {
            let i = i as u32;

            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && indices.graphics.is_none()
            {
                indices.graphics = Some(i);
            }

            let present_support = vk_surface
                .loader
                .get_physical_device_surface_support(device, i, vk_surface.handle)
                .unwrap_or(false);
            if present_support && indices.present.is_none() {
                indices.present = Some(i);
            }
        }

        indices
    }

    unsafe fn create_logical_device(
        instance: &VulkanInstance,
        physical: vk::PhysicalDevice,
        queue_families: &QueueFamilyIndices,
    ) -> Result<(Device, vk::Queue, vk::Queue), String> {
        let graphics_family = queue_families.graphics.ok_or("No graphics queue family")?;
        let present_family = queue_families.present.ok_or("No present queue family")?;

        let mut unique_families = vec![graphics_family];
        if !unique_families.contains(&present_family) {
            unique_families.push(present_family);
        }

        let queue_priorities = [1.0f32];
        let queue_create_infos: Vec<_> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        let extensions: Vec<*const c_char> = vec![swapchain::NAME.as_ptr()];

        let features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let device = instance
            .handle
            .create_device(physical, &create_info, None)
            .map_err(|e| format!("Failed to create logical device: {:?}", e))?;

        let graphics_queue = device.get_device_queue(graphics_family, 0);
        let present_queue = device.get_device_queue(present_family, 0);

        Ok((device, graphics_queue, present_queue))
    }

    /// Device name as reported by the driver.
    pub fn device_name(&self) -> String {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_string_lossy()
                .into_owned()
        }
    }

    /// Wait for all device operations to complete.
    pub fn wait_idle(&self) {
        unsafe {
            let _ = self.handle.device_wait_idle();
        }
    }

    pub unsafe fn destroy(&mut self) {
        self.handle.destroy_device(None);
    }
}

/// Debug callback for validation layers, routed into the engine log.
unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _ty: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*data).p_message).to_string_lossy();

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[vulkan] {}", message);
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::warn!("[vulkan] {}", message);
    }

    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_indices_completeness() {
        let mut indices = QueueFamilyIndices::default();
        assert!(!indices.is_complete());

        indices.graphics = Some(0);
        assert!(!indices.is_complete());

        indices.present = Some(0);
        assert!(indices.is_complete());
    }
}

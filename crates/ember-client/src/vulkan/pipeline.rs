//! Render pass, graphics pipeline, and framebuffers: stages six and seven
//! of the bootstrap, plus the per-image framebuffers that close the chain.
//!
//! The render pass targets a single color attachment; there is no depth
//! attachment because a depth image would need device memory, and the
//! bootstrap allocates none.

use ash::vk;
use bytemuck::{Pod, Zeroable};

use super::context::VulkanDevice;

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Push constants consumed by the vertex stage: two column-major 4x4
/// matrices (model-view-projection and model).
pub const PUSH_CONSTANT_SIZE: u32 = 128;

/// Vertex layout the pipeline is declared against.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription::default()
            .binding(0)
            .stride(std::mem::size_of::<Vertex>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        [
            vk::VertexInputAttributeDescription::default()
                .binding(0)
                .location(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(0),
            vk::VertexInputAttributeDescription::default()
                .binding(0)
                .location(1)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(12),
        ]
    }
}

/// Reinterpret SPIR-V bytes as words, validating length and magic number.
pub fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>, String> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(format!(
            "SPIR-V binary has invalid length {} (must be a non-zero multiple of 4)",
            bytes.len()
        ));
    }

    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    if words[0] != SPIRV_MAGIC {
        return Err("Not a SPIR-V binary (bad magic number)".to_string());
    }

    Ok(words)
}

unsafe fn create_shader_module(
    device: &VulkanDevice,
    bytes: &[u8],
) -> Result<vk::ShaderModule, String> {
    let words = spirv_words(bytes)?;
    let create_info = vk::ShaderModuleCreateInfo::default().code(&words);

    device
        .handle
        .create_shader_module(&create_info, None)
        .map_err(|e| format!("Failed to create shader module: {:?}", e))
}

/// Render pass, pipeline layout, and the graphics pipeline itself.
pub struct RenderPipeline {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub handle: vk::Pipeline,
}

impl RenderPipeline {
    pub unsafe fn new(
        device: &VulkanDevice,
        color_format: vk::Format,
        extent: vk::Extent2D,
        vert_spv: &[u8],
        frag_spv: &[u8],
    ) -> Result<Self, String> {
        let render_pass = create_render_pass(device, color_format)?;

        let vert_module = match create_shader_module(device, vert_spv) {
            Ok(module) => module,
            Err(e) => {
                device.handle.destroy_render_pass(render_pass, None);
                return Err(format!("Vertex shader: {}", e));
            }
        };
        let frag_module = match create_shader_module(device, frag_spv) {
            Ok(module) => module,
            Err(e) => {
                device.handle.destroy_shader_module(vert_module, None);
                device.handle.destroy_render_pass(render_pass, None);
                return Err(format!("Fragment shader: {}", e));
            }
        };

        let built = Self::build(device, render_pass, extent, vert_module, frag_module);

        // Shader modules are only needed during pipeline creation
        device.handle.destroy_shader_module(vert_module, None);
        device.handle.destroy_shader_module(frag_module, None);

        match built {
            Ok((layout, handle)) => Ok(Self {
                render_pass,
                layout,
                handle,
            }),
            Err(e) => {
                device.handle.destroy_render_pass(render_pass, None);
                Err(e)
            }
        }
    }

    unsafe fn build(
        device: &VulkanDevice,
        render_pass: vk::RenderPass,
        extent: vk::Extent2D,
        vert_module: vk::ShaderModule,
        frag_module: vk::ShaderModule,
    ) -> Result<(vk::PipelineLayout, vk::Pipeline), String> {
        let entry_point = c"main";

        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vert_module)
                .name(entry_point),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(frag_module)
                .name(entry_point),
        ];

        let bindings = [Vertex::binding_description()];
        let attributes = Vertex::attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport::default()
            .x(0.0)
            .y(0.0)
            .width(extent.width as f32)
            .height(extent.height as f32)
            .min_depth(0.0)
            .max_depth(1.0)];
        let scissors = [vk::Rect2D::default()
            .offset(vk::Offset2D { x: 0, y: 0 })
            .extent(extent)];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)];
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let push_constant_ranges = [vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX)
            .offset(0)
            .size(PUSH_CONSTANT_SIZE)];
        let layout_info =
            vk::PipelineLayoutCreateInfo::default().push_constant_ranges(&push_constant_ranges);

        let layout = device
            .handle
            .create_pipeline_layout(&layout_info, None)
            .map_err(|e| format!("Failed to create pipeline layout: {:?}", e))?;

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = match device.handle.create_graphics_pipelines(
            vk::PipelineCache::null(),
            &[pipeline_info],
            None,
        ) {
            Ok(pipelines) => pipelines,
            Err((_, e)) => {
                device.handle.destroy_pipeline_layout(layout, None);
                return Err(format!("Failed to create graphics pipeline: {:?}", e));
            }
        };

        Ok((layout, pipelines[0]))
    }

    pub unsafe fn destroy(&mut self, device: &VulkanDevice) {
        device.handle.destroy_pipeline(self.handle, None);
        device.handle.destroy_pipeline_layout(self.layout, None);
        device.handle.destroy_render_pass(self.render_pass, None);
        self.handle = vk::Pipeline::null();
        self.layout = vk::PipelineLayout::null();
        self.render_pass = vk::RenderPass::null();
    }
}

/// Single-subpass render pass over one presentable color attachment.
unsafe fn create_render_pass(
    device: &VulkanDevice,
    format: vk::Format,
) -> Result<vk::RenderPass, String> {
    let attachments = [vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)];

    let color_refs = [vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];

    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)];

    let dependencies = [vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    device
        .handle
        .create_render_pass(&create_info, None)
        .map_err(|e| format!("Failed to create render pass: {:?}", e))
}

/// One framebuffer per swapchain image view.
pub unsafe fn create_framebuffers(
    device: &VulkanDevice,
    render_pass: vk::RenderPass,
    image_views: &[vk::ImageView],
    extent: vk::Extent2D,
) -> Result<Vec<vk::Framebuffer>, String> {
    image_views
        .iter()
        .map(|&view| {
            let attachments = [view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            device
                .handle
                .create_framebuffer(&create_info, None)
                .map_err(|e| format!("Failed to create framebuffer: {:?}", e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_shader_interface() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(Vertex::binding_description().stride, 24);

        let attrs = Vertex::attribute_descriptions();
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[0].location, 0);
        assert_eq!(attrs[1].location, 1);
    }

    #[test]
    fn spirv_words_accepts_valid_binary() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&SPIRV_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&0x0001_0600u32.to_le_bytes()); // version 1.6
        let words = spirv_words(&bytes).unwrap();
        assert_eq!(words[0], SPIRV_MAGIC);
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn spirv_words_rejects_bad_input() {
        assert!(spirv_words(&[]).is_err());
        assert!(spirv_words(&[1, 2, 3]).is_err());
        assert!(spirv_words(&[0, 0, 0, 0]).is_err()); // wrong magic
    }

    #[test]
    fn push_constants_hold_two_matrices() {
        assert_eq!(PUSH_CONSTANT_SIZE as usize, 2 * 16 * std::mem::size_of::<f32>());
    }
}

//! `Runner`: the event loop. Four FIFOs — Frame, Main, Refill, Present —
//! drained in that fixed order every tick, mirroring the ordering
//! constraint in the data model (a command buffer for image `k` is never
//! re-recorded while frame `k` is still in flight, and nothing touches the
//! swapchain until the frame's Main-event bookkeeping has settled).

use ash::vk;
use thiserror::Error;

use crate::core::config::{ShaderConfig, VulkanRendererConfig};
use crate::foundation::collections::Fifo;
use crate::graphics::PipelineCache;
use crate::resources::{DatHandle, ResourceError, ResourceManager};
use crate::scene::{InputEvent, Scene};
use crate::transfer::{TransferEngine, TransferError};
use crate::vk::{FrameSync, Swapchain, VulkanContext, VulkanError};

/// Upper bound on concurrently descriptor-bound visuals a single runner's
/// pipeline cache provisions for. Generous relative to any one scene's
/// visual count; revisit if a caller ever needs more.
const MAX_BOUND_VISUALS: u32 = 512;

use super::config::RunnerConfig;
use super::events::{FrameEvent, MainEvent, PresentEvent, RefillEvent, RunnerRequest};

/// Errors raised while driving the event loop.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The swapchain must be recreated before the next acquire/present.
    #[error("swapchain out of date")]
    SwapchainOutOfDate,

    /// Raw Vulkan failure from the wrapper layer.
    #[error(transparent)]
    Vulkan(#[from] VulkanError),

    /// Resource manager failure surfaced while servicing a Main event.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Transfer engine failure surfaced during the per-frame flush.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

fn create_command_pool(context: &VulkanContext) -> Result<vk::CommandPool, RunnerError> {
    let create_info = vk::CommandPoolCreateInfo::builder()
        .queue_family_index(context.physical_device().queue_families.graphics)
        .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
    unsafe {
        context
            .device()
            .create_command_pool(&create_info, None)
            .map_err(VulkanError::from)
            .map_err(RunnerError::from)
    }
}

fn allocate_command_buffers(
    context: &VulkanContext,
    pool: vk::CommandPool,
    count: usize,
) -> Result<Vec<vk::CommandBuffer>, RunnerError> {
    let alloc_info = vk::CommandBufferAllocateInfo::builder()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(count as u32);
    unsafe {
        context
            .device()
            .allocate_command_buffers(&alloc_info)
            .map_err(VulkanError::from)
            .map_err(RunnerError::from)
    }
}

/// The event loop: owns the per-image synchronization primitives and
/// command buffers, and the four FIFOs callers and panels post work into.
///
/// Borrows the [`VulkanContext`] rather than owning it — the context
/// outlives every swapchain it's asked to recreate, so the runner itself
/// is the thing torn down and rebuilt around a resize, not the other way
/// round.
pub struct Runner<'a> {
    context: &'a VulkanContext,
    config: RunnerConfig,
    frame_fifo: Fifo<FrameEvent>,
    main_fifo: Fifo<MainEvent>,
    refill_fifo: Fifo<RefillEvent>,
    present_fifo: Fifo<PresentEvent>,
    frame_syncs: Vec<FrameSync>,
    command_pool: vk::CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,
    /// Built pipelines and descriptor sets, one per [`crate::graphics::GraphicsType`]
    /// actually requested by a visual.
    pipeline_cache: PipelineCache,
    /// Frames remaining until each image's command buffer is due a full
    /// (not just dirtied-panel) re-record, per the Refill event's `full` flag.
    refill_countdown: Vec<u32>,
    frame_index: usize,
    frames_rendered: u64,
    /// Sum of every `dt` seen so far, fed to each panel's `MvpUniform.time`.
    elapsed_time: f32,
    /// Set by a `MainEvent::Request(RunnerRequest::Stop)`; checked by
    /// `should_stop` alongside the configured frame budget.
    stop_requested: bool,
    /// Overrides `config.screenshot` when a `RunnerRequest::Screenshot` is
    /// processed mid-run rather than configured up front.
    pending_screenshot: Option<std::path::PathBuf>,
}

impl<'a> Runner<'a> {
    /// Build a runner sized to `swapchain`'s image count, reading tuning
    /// from the process environment. `shaders` tells the pipeline cache
    /// where to find each graphics type's compiled SPIR-V.
    pub fn new(
        context: &'a VulkanContext,
        swapchain: &Swapchain,
        config: RunnerConfig,
        shaders: ShaderConfig,
    ) -> Result<Self, RunnerError> {
        let image_count = swapchain.image_count();
        let frame_syncs = (0..image_count)
            .map(|_| FrameSync::new(context.device().clone()).map_err(RunnerError::from))
            .collect::<Result<Vec<_>, _>>()?;
        let command_pool = create_command_pool(context)?;
        let command_buffers = allocate_command_buffers(context, command_pool, image_count)?;
        let refill_period = config.refill_period.max(1);
        let pipeline_cache = PipelineCache::new(
            context.device(),
            shaders,
            swapchain.render_pass(),
            swapchain.extent(),
            MAX_BOUND_VISUALS,
        )?;

        Ok(Self {
            context,
            config,
            frame_fifo: Fifo::new(),
            main_fifo: Fifo::new(),
            refill_fifo: Fifo::new(),
            present_fifo: Fifo::new(),
            frame_syncs,
            command_pool,
            command_buffers,
            pipeline_cache,
            refill_countdown: vec![refill_period; image_count],
            frame_index: 0,
            frames_rendered: 0,
            elapsed_time: 0.0,
            stop_requested: false,
            pending_screenshot: None,
        })
    }

    /// Queue a tick: `dt` plus whatever windowing-layer input arrived since
    /// the last tick. Call once per iteration of the caller's own loop.
    pub fn submit_frame(&self, dt: f32, input: Vec<InputEvent>) {
        self.frame_fifo.enqueue(FrameEvent { dt, input });
    }

    /// Post a low-level request, resolved against the resource manager the
    /// next time Main events are drained.
    pub fn submit_request(&self, request: RunnerRequest) {
        self.main_fifo.enqueue(MainEvent::Request(request));
    }

    /// Whether the configured frame budget (`DVZ_RUN_NFRAMES`) has been
    /// reached, or an explicit stop request has been processed.
    pub fn should_stop(&self) -> bool {
        self.stop_requested || matches!(self.config.nframes, Some(n) if self.frames_rendered >= n)
    }

    /// Total frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Path a screenshot of the final frame should be written to: a
    /// mid-run `RunnerRequest::Screenshot` overrides the configured path.
    pub fn screenshot_path(&self) -> Option<&std::path::Path> {
        self.pending_screenshot.as_deref().or(self.config.screenshot.as_deref())
    }

    /// Reference to the config this runner was built from.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one full Frame -> Main -> Refill -> Present cycle.
    ///
    /// Blocks on the previous use of the acquired image's in-flight fence
    /// before touching its command buffer, honoring the invariant that a
    /// command buffer is never re-recorded while its frame is still
    /// executing on the device.
    pub fn tick(
        &mut self,
        scene: &mut Scene,
        resources: &mut ResourceManager,
        transfer: &mut TransferEngine,
        swapchain: &Swapchain,
    ) -> Result<(), RunnerError> {
        self.drain_frame_events(scene);

        let sync_index = self.frame_index % self.frame_syncs.len();
        self.frame_syncs[sync_index].in_flight.wait(u64::MAX)?;

        let image_available = self.frame_syncs[sync_index].image_available.handle();
        let (image_index, suboptimal) = match swapchain.acquire_next_image(image_available) {
            Ok(result) => result,
            Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR)) => return Err(RunnerError::SwapchainOutOfDate),
            Err(e) => return Err(e.into()),
        };
        if suboptimal {
            log::debug!("swapchain image {image_index} acquired suboptimal");
        }
        let image_index = image_index as usize;

        self.main_fifo.enqueue(MainEvent::TransferFlush { image_index });
        self.drain_main_events(scene, resources, transfer, image_index)?;

        let full_refill = {
            let countdown = &mut self.refill_countdown[image_index];
            *countdown = countdown.saturating_sub(1);
            *countdown == 0
        };
        if full_refill {
            self.refill_countdown[image_index] = self.config.refill_period.max(1);
        }
        self.refill_fifo.enqueue(RefillEvent { image_index, full: full_refill });
        self.drain_refill_events(scene, resources, transfer, swapchain)?;

        self.frame_syncs[sync_index].in_flight.reset()?;
        self.submit_recorded_buffer(image_index, sync_index)?;

        self.present_fifo.enqueue(PresentEvent { image_index });
        self.drain_present_events(swapchain, sync_index)?;

        self.frame_index += 1;
        self.frames_rendered += 1;
        Ok(())
    }

    fn drain_frame_events(&mut self, scene: &mut Scene) {
        while let Some(event) = self.frame_fifo.try_dequeue() {
            for input in &event.input {
                scene.dispatch_event(input);
            }
            scene.update(event.dt);
            self.elapsed_time += event.dt;
            while let Some(update) = scene.updates.try_dequeue() {
                self.main_fifo.enqueue(MainEvent::PanelChanged { panel_index: update.panel_index });
            }
        }
    }

    fn drain_main_events(
        &mut self,
        scene: &mut Scene,
        resources: &mut ResourceManager,
        transfer: &mut TransferEngine,
        image_index: usize,
    ) -> Result<(), RunnerError> {
        while let Some(event) = self.main_fifo.try_dequeue() {
            match event {
                MainEvent::VisualAdded { panel_index } => {
                    if let Some(panel) = scene.panel_mut(panel_index) {
                        panel.refit_coords();
                    }
                    self.main_fifo.enqueue(MainEvent::CoordsChanged { panel_index });
                    self.main_fifo.enqueue(MainEvent::VisualChanged { panel_index });
                }
                MainEvent::VisualChanged { .. } | MainEvent::PanelChanged { .. } => {
                    self.refill_fifo.enqueue(RefillEvent { image_index, full: false });
                }
                MainEvent::CoordsChanged { panel_index } => {
                    if let Some(panel) = scene.panel_mut(panel_index) {
                        panel.refit_coords();
                        for visual in panel.visuals_in_draw_order_mut() {
                            visual.mark_dirty();
                        }
                    }
                    self.main_fifo.enqueue(MainEvent::VisualChanged { panel_index });
                    log::trace!("panel {panel_index} data coords changed, re-transforming owned visuals");
                }
                MainEvent::Request(RunnerRequest::Stop) => {
                    self.stop_requested = true;
                }
                MainEvent::Request(RunnerRequest::Screenshot(path)) => {
                    self.pending_screenshot = Some(path);
                }
                MainEvent::TransferFlush { image_index } => {
                    transfer.tick(self.context, image_index, resources)?;
                }
            }
        }
        Ok(())
    }

    fn drain_refill_events(
        &mut self,
        scene: &mut Scene,
        resources: &mut ResourceManager,
        transfer: &mut TransferEngine,
        swapchain: &Swapchain,
    ) -> Result<(), RunnerError> {
        while let Some(event) = self.refill_fifo.try_dequeue() {
            for panel in scene.panels_mut() {
                panel.refit_coords();
            }
            self.record_command_buffer(scene, resources, transfer, swapchain, event.image_index, event.full)?;
        }
        Ok(())
    }

    /// Bakes every dirty visual, uploads its changed sources, and records
    /// the image's command buffer: a render pass binding each panel's
    /// graphics pipelines in draw-order, descriptor set 0 always the
    /// panel's MVP/viewport uniforms, descriptor 2+ whatever the visual's
    /// sources supply against its graphics type's catalogue slots.
    fn record_command_buffer(
        &mut self,
        scene: &mut Scene,
        resources: &mut ResourceManager,
        transfer: &mut TransferEngine,
        swapchain: &Swapchain,
        image_index: usize,
        full: bool,
    ) -> Result<(), RunnerError> {
        for panel in scene.panels_mut() {
            panel.sync_uniforms(self.elapsed_time, self.context, resources, transfer, image_index)?;
            for visual in panel.visuals_in_draw_order_mut() {
                if full || visual.is_dirty() {
                    // A visual missing a required prop is skipped for this
                    // frame rather than aborting the whole record pass: the
                    // other visuals in this and every other panel still need
                    // their command buffer recorded.
                    if let Err(e) = visual.prepare() {
                        log::warn!("visual bake failed, skipping for this frame: {e}");
                        continue;
                    }
                }
                self.sync_visual_sources(visual, resources, transfer, image_index)?;
            }
        }

        let device = self.context.device().clone();
        let command_buffer = self.command_buffers[image_index];
        unsafe {
            device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::from)?;
            let begin_info = vk::CommandBufferBeginInfo::builder();
            device.begin_command_buffer(command_buffer, &begin_info).map_err(VulkanError::from)?;

            let clear_values = [
                vk::ClearValue {
                    color: vk::ClearColorValue { float32: [0.05, 0.05, 0.08, 1.0] },
                },
                vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
                },
            ];
            let render_pass_info = vk::RenderPassBeginInfo::builder()
                .render_pass(swapchain.render_pass())
                .framebuffer(swapchain.framebuffer(image_index))
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: swapchain.extent(),
                })
                .clear_values(&clear_values);
            device.cmd_begin_render_pass(command_buffer, &render_pass_info, vk::SubpassContents::INLINE);
        }

        for panel in scene.panels_mut() {
            let mvp_dat = panel.mvp_dat();
            let viewport_dat = panel.viewport_dat();
            for visual in panel.visuals_in_draw_order_mut() {
                self.record_visual_draw(command_buffer, visual, mvp_dat, viewport_dat, resources, image_index)?;
            }
        }

        unsafe {
            device.cmd_end_render_pass(command_buffer);
            device.end_command_buffer(command_buffer).map_err(VulkanError::from)?;
        }
        Ok(())
    }

    /// Bind `visual`'s cached pipeline and descriptor set, wire its vertex
    /// and (if indexed) index buffers, and issue its draw call. Binding 0 is
    /// always the panel's MVP uniform, binding 1 its viewport uniform;
    /// binding 2+ comes from whichever of the visual's sources declares a
    /// matching `binding_slot`. A visual is skipped for this record pass if
    /// its panel hasn't synced uniforms yet or it has no vertices baked.
    fn record_visual_draw(
        &mut self,
        command_buffer: vk::CommandBuffer,
        visual: &mut crate::visual::Visual,
        mvp_dat: Option<DatHandle>,
        viewport_dat: Option<DatHandle>,
        resources: &ResourceManager,
        image_index: usize,
    ) -> Result<(), RunnerError> {
        use crate::visual::source::{SourceBinding, SourceKind};

        let (Some(mvp_dat), Some(viewport_dat)) = (mvp_dat, viewport_dat) else {
            return Ok(());
        };
        if visual.vertex_count() == 0 {
            return Ok(());
        }

        let graphics_type = visual.graphics_type;
        self.pipeline_cache.get_or_create(graphics_type)?;
        if visual.descriptor_set.is_none() {
            visual.descriptor_set = Some(self.pipeline_cache.allocate_descriptor_set(graphics_type)?);
        }
        let cached = self.pipeline_cache.get(graphics_type).expect("just built above");
        let descriptor_set = visual.descriptor_set.expect("just allocated above");

        enum WriteRef {
            Buffer(usize),
            Image(usize),
        }

        let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::new();
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::new();
        let mut writes_meta: Vec<(u32, vk::DescriptorType, WriteRef)> = Vec::new();

        let dat_buffer_info = |handle: DatHandle| -> Result<vk::DescriptorBufferInfo, RunnerError> {
            let (buffer, offset) = resources.dat_buffer(handle, image_index).ok_or(ResourceError::NotFound)?;
            let range = resources.dat(handle).ok_or(ResourceError::NotFound)?.element_size();
            Ok(vk::DescriptorBufferInfo { buffer, offset, range })
        };

        buffer_infos.push(dat_buffer_info(mvp_dat)?);
        writes_meta.push((0, vk::DescriptorType::UNIFORM_BUFFER, WriteRef::Buffer(buffer_infos.len() - 1)));

        buffer_infos.push(dat_buffer_info(viewport_dat)?);
        writes_meta.push((1, vk::DescriptorType::UNIFORM_BUFFER, WriteRef::Buffer(buffer_infos.len() - 1)));

        for slot in cached.entry.descriptor_slots.iter().filter(|s| s.binding >= 2) {
            let Some(source) = visual.sources.iter().find(|s| s.binding_slot == slot.binding) else {
                continue;
            };
            match source.binding {
                SourceBinding::Dat(handle) => {
                    buffer_infos.push(dat_buffer_info(handle)?);
                    writes_meta.push((slot.binding, slot.descriptor_type, WriteRef::Buffer(buffer_infos.len() - 1)));
                }
                SourceBinding::Tex(handle) => {
                    let tex = resources.tex(handle).ok_or(ResourceError::NotFound)?;
                    image_infos.push(vk::DescriptorImageInfo {
                        sampler: tex.sampler(),
                        image_view: tex.view(),
                        image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    });
                    writes_meta.push((slot.binding, slot.descriptor_type, WriteRef::Image(image_infos.len() - 1)));
                }
                SourceBinding::Unbound => continue,
            }
        }

        let writes: Vec<vk::WriteDescriptorSet> = writes_meta
            .iter()
            .map(|(binding, ty, write_ref)| {
                let builder = vk::WriteDescriptorSet::builder()
                    .dst_set(descriptor_set)
                    .dst_binding(*binding)
                    .descriptor_type(*ty);
                match write_ref {
                    WriteRef::Buffer(idx) => builder.buffer_info(std::slice::from_ref(&buffer_infos[*idx])).build(),
                    WriteRef::Image(idx) => builder.image_info(std::slice::from_ref(&image_infos[*idx])).build(),
                }
            })
            .collect();

        let source_buffer = |kind: SourceKind| {
            visual.sources.iter().find(|s| s.source_kind == kind).and_then(|s| match s.binding {
                SourceBinding::Dat(handle) => resources.dat_buffer(handle, image_index),
                _ => None,
            })
        };
        let vertex_binding = source_buffer(SourceKind::Vertex);
        let index_binding = source_buffer(SourceKind::Index);

        let device = self.context.device();
        let pipeline = cached.pipeline.handle();
        let layout = cached.pipeline.layout();

        unsafe {
            device.update_descriptor_sets(&writes, &[]);
            device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
            device.cmd_bind_descriptor_sets(command_buffer, vk::PipelineBindPoint::GRAPHICS, layout, 0, &[descriptor_set], &[]);

            if let Some((buffer, offset)) = vertex_binding {
                device.cmd_bind_vertex_buffers(command_buffer, 0, &[buffer], &[offset]);
            }

            if let Some((buffer, offset)) = index_binding {
                device.cmd_bind_index_buffer(command_buffer, buffer, offset, vk::IndexType::UINT32);
                device.cmd_draw_indexed(command_buffer, visual.index_count() as u32, 1, 0, 0, 0);
            } else {
                device.cmd_draw(command_buffer, visual.vertex_count() as u32, 1, 0, 0);
            }
        }

        Ok(())
    }

    /// Push every dirty buffer-backed source of `visual` to its GPU-side
    /// Dat: allocate or resize the Dat on first use, enqueue an upload of
    /// the freshly baked bytes targeting the image about to be recorded,
    /// and clear the source's dirty flag. Texture-kind sources are left
    /// alone here; texture transfer jobs still need the command-buffer
    /// context described on [`TransferEngine::run_upload`].
    fn sync_visual_sources(
        &self,
        visual: &mut crate::visual::Visual,
        resources: &mut ResourceManager,
        transfer: &mut TransferEngine,
        image_index: usize,
    ) -> Result<(), RunnerError> {
        use crate::visual::source::SourceKind;

        for source in &mut visual.sources {
            if !source.is_dirty() {
                continue;
            }
            if matches!(
                source.source_kind,
                SourceKind::Texture1D | SourceKind::Texture2D | SourceKind::Texture3D
            ) {
                continue;
            }
            let handle = source.ensure_dat(self.context, resources, transfer)?;
            transfer.enqueue_upload(handle, source.elements.clone(), image_index);
            source.clear_dirty();
        }
        Ok(())
    }

    fn submit_recorded_buffer(&self, image_index: usize, sync_index: usize) -> Result<(), RunnerError> {
        let sync = &self.frame_syncs[sync_index];
        let device = self.context.device();
        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [sync.render_finished.handle()];
        let command_buffers = [self.command_buffers[image_index]];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            device
                .queue_submit(self.context.graphics_queue(), &[submit_info], sync.in_flight.handle())
                .map_err(VulkanError::from)?;
        }
        Ok(())
    }

    fn drain_present_events(&self, swapchain: &Swapchain, sync_index: usize) -> Result<(), RunnerError> {
        let render_finished = self.frame_syncs[sync_index].render_finished.handle();
        while let Some(event) = self.present_fifo.try_dequeue() {
            match swapchain.present(self.context.present_queue(), event.image_index as u32, render_finished) {
                Ok(true) => log::debug!("swapchain image {} presented suboptimal", event.image_index),
                Ok(false) => {}
                Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR)) => return Err(RunnerError::SwapchainOutOfDate),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Teardown sequencing: stop accepting new input, drain every queue,
    /// wait for the device to go idle, then let the caller release
    /// resources in reverse-allocation order (swapchain, then resource
    /// manager, then the Vulkan context itself).
    pub fn shutdown(&mut self, transfer: &mut TransferEngine, resources: &mut ResourceManager) -> Result<(), RunnerError> {
        while self.frame_fifo.try_dequeue().is_some() {}
        while self.main_fifo.try_dequeue().is_some() {}
        while self.refill_fifo.try_dequeue().is_some() {}
        while self.present_fifo.try_dequeue().is_some() {}

        self.context.wait_idle()?;
        for image in 0..self.frame_syncs.len() {
            transfer.tick(self.context, image, resources)?;
        }
        resources.collect_garbage();
        Ok(())
    }
}

impl Drop for Runner<'_> {
    fn drop(&mut self) {
        unsafe {
            self.context.device().destroy_command_pool(self.command_pool, None);
        }
    }
}

/// The global metadata a runner logs once at startup, mirroring how
/// [`VulkanContext::new`] announces the instance it created.
pub fn log_startup(config: &VulkanRendererConfig, runner_config: &RunnerConfig) {
    log::info!(
        "starting '{}' with {} transfer worker(s), nframes={:?}",
        config.application_name,
        runner_config.num_threads,
        runner_config.nframes
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stop_respects_configured_frame_budget() {
        let config = RunnerConfig {
            nframes: Some(3),
            screenshot: None,
            num_threads: 1,
            refill_period: 2,
        };
        let frames_rendered = 3u64;
        assert!(matches!(config.nframes, Some(n) if frames_rendered >= n));
    }

    #[test]
    fn should_stop_never_true_without_a_configured_budget() {
        let config = RunnerConfig::default();
        assert_eq!(config.nframes, None);
    }
}

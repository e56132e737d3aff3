// =============================================================================
// VULKAN QUAD RENDERER
// =============================================================================
//
// A small real-time renderer that brings up a Vulkan device, a swapchain
// and a fixed graphics pipeline, then draws one colored quad per frame.
//
// FRAME FLOW:
// 1. Wait on the current frame slot's fence
// 2. Acquire a swapchain image (recreate the swapchain when it is stale)
// 3. Rerecord the slot's command buffer against the acquired framebuffer
// 4. Submit with the image-available/render-finished semaphore chain
// 5. Present, then advance to the next frame slot
//
// =============================================================================

mod backend;
mod config;
mod scene;

use anyhow::{Context, Result};
use ash::vk;
use backend::sync::FramePool;
use backend::{pipeline, Swapchain, VulkanDevice};
use config::Config;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use scene::{QuadScene, Renderable};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowAttributes},
};

// =============================================================================
// STARTUP
// =============================================================================

fn main() -> Result<()> {
    init_logging();

    let config = Config::load();
    log::info!(
        "Quad renderer starting: {}x{}, {}, present mode {}",
        config.window.width,
        config.window.height,
        if config.window.fullscreen {
            "fullscreen"
        } else {
            "windowed"
        },
        config.graphics.present_mode
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, Box::new(QuadScene::new()));
    event_loop.run_app(&mut app)?;

    // A mid-loop failure exits the event loop cleanly; surface it here so
    // the process reports it
    if let Some(err) = app.take_error() {
        return Err(err);
    }

    Ok(())
}

fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let default_level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    Builder::from_default_env().filter_level(default_level).init();
}

// =============================================================================
// APPLICATION
// =============================================================================

/// Application state: the window, the Vulkan object graph and the flags
/// driving the frame scheduler.
///
/// Drop tears the GPU objects down in reverse creation order.
pub struct App {
    // ─────────────────────────────────────────────────────────────────────────
    // CONFIGURATION & SCENE
    // ─────────────────────────────────────────────────────────────────────────
    config: Config,
    scene: Box<dyn Renderable>,

    // ─────────────────────────────────────────────────────────────────────────
    // WINDOW
    // ─────────────────────────────────────────────────────────────────────────
    window: Option<Arc<Window>>,
    is_fullscreen: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // GPU OBJECTS
    // ─────────────────────────────────────────────────────────────────────────
    device: Option<Arc<VulkanDevice>>,
    swapchain: Option<Swapchain>,
    render_pass: vk::RenderPass,
    pipeline: vk::Pipeline,
    pipeline_layout: vk::PipelineLayout,
    frames: Option<FramePool>,

    // ─────────────────────────────────────────────────────────────────────────
    // SCHEDULER FLAGS
    // ─────────────────────────────────────────────────────────────────────────
    /// Set when the window is resized or the surface goes stale;
    /// consumed at the top of the next frame
    needs_resize: bool,
    /// Set while the framebuffer size is zero; rendering is skipped
    is_minimized: bool,
    /// Fatal mid-loop error carried out of the event loop
    fatal_error: Option<anyhow::Error>,

    // ─────────────────────────────────────────────────────────────────────────
    // FRAME STATS
    // ─────────────────────────────────────────────────────────────────────────
    frame_count: u32,
    last_fps_update: Instant,
    last_tick: Instant,
}

impl App {
    pub fn new(config: Config, scene: Box<dyn Renderable>) -> Self {
        let is_fullscreen = config.window.fullscreen;
        let now = Instant::now();
        Self {
            config,
            scene,
            window: None,
            is_fullscreen,
            device: None,
            swapchain: None,
            render_pass: vk::RenderPass::null(),
            pipeline: vk::Pipeline::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            frames: None,
            needs_resize: false,
            is_minimized: false,
            fatal_error: None,
            frame_count: 0,
            last_fps_update: now,
            last_tick: now,
        }
    }

    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.fatal_error.take()
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Set up the full Vulkan stack: device, swapchain, render pass,
    /// pipeline, per-frame resources, then the scene's own GPU objects.
    fn init_vulkan(&mut self, window: Arc<Window>) -> Result<()> {
        let enable_validation = cfg!(debug_assertions) && self.config.debug.validation_layers;

        let display_handle = window
            .display_handle()
            .context("querying display handle")?
            .as_raw();
        let window_handle = window
            .window_handle()
            .context("querying window handle")?
            .as_raw();

        let device = VulkanDevice::new(
            &self.config.window.title,
            enable_validation,
            display_handle,
            window_handle,
        )?;

        let size = window.inner_size();
        let mut swapchain = Swapchain::new(
            device.clone(),
            self.config.get_present_mode(),
            size.width,
            size.height,
        )?;

        log::info!("Present mode in use: {:?}", swapchain.present_mode);

        let render_pass = pipeline::create_render_pass(&device, swapchain.format)?;
        let (gfx_pipeline, pipeline_layout) =
            pipeline::create_graphics_pipeline(&device, render_pass)?;

        swapchain.create_resources(render_pass)?;

        let frames = FramePool::new(&device, self.config.graphics.max_frames_in_flight)?;
        log::info!("Pipelining {} frames", frames.slot_count());

        self.scene.on_init(&device)?;

        self.device = Some(device);
        self.swapchain = Some(swapchain);
        self.render_pass = render_pass;
        self.pipeline = gfx_pipeline;
        self.pipeline_layout = pipeline_layout;
        self.frames = Some(frames);

        log::info!("Vulkan stack ready, entering render loop");
        Ok(())
    }

    /// Recreate the swapchain after a resize or a stale-surface report.
    ///
    /// A zero-sized framebuffer means the window is minimized; rendering
    /// stays off until events deliver a nonzero size, so a swapchain is
    /// never created with a zero extent.
    fn recreate_swapchain(&mut self) -> Result<()> {
        let window = match &self.window {
            Some(window) => window.clone(),
            None => return Ok(()),
        };

        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            self.is_minimized = true;
            return Ok(());
        }
        self.is_minimized = false;

        if let Some(swapchain) = self.swapchain.as_mut() {
            swapchain.recreate(self.render_pass, size.width, size.height)?;
        }

        self.needs_resize = false;
        Ok(())
    }

    // =========================================================================
    // FRAME SCHEDULER
    // =========================================================================

    /// Render a single frame. Returns false when nothing was drawn
    /// (minimized window, or the swapchain went stale at acquire time).
    pub fn render_frame(&mut self) -> Result<bool> {
        if self.is_minimized {
            return Ok(false);
        }

        if self.needs_resize {
            self.recreate_swapchain()?;
            if self.is_minimized {
                return Ok(false);
            }
        }

        let device = self.device.as_ref().context("device not initialized")?;
        let swapchain = self.swapchain.as_ref().context("swapchain not initialized")?;
        let frames = self.frames.as_ref().context("frame pool not initialized")?;
        let slot = frames.current();

        // ─────────────────────────────────────────────────────────────────────
        // STEP 1: Wait until the GPU is done with this slot's previous frame
        // ─────────────────────────────────────────────────────────────────────
        unsafe {
            device
                .device
                .wait_for_fences(&[slot.in_flight_fence], true, u64::MAX)?;
        }

        // ─────────────────────────────────────────────────────────────────────
        // STEP 2: Acquire the next swapchain image
        // ─────────────────────────────────────────────────────────────────────
        let (image_index, suboptimal) = match swapchain.acquire_next_image(slot.image_available) {
            Ok(pair) => pair,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                // No image, so no submission this iteration: leave the
                // fence signaled and the frame index where it is
                self.needs_resize = true;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        if suboptimal {
            self.needs_resize = true;
        }

        log::trace!(
            "Recording frame slot {} into image {}",
            frames.frame_index(),
            image_index
        );

        // ─────────────────────────────────────────────────────────────────────
        // STEP 3: Record this frame's commands
        // ─────────────────────────────────────────────────────────────────────
        // The fence is unsignaled only now that a submission is certain;
        // resetting it before a bailed-out acquire would deadlock the
        // next wait on this slot
        unsafe {
            device.device.reset_fences(&[slot.in_flight_fence])?;
            device
                .device
                .reset_command_buffer(slot.command_buffer, vk::CommandBufferResetFlags::empty())?;
        }

        record_frame_commands(
            &device.device,
            slot.command_buffer,
            self.render_pass,
            swapchain.framebuffers[image_index as usize],
            self.pipeline,
            swapchain.extent,
            self.config.graphics.clear_color,
            self.scene.as_ref(),
        )?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 4: Submit
        // ─────────────────────────────────────────────────────────────────────
        let wait_semaphores = [slot.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.render_finished];
        let command_buffers = [slot.command_buffer];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            device.device.queue_submit(
                device.graphics_queue,
                &[submit_info.build()],
                slot.in_flight_fence,
            )?;
        }

        // ─────────────────────────────────────────────────────────────────────
        // STEP 5: Present
        // ─────────────────────────────────────────────────────────────────────
        match swapchain.present(device.present_queue, image_index, slot.render_finished) {
            Ok(suboptimal) => {
                if suboptimal {
                    self.needs_resize = true;
                }
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.needs_resize = true;
            }
            Err(e) => return Err(e.into()),
        }

        // ─────────────────────────────────────────────────────────────────────
        // STEP 6: Advance to the next frame slot
        // ─────────────────────────────────────────────────────────────────────
        if let Some(frames) = self.frames.as_mut() {
            frames.advance();
        }

        Ok(true)
    }

    // =========================================================================
    // WINDOW HELPERS
    // =========================================================================

    fn toggle_fullscreen(&mut self) {
        let Some(window) = &self.window else {
            return;
        };

        self.is_fullscreen = !self.is_fullscreen;
        let mode = self
            .is_fullscreen
            .then(|| Fullscreen::Borderless(None));
        window.set_fullscreen(mode);
        log::info!(
            "Switched to {}",
            if self.is_fullscreen { "fullscreen" } else { "windowed" }
        );

        self.needs_resize = true;
    }

    /// Once a second, fold the frame counter into the window title.
    fn update_fps(&mut self, frame_time: f32) {
        if !self.config.debug.show_fps {
            return;
        }

        self.frame_count += 1;

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f32();
        if elapsed < 1.0 {
            return;
        }

        if let Some(window) = &self.window {
            let fps = self.frame_count as f32 / elapsed;
            window.set_title(&format!(
                "{} | {:.0} fps / {:.2} ms",
                self.config.window.title,
                fps,
                frame_time * 1000.0,
            ));
        }

        self.frame_count = 0;
        self.last_fps_update = now;
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(device) = &self.device {
            let _ = device.wait_idle();
        }
        event_loop.exit();
    }
}

// =============================================================================
// COMMAND RECORDING
// =============================================================================

/// Fill `cmd` with the frame's draw sequence: clear, bind the pipeline,
/// set the dynamic viewport and scissor to the current extent, then let
/// the scene issue its draw. Stateless; called once per recorded frame.
#[allow(clippy::too_many_arguments)]
fn record_frame_commands(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    pipeline: vk::Pipeline,
    extent: vk::Extent2D,
    clear_color: [f32; 4],
    scene: &dyn Renderable,
) -> Result<()> {
    let begin_info = vk::CommandBufferBeginInfo::builder();

    let clear_values = [vk::ClearValue {
        color: vk::ClearColorValue {
            float32: clear_color,
        },
    }];

    let render_pass_info = vk::RenderPassBeginInfo::builder()
        .render_pass(render_pass)
        .framebuffer(framebuffer)
        .render_area(vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        })
        .clear_values(&clear_values);

    // Always taken from the extent of the swapchain being rendered to,
    // never cached across a resize
    let viewport = vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    };
    let scissor = vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    };

    unsafe {
        device.begin_command_buffer(cmd, &begin_info)?;
        device.cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE);
        device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline);
        device.cmd_set_viewport(cmd, 0, &[viewport]);
        device.cmd_set_scissor(cmd, 0, &[scissor]);

        scene.on_render(device, cmd);

        device.cmd_end_render_pass(cmd);
        device.end_command_buffer(cmd)?;
    }

    Ok(())
}

// =============================================================================
// WINDOW EVENTS
// =============================================================================

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        if self.config.window.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Window creation failed: {e:?}");
                self.fatal_error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        self.window = Some(window.clone());

        if let Err(e) = self.init_vulkan(window) {
            log::error!("Vulkan initialization failed: {e:?}");
            self.fatal_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window closed");
                self.shutdown(event_loop);
            }

            // A zero-sized framebuffer is a minimize, not a resize; the
            // scheduler skips frames until the size comes back
            WindowEvent::Resized(size) => {
                log::debug!("Framebuffer now {}x{}", size.width, size.height);

                if size.width == 0 || size.height == 0 {
                    self.is_minimized = true;
                } else {
                    self.is_minimized = false;
                    self.needs_resize = true;
                }
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(self.last_tick).as_secs_f32();
                self.last_tick = now;

                self.scene.on_update(dt);

                match self.render_frame() {
                    Ok(rendered) => {
                        if rendered {
                            self.update_fps(dt);
                        }
                    }
                    Err(e) => {
                        log::error!("Frame failed: {e:?}");
                        self.fatal_error = Some(e);
                        self.shutdown(event_loop);
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if !event.state.is_pressed() {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => {
                        log::info!("Escape pressed");
                        self.shutdown(event_loop);
                    }
                    PhysicalKey::Code(KeyCode::F11) => self.toggle_fullscreen(),
                    _ => {}
                }
            }

            _ => {}
        }
    }

    /// Request continuous redraws; the fence wait paces the loop.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

// =============================================================================
// TEARDOWN
// =============================================================================

impl Drop for App {
    fn drop(&mut self) {
        if let Some(device) = self.device.clone() {
            // Nothing may still be executing when handles start dying
            let _ = device.wait_idle();

            self.scene.on_shutdown(&device);

            unsafe {
                if let Some(frames) = &self.frames {
                    frames.destroy(&device.device);
                }

                if self.pipeline != vk::Pipeline::null() {
                    device.device.destroy_pipeline(self.pipeline, None);
                }
                if self.pipeline_layout != vk::PipelineLayout::null() {
                    device.device.destroy_pipeline_layout(self.pipeline_layout, None);
                }
                if self.render_pass != vk::RenderPass::null() {
                    device.device.destroy_render_pass(self.render_pass, None);
                }
            }

            // Framebuffers, views and the swapchain itself
            self.swapchain = None;

            // Dropping the last Arc releases the allocator, device,
            // debug messenger, surface and instance, in that order
            self.device = None;
        }

        log::info!("Renderer shut down");
    }
}

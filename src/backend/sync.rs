// Per-frame resources and synchronization
//
// A fixed pool of frame slots cycled by the render loop. Each slot owns
// one command buffer and the three sync objects gating its reuse.

use std::sync::Arc;

use ash::vk;

use super::error::Result;
use super::VulkanDevice;

/// One pipelined frame: a command buffer plus its sync primitives
pub struct FrameSlot {
    pub command_buffer: vk::CommandBuffer,
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
    pub in_flight_fence: vk::Fence,
}

impl FrameSlot {
    fn new(device: &VulkanDevice, command_buffer: vk::CommandBuffer) -> Result<Self> {
        let semaphore_info = vk::SemaphoreCreateInfo::builder();
        // Start signaled so the first wait on this slot returns immediately
        let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);

        unsafe {
            Ok(Self {
                command_buffer,
                image_available: device.device.create_semaphore(&semaphore_info, None)?,
                render_finished: device.device.create_semaphore(&semaphore_info, None)?,
                in_flight_fence: device.device.create_fence(&fence_info, None)?,
            })
        }
    }

    fn destroy(&self, device: &ash::Device) {
        unsafe {
            device.destroy_semaphore(self.image_available, None);
            device.destroy_semaphore(self.render_finished, None);
            device.destroy_fence(self.in_flight_fence, None);
        }
    }
}

/// Fixed-size pool of frame slots plus the cursor cycling through them.
///
/// The pool size is the configured number of frames in flight. It is
/// independent of the swapchain image count: it bounds how many frames
/// the CPU may record ahead of the GPU, not how many images the surface
/// hands out.
pub struct FramePool {
    slots: Vec<FrameSlot>,
    current: usize,
    command_pool: vk::CommandPool,
}

impl FramePool {
    pub fn new(device: &Arc<VulkanDevice>, frame_count: usize) -> Result<Self> {
        // A zero-slot pool cannot cycle; treat misconfiguration as 1
        let frame_count = frame_count.max(1);

        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(device.graphics_queue_family)
            // TRANSIENT: buffers are rerecorded every frame
            // RESET: allow individual buffer reset
            .flags(
                vk::CommandPoolCreateFlags::TRANSIENT
                    | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            );

        let command_pool = unsafe { device.device.create_command_pool(&pool_info, None)? };

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(frame_count as u32);

        let command_buffers = unsafe { device.device.allocate_command_buffers(&alloc_info)? };

        let slots = command_buffers
            .into_iter()
            .map(|cmd| FrameSlot::new(device, cmd))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Frame pool ready with {} slots", slots.len());

        Ok(Self {
            slots,
            current: 0,
            command_pool,
        })
    }

    /// Slot for the frame currently being prepared
    pub fn current(&self) -> &FrameSlot {
        &self.slots[self.current]
    }

    pub fn frame_index(&self) -> usize {
        self.current
    }

    /// Move the cursor to the next slot. The only place the index changes.
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn destroy(&self, device: &ash::Device) {
        for slot in &self.slots {
            slot.destroy(device);
        }
        unsafe {
            // Also frees the command buffers allocated from it
            device.destroy_command_pool(self.command_pool, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_slot() -> FrameSlot {
        FrameSlot {
            command_buffer: vk::CommandBuffer::null(),
            image_available: vk::Semaphore::null(),
            render_finished: vk::Semaphore::null(),
            in_flight_fence: vk::Fence::null(),
        }
    }

    fn pool_of(count: usize) -> FramePool {
        FramePool {
            slots: (0..count).map(|_| null_slot()).collect(),
            current: 0,
            command_pool: vk::CommandPool::null(),
        }
    }

    #[test]
    fn advance_cycles_through_all_slots_in_order() {
        let mut pool = pool_of(3);
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(pool.frame_index());
            pool.advance();
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn advance_wraps_single_slot_pool() {
        let mut pool = pool_of(1);
        pool.advance();
        pool.advance();
        assert_eq!(pool.frame_index(), 0);
    }

    #[test]
    fn pool_reports_slot_count() {
        assert_eq!(pool_of(2).slot_count(), 2);
    }
}

// Buffer utilities for vertex and index data
//
// Buffers are allocated through the device's allocator in CPU-to-GPU
// memory and filled through the mapped pointer, which is plenty for the
// small static meshes this renderer draws.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;

use super::error::{BackendError, Result};
use super::VulkanDevice;

/// A GPU buffer together with its backing allocation
pub struct MeshBuffer {
    pub buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

impl MeshBuffer {
    /// Create a buffer and fill it with `data`
    pub fn new_with_data<T: Copy>(
        device: &VulkanDevice,
        usage: vk::BufferUsageFlags,
        data: &[T],
    ) -> Result<Self> {
        let size = std::mem::size_of_val(data) as vk::DeviceSize;

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.device.create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.device.get_buffer_memory_requirements(buffer) };

        let allocation = device.allocator.lock().allocate(&AllocationCreateDesc {
            name: "mesh buffer",
            requirements,
            location: MemoryLocation::CpuToGpu,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        unsafe {
            device
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())?;
        }

        // CpuToGpu allocations come back persistently mapped
        let ptr = allocation.mapped_ptr().ok_or(BackendError::BufferMap)?;
        unsafe {
            (ptr.as_ptr() as *mut T).copy_from_nonoverlapping(data.as_ptr(), data.len());
        }

        log::debug!("Created {:?} buffer of {} bytes", usage, size);

        Ok(Self {
            buffer,
            allocation: Some(allocation),
        })
    }

    /// Release the allocation and the buffer handle.
    /// Must run before the device is destroyed.
    pub fn destroy(&mut self, device: &VulkanDevice) {
        if let Some(allocation) = self.allocation.take() {
            if let Err(e) = device.allocator.lock().free(allocation) {
                log::warn!("Failed to free buffer allocation: {e}");
            }
        }
        unsafe {
            device.device.destroy_buffer(self.buffer, None);
        }
        self.buffer = vk::Buffer::null();
    }
}

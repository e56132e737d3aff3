// Vulkan backend
//
// Thin wrappers over ash: the device stack, the swapchain with its
// dependent resources, per-frame sync objects, and the fixed pipeline.

pub mod buffer;
pub mod device;
pub mod error;
pub mod pipeline;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use device::VulkanDevice;
pub use error::{BackendError, Result};
pub use swapchain::Swapchain;

// Backend error type
//
// Every fallible backend call returns one of these coarse kinds; detail
// text rides along where a bare kind is not enough to act on.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Vulkan call failed: {0}")]
    Vulkan(#[from] ash::vk::Result),

    #[error("failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("GPU memory allocation failed: {0}")]
    Allocation(#[from] gpu_allocator::AllocationError),

    #[error("no Vulkan-capable GPU satisfies the renderer's requirements")]
    NoSuitableGpu,

    #[error("surface reports no supported formats")]
    NoSurfaceFormats,

    #[error("surface reports no supported present modes")]
    NoPresentModes,

    #[error("failed to read shader {path:?}: {source}")]
    ShaderIo { path: PathBuf, source: io::Error },

    #[error("host-visible buffer mapping unavailable")]
    BufferMap,
}

pub type Result<T> = std::result::Result<T, BackendError>;

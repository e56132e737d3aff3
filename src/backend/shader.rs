// Shader module loading
//
// Vulkan consumes SPIR-V bytecode. Shaders are compiled by build.rs and
// read back from disk at startup.

use std::io::Cursor;
use std::path::Path;

use ash::vk;

use super::error::{BackendError, Result};
use super::VulkanDevice;

/// Read a SPIR-V file and create a shader module from it
pub fn load_shader_module(device: &VulkanDevice, path: impl AsRef<Path>) -> Result<vk::ShaderModule> {
    let path = path.as_ref();

    let bytes = std::fs::read(path).map_err(|source| BackendError::ShaderIo {
        path: path.to_path_buf(),
        source,
    })?;

    // SPIR-V is a stream of 4-byte words; read_spv handles alignment and
    // endianness checks for us
    let code = ash::util::read_spv(&mut Cursor::new(&bytes)).map_err(|source| {
        BackendError::ShaderIo {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let create_info = vk::ShaderModuleCreateInfo::builder().code(&code);

    let module = unsafe { device.device.create_shader_module(&create_info, None)? };

    log::debug!("Loaded shader module from {:?} ({} words)", path, code.len());

    Ok(module)
}

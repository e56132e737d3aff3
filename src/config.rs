// Runtime configuration
//
// Settings come from config.toml next to the binary. Any missing file,
// section or key falls back to the defaults below, so a bare checkout
// runs without one. The parsed struct is built once in main and handed
// down; nothing else reads configuration state.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Quad Renderer".to_string(),
            width: 800,
            height: 600,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// One of: immediate, mailbox, fifo, fifo_relaxed
    pub present_mode: String,
    pub clear_color: [f32; 4],
    pub max_frames_in_flight: usize,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            present_mode: "mailbox".to_string(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            max_frames_in_flight: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub validation_layers: bool,
    pub show_fps: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
            show_fps: true,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::load_from_path("config.toml").unwrap_or_else(|e| {
            log::warn!("Ignoring config.toml ({e}), running with defaults");
            Config::default()
        })
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("No config file at {path:?}, running with defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path:?}"))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {path:?}"))?;

        log::info!("Configuration loaded from {path:?}");
        log::debug!("{config:?}");

        Ok(config)
    }

    /// Map the configured present-mode name onto the Vulkan enum.
    /// Unrecognized names fall back to mailbox with a warning; the
    /// swapchain still degrades further to FIFO if the surface lacks it.
    pub fn get_present_mode(&self) -> ash::vk::PresentModeKHR {
        use ash::vk::PresentModeKHR;

        let name = self.graphics.present_mode.to_lowercase();
        match name.as_str() {
            "immediate" => PresentModeKHR::IMMEDIATE,
            "mailbox" => PresentModeKHR::MAILBOX,
            "fifo" => PresentModeKHR::FIFO,
            "fifo_relaxed" => PresentModeKHR::FIFO_RELAXED,
            other => {
                log::warn!("Unknown present mode {other:?}, using mailbox");
                PresentModeKHR::MAILBOX
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_small_windowed_setup() {
        let config = Config::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert!(!config.window.fullscreen);
        assert_eq!(config.graphics.max_frames_in_flight, 2);
        assert_eq!(config.graphics.clear_color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [window]
            width = 1280
            height = 720

            [graphics]
            present_mode = "fifo"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.title, "Quad Renderer");
        assert_eq!(config.graphics.present_mode, "fifo");
        assert_eq!(config.graphics.max_frames_in_flight, 2);
    }

    #[test]
    fn present_mode_strings_map_to_vulkan_enums() {
        let mut config = Config::default();

        for (name, expected) in [
            ("immediate", ash::vk::PresentModeKHR::IMMEDIATE),
            ("mailbox", ash::vk::PresentModeKHR::MAILBOX),
            ("FIFO", ash::vk::PresentModeKHR::FIFO),
            ("fifo_relaxed", ash::vk::PresentModeKHR::FIFO_RELAXED),
            ("bogus", ash::vk::PresentModeKHR::MAILBOX),
        ] {
            config.graphics.present_mode = name.to_string();
            assert_eq!(config.get_present_mode(), expected, "mode {name}");
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from_path("does-not-exist.toml").unwrap();
        assert_eq!(config.window.width, 800);
    }
}

// window.rs — winit window creation.

use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window, WindowAttributes};

use crate::config::WindowConfig;

/// Translate config into winit window attributes.
pub fn build_attributes(config: &WindowConfig) -> WindowAttributes {
    let mut attrs = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.width, config.height))
        .with_resizable(config.resizable);

    if config.fullscreen {
        attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }

    attrs
}

/// Create the client window. Must be called from the event loop
/// (winit only allows window creation while the loop is active).
pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &WindowConfig,
) -> Result<Window, String> {
    event_loop
        .create_window(build_attributes(config))
        .map_err(|e| format!("Failed to create window: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_follow_config() {
        let config = WindowConfig {
            title: "test".to_string(),
            width: 640,
            height: 480,
            fullscreen: false,
            resizable: false,
        };

        let attrs = build_attributes(&config);
        assert_eq!(attrs.title, "test");
        assert!(!attrs.resizable);
        assert!(attrs.fullscreen.is_none());
        match attrs.inner_size {
            Some(winit::dpi::Size::Logical(size)) => {
                assert_eq!(size.width, 640.0);
                assert_eq!(size.height, 480.0);
            }
            other => panic!("unexpected inner size: {:?}", other),
        }
    }

    #[test]
    fn fullscreen_flag_sets_borderless() {
        let config = WindowConfig {
            fullscreen: true,
            ..WindowConfig::default()
        };
        assert!(build_attributes(&config).fullscreen.is_some());
    }
}

// ember-client — windowing, the Vulkan graphics bootstrap, and the
// fixed-timestep client loop.

pub mod client;
pub mod config;
pub mod game;
pub mod timing;
pub mod vulkan;
pub mod window;

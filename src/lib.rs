mod buffer;
mod config;
mod context;
mod error;
mod gaussian_blur;
mod grayscale;
pub mod host;
mod image_context;
mod kernel;
pub mod pixel;
mod pipeline;
pub mod status;
mod utils;

pub use self::buffer::*;
pub use self::config::*;
pub use self::context::*;
pub use self::error::*;
pub use self::gaussian_blur::*;
pub use self::grayscale::*;
pub use self::host::HostPipeline;
pub use self::image_context::*;
pub use self::kernel::*;
pub use self::pipeline::*;
pub use self::utils::*;

/// Kernel source with the `img_grayscale` and `img_gaussian_blur` entry
/// points.
pub const DEFAULT_KERNEL_SOURCE: &str = include_str!("shaders/kernels.wgsl");

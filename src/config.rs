use wgpu::DeviceType;

use crate::gaussian_blur::GaussianKernel;

/// Entry point of the grayscale stage in the kernel source.
pub const GRAYSCALE_ENTRY_POINT: &str = "img_grayscale";
/// Entry point of the blur stage in the kernel source.
pub const GAUSSIAN_BLUR_ENTRY_POINT: &str = "img_gaussian_blur";

pub const GRAYSCALE_LOCAL_SIZE: u32 = 64;
pub const GAUSSIAN_BLUR_LOCAL_SIZE: [u32; 2] = [32, 32];

/// Class of compute device to run on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceClass {
    /// Software / CPU adapters.
    #[default]
    Cpu,
    Gpu,
    Any,
}

impl DeviceClass {
    pub fn matches(self, device_type: DeviceType) -> bool {
        match self {
            DeviceClass::Cpu => device_type == DeviceType::Cpu,
            DeviceClass::Gpu => matches!(
                device_type,
                DeviceType::DiscreteGpu | DeviceType::IntegratedGpu | DeviceType::VirtualGpu
            ),
            DeviceClass::Any => true,
        }
    }
}

/// Settings for a grayscale + blur run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub device: DeviceClass,
    pub grayscale_entry_point: String,
    pub blur_entry_point: String,
    pub grayscale_local_size: u32,
    pub blur_local_size: [u32; 2],
    pub kernel: GaussianKernel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            device: DeviceClass::default(),
            grayscale_entry_point: GRAYSCALE_ENTRY_POINT.to_string(),
            blur_entry_point: GAUSSIAN_BLUR_ENTRY_POINT.to_string(),
            grayscale_local_size: GRAYSCALE_LOCAL_SIZE,
            blur_local_size: GAUSSIAN_BLUR_LOCAL_SIZE,
            kernel: GaussianKernel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_classes_filter_adapter_types() {
        assert!(DeviceClass::Cpu.matches(DeviceType::Cpu));
        assert!(!DeviceClass::Cpu.matches(DeviceType::DiscreteGpu));
        assert!(DeviceClass::Gpu.matches(DeviceType::IntegratedGpu));
        assert!(!DeviceClass::Gpu.matches(DeviceType::Cpu));
        assert!(DeviceClass::Any.matches(DeviceType::Other));
    }

    #[test]
    fn defaults_match_reference_partition() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.device, DeviceClass::Cpu);
        assert_eq!(cfg.grayscale_local_size, 64);
        assert_eq!(cfg.blur_local_size, [32, 32]);
        assert_eq!(cfg.kernel.dim(), 5);
    }
}

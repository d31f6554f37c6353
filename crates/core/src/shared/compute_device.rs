use std::fmt;

/// Where the speech model runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputeDevice {
    Cuda,
    Cpu,
}

impl ComputeDevice {
    /// Picks CUDA when the binary was built with GPU support, CPU otherwise.
    pub fn detect() -> Self {
        if cfg!(feature = "cuda") {
            ComputeDevice::Cuda
        } else {
            ComputeDevice::Cpu
        }
    }

    /// Resolves an optional explicit choice, falling back to [`ComputeDevice::detect`].
    pub fn select(requested: Option<ComputeDevice>) -> Self {
        requested.unwrap_or_else(Self::detect)
    }

    pub fn uses_gpu(self) -> bool {
        self == ComputeDevice::Cuda
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Cuda => f.write_str("cuda"),
            ComputeDevice::Cpu => f.write_str("cpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_choice_wins() {
        assert_eq!(
            ComputeDevice::select(Some(ComputeDevice::Cpu)),
            ComputeDevice::Cpu
        );
        assert_eq!(
            ComputeDevice::select(Some(ComputeDevice::Cuda)),
            ComputeDevice::Cuda
        );
    }

    #[test]
    fn test_auto_matches_detect() {
        assert_eq!(ComputeDevice::select(None), ComputeDevice::detect());
    }

    #[test]
    fn test_display() {
        assert_eq!(ComputeDevice::Cuda.to_string(), "cuda");
        assert_eq!(ComputeDevice::Cpu.to_string(), "cpu");
        assert!(ComputeDevice::Cuda.uses_gpu());
        assert!(!ComputeDevice::Cpu.uses_gpu());
    }
}

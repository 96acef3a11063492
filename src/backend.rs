//! Backend selection - NdArray (CPU) always, CUDA (GPU) when compiled in
//!
//! Device choice is an explicit configuration value ([`DeviceKind`]) that is
//! resolved once at startup and handed to the training pipeline. Asking for an
//! accelerator that is not available degrades to the CPU backend.

use burn::backend::Autodiff;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// CPU backend used for fallback and tests
pub type CpuBackend = burn_ndarray::NdArray<f32>;

/// Autodiff CPU backend for training
pub type CpuTrainingBackend = Autodiff<CpuBackend>;

#[cfg(feature = "cuda")]
pub type AcceleratorBackend = burn_cuda::Cuda;

#[cfg(feature = "cuda")]
pub type AcceleratorTrainingBackend = Autodiff<AcceleratorBackend>;

/// Requested compute device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Accelerator when available, CPU otherwise
    #[default]
    Auto,
    /// Always run on the CPU backend
    Cpu,
    /// Prefer the accelerator; falls back to CPU when unavailable
    Accelerator,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Auto => write!(f, "auto"),
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Accelerator => write!(f, "accelerator"),
        }
    }
}

/// Device the run actually executes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedDevice {
    /// NdArray on the host processor
    Cpu,
    /// CUDA device with the given ordinal
    Accelerator(usize),
}

impl std::fmt::Display for ResolvedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedDevice::Cpu => write!(f, "CPU (NdArray)"),
            ResolvedDevice::Accelerator(id) => write!(f, "GPU:{} (CUDA)", id),
        }
    }
}

/// Whether this binary was built with an accelerator backend
pub fn accelerator_compiled() -> bool {
    cfg!(feature = "cuda")
}

/// Resolve a requested device against what is compiled in and present
pub fn resolve_device(kind: DeviceKind) -> ResolvedDevice {
    resolve_with(kind, accelerator_compiled() && has_nvidia_gpu())
}

fn resolve_with(kind: DeviceKind, accelerator_usable: bool) -> ResolvedDevice {
    let resolved = match kind {
        DeviceKind::Cpu => ResolvedDevice::Cpu,
        DeviceKind::Auto if accelerator_usable => ResolvedDevice::Accelerator(0),
        DeviceKind::Auto => ResolvedDevice::Cpu,
        DeviceKind::Accelerator if accelerator_usable => ResolvedDevice::Accelerator(0),
        DeviceKind::Accelerator => {
            warn!("Accelerator requested but not available - falling back to CPU");
            ResolvedDevice::Cpu
        }
    };

    info!("Requested device '{}' resolved to {}", kind, resolved);
    resolved
}

/// Check for an NVIDIA GPU (CUDA)
pub fn has_nvidia_gpu() -> bool {
    #[cfg(target_os = "linux")]
    {
        std::path::Path::new("/proc/driver/nvidia/version").exists()
            || std::path::Path::new("/dev/nvidia0").exists()
            || nvidia_smi_succeeds("nvidia-smi")
    }

    #[cfg(target_os = "windows")]
    {
        nvidia_smi_succeeds("nvidia-smi.exe")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        false
    }
}

#[cfg(any(target_os = "linux", target_os = "windows"))]
fn nvidia_smi_succeeds(program: &str) -> bool {
    std::process::Command::new(program)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Print device detection results
pub fn print_device_info() {
    println!("🔍 Device detection:");
    println!(
        "  CUDA backend compiled: {}",
        if accelerator_compiled() { "✓ yes" } else { "✗ no (build with --features cuda)" }
    );
    println!(
        "  NVIDIA GPU:            {}",
        if has_nvidia_gpu() { "✓ detected" } else { "✗ not found" }
    );
    println!("  `--device auto` runs on: {}", resolve_device(DeviceKind::Auto));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_is_always_cpu() {
        assert_eq!(resolve_with(DeviceKind::Cpu, true), ResolvedDevice::Cpu);
        assert_eq!(resolve_with(DeviceKind::Cpu, false), ResolvedDevice::Cpu);
    }

    #[test]
    fn test_auto_prefers_accelerator() {
        assert_eq!(
            resolve_with(DeviceKind::Auto, true),
            ResolvedDevice::Accelerator(0)
        );
        assert_eq!(resolve_with(DeviceKind::Auto, false), ResolvedDevice::Cpu);
    }

    #[test]
    fn test_missing_accelerator_degrades_to_cpu() {
        assert_eq!(
            resolve_with(DeviceKind::Accelerator, false),
            ResolvedDevice::Cpu
        );
    }

    #[test]
    fn test_device_display() {
        assert_eq!(DeviceKind::Accelerator.to_string(), "accelerator");
        assert_eq!(ResolvedDevice::Accelerator(1).to_string(), "GPU:1 (CUDA)");
    }
}

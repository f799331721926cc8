use candle_core::Device;
use tracing::{debug, warn};

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::info;

use super::error::EmbeddingError;

/// Picks the first usable accelerator compiled in, else the CPU.
///
/// Metal is tried before CUDA. Accelerator failures are logged, never fatal.
pub fn select_device() -> Result<Device, EmbeddingError> {
    #[allow(unused_mut)]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!("Embedding on Metal GPU");
            return Ok(device);
        }
        Err(e) => {
            warn!(error = %e, "Metal device unavailable");
            failures.push(format!("metal: {e}"));
        }
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("Embedding on CUDA GPU");
            return Ok(device);
        }
        Err(e) => {
            warn!(error = %e, "CUDA device unavailable");
            failures.push(format!("cuda: {e}"));
        }
    }

    if failures.is_empty() {
        debug!("No GPU backend compiled, embedding on CPU");
    } else {
        warn!(reason = %failures.join("; "), "Falling back to CPU device");
    }
    Ok(Device::Cpu)
}

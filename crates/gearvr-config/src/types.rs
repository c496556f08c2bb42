use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Orientation filter configuration.
    pub fusion: FusionConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Fusion algorithm name: "Madgwick" or "Mahony".
    pub algorithm: String,
    /// Nominal time between sensor frames in seconds. Overridden per
    /// update when the caller supplies a measured delta.
    pub sample_interval_s: f64,
    /// Madgwick convergence gain. Higher = more responsive, less smooth.
    /// The filter is sensitive to the interval/beta pairing.
    pub beta: f64,
    /// Mahony proportional gain.
    pub kp: f64,
    /// Mahony integral gain; 0 disables bias accumulation.
    pub ki: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            algorithm: "Madgwick".to_string(),
            sample_interval_s: 0.068_846_815_834_536_57,
            beta: 0.352,
            kp: 0.1,
            ki: 0.0,
        }
    }
}

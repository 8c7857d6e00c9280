//! Snap configuration
//!
//! The connector geometry constants were tuned empirically against specific
//! object scales, so they are configuration rather than literals. The
//! defaults keep the original content's ratio (edge offset ≈ snap
//! threshold); change them together or existing puzzles will feel wrong.

use crate::error::ConfigError;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Geometry constants for snap detection
///
/// # Example
///
/// ```
/// use pairlink_connect::SnapConfig;
///
/// let config = SnapConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.connector_half_length, config.snap_threshold);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Half the connector length: how far each edge point sits from the
    /// object's position along the connector axis
    pub connector_half_length: f32,
    /// Edge-to-edge distance below which a candidate pair snaps
    pub snap_threshold: f32,
    /// Local axis along which connector edges are offset
    pub connector_axis: Vec3,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            connector_half_length: 0.25,
            snap_threshold: 0.25,
            connector_axis: Vec3::X,
        }
    }
}

impl SnapConfig {
    /// Check the configuration for degenerate values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.connector_half_length > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "connector_half_length",
            });
        }
        if !(self.snap_threshold > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "snap_threshold",
            });
        }
        if self.connector_axis.length_squared() == 0.0 {
            return Err(ConfigError::ZeroAxis);
        }
        Ok(())
    }

    /// The connector axis scaled to unit length
    pub fn unit_axis(&self) -> Vec3 {
        self.connector_axis.normalize()
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    /// Horizontal gap between neighbors on a rank.
    pub node_spacing: f32,
    /// Vertical gap between generations.
    pub rank_spacing: f32,
    /// Minimum x and minimum y after normalization.
    pub margin: f32,
    /// Down/up sweeps of the crossing-reduction ordering.
    pub order_passes: usize,
    /// Down/up sweeps of the coordinate alignment.
    pub alignment_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 150.0,
            node_height: 80.0,
            node_spacing: 50.0,
            rank_spacing: 100.0,
            margin: 40.0,
            order_passes: 4,
            alignment_passes: 2,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    margin: Option<f32>,
    order_passes: Option<usize>,
    alignment_passes: Option<usize>,
}

/// Loads a partial camelCase JSON override on top of the defaults. No path
/// means pure defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let mut config = LayoutConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(v) = parsed.node_width {
        config.node_width = v;
    }
    if let Some(v) = parsed.node_height {
        config.node_height = v;
    }
    if let Some(v) = parsed.node_spacing {
        config.node_spacing = v;
    }
    if let Some(v) = parsed.rank_spacing {
        config.rank_spacing = v;
    }
    if let Some(v) = parsed.margin {
        config.margin = v;
    }
    if let Some(v) = parsed.order_passes {
        config.order_passes = v;
    }
    if let Some(v) = parsed.alignment_passes {
        config.alignment_passes = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let parsed: ConfigFile =
            serde_json::from_str(r#"{"nodeSpacing": 32.0, "orderPasses": 8}"#).unwrap();
        let mut config = LayoutConfig::default();
        if let Some(v) = parsed.node_spacing {
            config.node_spacing = v;
        }
        if let Some(v) = parsed.order_passes {
            config.order_passes = v;
        }
        assert_eq!(config.node_spacing, 32.0);
        assert_eq!(config.order_passes, 8);
        assert_eq!(config.node_width, LayoutConfig::default().node_width);
    }
}

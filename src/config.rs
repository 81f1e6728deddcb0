use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::layout::LayoutMode;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutMode,
    pub physics: PhysicsConfig,
    pub viewport: ViewportConfig,
    pub hierarchy: HierarchyConfig,
    pub interaction: InteractionConfig,
    pub theme: ThemeConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Rest length of every link spring.
    pub link_distance: f32,
    /// Repulsion numerator; the force falls off with the squared distance.
    pub charge_strength: f32,
    /// Distances below this are clamped before computing repulsion.
    pub distance_min: f32,
    pub center_strength: f32,
    pub collision_strength: f32,
    pub collision_padding: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub max_force: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            link_distance: 100.0,
            charge_strength: 20_000.0,
            distance_min: 20.0,
            center_strength: 0.1,
            collision_strength: 0.7,
            collision_padding: 2.0,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            max_force: 60.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub zoom_in_step: f32,
    pub zoom_out_step: f32,
    pub wheel_sensitivity: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 4.0,
            zoom_in_step: 1.3,
            zoom_out_step: 0.7,
            wheel_sensitivity: 0.0018,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub sibling_spacing: f32,
    pub level_spacing: f32,
    pub top_margin: f32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            sibling_spacing: 70.0,
            level_spacing: 110.0,
            top_margin: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel in pixels below which a press-release counts as a click.
    pub click_slop: f32,
    pub label_max_chars: usize,
    pub tooltips: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_slop: 3.0,
            label_max_chars: 15,
            tooltips: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub nodes: BTreeMap<String, NodeStyleSpec>,
    pub edges: BTreeMap<String, EdgeStyleSpec>,
    pub cross_edge: Option<EdgeStyleSpec>,
    pub replace_defaults: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeStyleSpec {
    pub color: String,
    pub size: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyleSpec {
    pub color: String,
    pub width: f32,
    #[serde(default)]
    pub dash: Option<[f32; 2]>,
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.viewport.validate()?;

        let hierarchy = &self.hierarchy;
        positive("hierarchy.sibling_spacing", hierarchy.sibling_spacing)?;
        positive("hierarchy.level_spacing", hierarchy.level_spacing)?;
        finite("hierarchy.top_margin", hierarchy.top_margin)?;

        finite("interaction.click_slop", self.interaction.click_slop)?;
        if self.interaction.label_max_chars < 4 {
            return Err(ConfigError::InvalidValue {
                field: "interaction.label_max_chars",
                reason: "must leave room for at least one character and an ellipsis".to_owned(),
            });
        }
        Ok(())
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("physics.link_distance", self.link_distance)?;
        finite("physics.charge_strength", self.charge_strength)?;
        positive("physics.distance_min", self.distance_min)?;
        finite("physics.center_strength", self.center_strength)?;
        finite("physics.collision_strength", self.collision_strength)?;
        finite("physics.collision_padding", self.collision_padding)?;
        unit_interval("physics.velocity_decay", self.velocity_decay)?;
        unit_interval("physics.alpha_min", self.alpha_min)?;
        unit_interval("physics.alpha_decay", self.alpha_decay)?;
        if self.alpha_decay == 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "physics.alpha_decay",
                reason: "a zero decay never lets the simulation settle".to_owned(),
            });
        }
        positive("physics.max_force", self.max_force)
    }
}

impl ViewportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("viewport.min_scale", self.min_scale)?;
        positive("viewport.max_scale", self.max_scale)?;
        if self.min_scale > self.max_scale {
            return Err(ConfigError::InvalidValue {
                field: "viewport.min_scale",
                reason: format!(
                    "{} is larger than max_scale {}",
                    self.min_scale, self.max_scale
                ),
            });
        }
        positive("viewport.zoom_in_step", self.zoom_in_step)?;
        positive("viewport.zoom_out_step", self.zoom_out_step)?;
        finite("viewport.wheel_sensitivity", self.wheel_sensitivity)
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} is not finite"),
        })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} must be greater than zero"),
        })
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} must be within [0, 1)"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{"layout": "hierarchy", "physics": {"link_distance": 60.0}, "viewport": {"max_scale": 8.0}}"#,
        )
        .expect("config parses");

        assert_eq!(config.layout, LayoutMode::Hierarchy);
        assert_eq!(config.physics.link_distance, 60.0);
        assert_eq!(config.physics.velocity_decay, 0.4);
        assert_eq!(config.viewport.max_scale, 8.0);
        assert_eq!(config.viewport.min_scale, 0.1);
    }

    #[test]
    fn inverted_scale_range_is_rejected() {
        let error = EngineConfig::from_json_str(r#"{"viewport": {"min_scale": 5.0}}"#)
            .expect_err("min above max");
        assert!(matches!(
            error,
            ConfigError::InvalidValue {
                field: "viewport.min_scale",
                ..
            }
        ));
    }

    #[test]
    fn default_alpha_decay_settles_in_about_three_hundred_ticks() {
        let physics = PhysicsConfig::default();
        let ticks = (physics.alpha_min.ln() / (1.0 - physics.alpha_decay).ln()).ceil();
        assert!((299.0..=301.0).contains(&ticks));
    }
}

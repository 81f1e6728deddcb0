use std::collections::HashMap;

use eframe::egui::Color32;
use tracing::debug;

use crate::config::{EdgeStyleSpec, NodeStyleSpec, ThemeConfig};
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub color: Color32,
    /// Diameter in world units; the collision and hit radius is half of it.
    pub size: f32,
}

impl NodeStyle {
    pub const fn new(color: Color32, size: f32) -> Self {
        Self { color, size }
    }

    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
    pub color: Color32,
    pub width: f32,
    /// `[dash_length, gap_length]`, solid when absent.
    pub dash: Option<[f32; 2]>,
}

impl EdgeStyle {
    pub const fn solid(color: Color32, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub const fn dashed(color: Color32, width: f32, dash: [f32; 2]) -> Self {
        Self {
            color,
            width,
            dash: Some(dash),
        }
    }
}

/// Type-keyed style lookup. The default entry is a constructor argument, so
/// a table without one cannot exist.
#[derive(Clone, Debug)]
pub struct StyleTable<S> {
    default: S,
    by_type: HashMap<String, S>,
}

impl<S> StyleTable<S> {
    pub fn new(default: S) -> Self {
        Self {
            default,
            by_type: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: impl Into<String>, style: S) -> Self {
        self.insert(kind, style);
        self
    }

    pub fn insert(&mut self, kind: impl Into<String>, style: S) {
        let kind = kind.into();
        if kind == "default" {
            self.default = style;
        } else {
            self.by_type.insert(kind, style);
        }
    }

    pub fn default_style(&self) -> &S {
        &self.default
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.by_type.contains_key(kind)
    }

    pub fn resolve(&self, kind: Option<&str>) -> &S {
        match kind {
            Some(kind) => self.by_type.get(kind).unwrap_or_else(|| {
                debug!(kind, "unknown style type, using default");
                &self.default
            }),
            None => &self.default,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub nodes: StyleTable<NodeStyle>,
    pub edges: StyleTable<EdgeStyle>,
    /// Used for hierarchy edges that reach an already placed node.
    pub cross_edge: EdgeStyle,
}

impl Default for Theme {
    fn default() -> Self {
        let nodes = StyleTable::new(NodeStyle::new(Color32::from_rgb(96, 125, 139), 20.0))
            .with("page", NodeStyle::new(Color32::from_rgb(76, 175, 80), 25.0))
            .with("external", NodeStyle::new(Color32::from_rgb(255, 87, 34), 20.0))
            .with("element", NodeStyle::new(Color32::from_rgb(33, 150, 243), 20.0))
            .with("semantic", NodeStyle::new(Color32::from_rgb(156, 39, 176), 22.0))
            .with("collapsed", NodeStyle::new(Color32::from_rgb(255, 152, 0), 18.0))
            .with("orphan", NodeStyle::new(Color32::from_rgb(233, 30, 99), 20.0));

        let edges = StyleTable::new(EdgeStyle::solid(Color32::from_gray(136), 1.0))
            .with("child", EdgeStyle::solid(Color32::from_gray(102), 1.5))
            .with("internal", EdgeStyle::solid(Color32::from_rgb(76, 175, 80), 2.0))
            .with(
                "external",
                EdgeStyle::dashed(Color32::from_rgb(255, 87, 34), 1.5, [5.0, 5.0]),
            )
            .with(
                "bidirectional",
                EdgeStyle::solid(Color32::from_rgb(33, 150, 243), 2.5),
            );

        Self {
            nodes,
            edges,
            cross_edge: EdgeStyle::dashed(
                Color32::from_rgba_unmultiplied(158, 158, 158, 150),
                1.0,
                [4.0, 4.0],
            ),
        }
    }
}

impl Theme {
    pub fn resolve_node(&self, kind: Option<&str>) -> &NodeStyle {
        self.nodes.resolve(kind)
    }

    pub fn resolve_edge(&self, kind: Option<&str>) -> &EdgeStyle {
        self.edges.resolve(kind)
    }

    /// Builds a theme from configuration. Tables extend the built-in theme
    /// unless `replace_defaults` is set, in which case each table must name
    /// its own `default` entry.
    pub fn from_config(config: &ThemeConfig) -> Result<Self, ConfigError> {
        let builtin = Self::default();

        let nodes = if config.replace_defaults {
            let entry = config
                .nodes
                .get("default")
                .ok_or(ConfigError::MissingDefaultStyle { table: "nodes" })?;
            StyleTable::new(node_style(entry)?)
        } else {
            builtin.nodes
        };
        let edges = if config.replace_defaults {
            let entry = config
                .edges
                .get("default")
                .ok_or(ConfigError::MissingDefaultStyle { table: "edges" })?;
            StyleTable::new(edge_style(entry)?)
        } else {
            builtin.edges
        };

        let mut theme = Self {
            nodes,
            edges,
            cross_edge: builtin.cross_edge,
        };
        for (kind, entry) in &config.nodes {
            theme.nodes.insert(kind.as_str(), node_style(entry)?);
        }
        for (kind, entry) in &config.edges {
            theme.edges.insert(kind.as_str(), edge_style(entry)?);
        }
        if let Some(entry) = &config.cross_edge {
            theme.cross_edge = edge_style(entry)?;
        }

        Ok(theme)
    }
}

fn parse_color(value: &str) -> Result<Color32, ConfigError> {
    Color32::from_hex(value).map_err(|_| ConfigError::InvalidColor {
        value: value.to_owned(),
    })
}

fn node_style(entry: &NodeStyleSpec) -> Result<NodeStyle, ConfigError> {
    if !entry.size.is_finite() || entry.size <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "theme.nodes.size",
            reason: format!("{} is not a positive size", entry.size),
        });
    }
    Ok(NodeStyle::new(parse_color(&entry.color)?, entry.size))
}

fn edge_style(entry: &EdgeStyleSpec) -> Result<EdgeStyle, ConfigError> {
    if !entry.width.is_finite() || entry.width <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "theme.edges.width",
            reason: format!("{} is not a positive width", entry.width),
        });
    }
    if let Some(dash) = entry.dash
        && dash.iter().any(|part| !part.is_finite() || *part <= 0.0)
    {
        return Err(ConfigError::InvalidValue {
            field: "theme.edges.dash",
            reason: format!("{dash:?} must be two positive lengths"),
        });
    }
    Ok(EdgeStyle {
        color: parse_color(&entry.color)?,
        width: entry.width,
        dash: entry.dash,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn known_types_resolve_to_their_style() {
        let theme = Theme::default();
        assert_eq!(theme.resolve_node(Some("page")).size, 25.0);
        assert_eq!(
            theme.resolve_edge(Some("external")).dash,
            Some([5.0, 5.0])
        );
    }

    #[test]
    fn unknown_and_absent_types_fall_back_to_default() {
        let theme = Theme::default();
        let default = *theme.nodes.default_style();
        assert_eq!(*theme.resolve_node(Some("spaceship")), default);
        assert_eq!(*theme.resolve_node(None), default);
        assert_eq!(
            *theme.resolve_edge(Some("")),
            *theme.edges.default_style()
        );
    }

    #[test]
    fn inserting_default_replaces_the_fallback() {
        let table = StyleTable::new(1).with("a", 2).with("default", 3);
        assert_eq!(*table.resolve(Some("missing")), 3);
        assert!(!table.contains("default"));
    }

    #[test]
    fn config_extends_builtin_theme() {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "form".to_owned(),
            NodeStyleSpec {
                color: "#123456".to_owned(),
                size: 30.0,
            },
        );
        let theme = Theme::from_config(&ThemeConfig {
            nodes,
            ..ThemeConfig::default()
        })
        .expect("theme builds");

        assert_eq!(
            theme.resolve_node(Some("form")).color,
            Color32::from_rgb(0x12, 0x34, 0x56)
        );
        assert_eq!(theme.resolve_node(Some("page")).size, 25.0);
    }

    #[test]
    fn replacing_tables_requires_a_default_entry() {
        let error = Theme::from_config(&ThemeConfig {
            replace_defaults: true,
            ..ThemeConfig::default()
        })
        .expect_err("no default entry");
        assert!(matches!(
            error,
            ConfigError::MissingDefaultStyle { table: "nodes" }
        ));
    }

    #[test]
    fn bad_colors_are_reported() {
        let mut edges = BTreeMap::new();
        edges.insert(
            "internal".to_owned(),
            EdgeStyleSpec {
                color: "green".to_owned(),
                width: 1.0,
                dash: None,
            },
        );
        let error = Theme::from_config(&ThemeConfig {
            edges,
            ..ThemeConfig::default()
        })
        .expect_err("color is not hex");
        assert!(matches!(error, ConfigError::InvalidColor { .. }));
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod hierarchy;
pub mod radial;

pub use hierarchy::TreePlan;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Force,
    #[serde(alias = "tree")]
    #[value(alias = "tree")]
    Hierarchy,
    Radial,
}

impl LayoutMode {
    pub const ALL: [Self; 3] = [Self::Force, Self::Hierarchy, Self::Radial];

    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Hierarchy => "Hierarchy",
            Self::Radial => "Radial",
        }
    }

    pub fn is_tree(self) -> bool {
        matches!(self, Self::Hierarchy | Self::Radial)
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How an edge participates in the active layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeRole {
    /// Force layout spring.
    Link,
    /// Parent -> child edge of a hierarchy.
    Tree,
    /// Hierarchy edge into an already placed node, drawn as an extra link.
    Cross,
}

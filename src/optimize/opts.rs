use crate::foundation::error::{FrameIrError, FrameIrResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Switches for the optimizer's rewrite rules.
///
/// Every rule is on by default. Turning one off suppresses exactly that rule; the others still
/// run over whatever tree shape is left.
pub struct OptimizeOpts {
    /// Collapse chains of single-child transforms into one transform.
    pub merge_transforms: bool,
    /// Squash a material into its sole child material when nothing else needs it.
    pub squash_materials: bool,
    /// Splice away transforms whose matrix is exactly the identity.
    pub remove_identity_transforms: bool,
}

impl Default for OptimizeOpts {
    fn default() -> Self {
        Self {
            merge_transforms: true,
            squash_materials: true,
            remove_identity_transforms: true,
        }
    }
}

impl OptimizeOpts {
    /// Options with every rule disabled; optimizing with these returns the input unchanged.
    pub fn none() -> Self {
        Self {
            merge_transforms: false,
            squash_materials: false,
            remove_identity_transforms: false,
        }
    }

    /// Whether at least one rule is enabled.
    pub fn any_enabled(&self) -> bool {
        self.merge_transforms || self.squash_materials || self.remove_identity_transforms
    }

    /// Parse options from JSON. Missing keys keep their defaults.
    pub fn from_json_str(s: &str) -> FrameIrResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| FrameIrError::serde(format!("parse optimizer options JSON: {e}")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// Counters describing what one optimizer call did.
pub struct OptimizeStats {
    /// Composite nodes visited (leaves are not counted).
    pub nodes_visited: u64,
    /// Transform pairs merged.
    pub transforms_merged: u64,
    /// Material pairs squashed.
    pub materials_squashed: u64,
    /// Identity transforms spliced away.
    pub identity_transforms_removed: u64,
}

impl OptimizeStats {
    /// Total rewrites applied.
    pub fn rewrites(&self) -> u64 {
        self.transforms_merged + self.materials_squashed + self.identity_transforms_removed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/optimize/opts.rs"]
mod tests;

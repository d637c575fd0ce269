//! Snapshot of the active states of a running service.

use serde::{Deserialize, Serialize};

/// Active path of one region, from the region root down to the leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPath {
    pub region: String,
    pub path: Vec<String>,
}

impl RegionPath {
    pub fn leaf(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

/// The active configuration: exactly one active path per region.
///
/// # Example
///
/// ```rust
/// use stagecraft::service::{ActiveConfiguration, RegionPath};
///
/// let configuration = ActiveConfiguration::new(vec![
///     RegionPath {
///         region: "lower-body".to_string(),
///         path: vec!["lower-body".to_string(), "idle".to_string()],
///     },
///     RegionPath {
///         region: "upper-body".to_string(),
///         path: vec!["upper-body".to_string(), "attack-start".to_string()],
///     },
/// ]);
///
/// assert_eq!(configuration.leaf("upper-body"), Some("attack-start"));
/// assert!(configuration.is_active("lower-body", "idle"));
/// assert_eq!(configuration.leaves().collect::<Vec<_>>(), vec!["idle", "attack-start"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConfiguration {
    regions: Vec<RegionPath>,
}

impl ActiveConfiguration {
    pub fn new(regions: Vec<RegionPath>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &[RegionPath] {
        &self.regions
    }

    pub fn path(&self, region: &str) -> Option<&[String]> {
        self.regions
            .iter()
            .find(|r| r.region == region)
            .map(|r| r.path.as_slice())
    }

    pub fn leaf(&self, region: &str) -> Option<&str> {
        self.regions
            .iter()
            .find(|r| r.region == region)
            .and_then(RegionPath::leaf)
    }

    /// Active leaf of every region, in region order.
    pub fn leaves(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().filter_map(RegionPath::leaf)
    }

    /// Whether `state` lies on the active path of `region`.
    pub fn is_active(&self, region: &str, state: &str) -> bool {
        self.path(region)
            .is_some_and(|path| path.iter().any(|s| s == state))
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

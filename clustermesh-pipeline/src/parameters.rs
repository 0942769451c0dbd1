//! Clustering parameters record
//!
//! The clustering stage reads a small JSON document:
//!
//! ```json
//! { "nClusters": 120, "distanceThreshold": null, "affinity": "euclidean", "linkage": "ward", "showCharts": false }
//! ```
//!
//! Exactly one of `nClusters` and `distanceThreshold` is set.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use clustermesh_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Distance metric used by the clustering stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affinity {
    #[default]
    Euclidean,
    L1,
    L2,
    Manhattan,
    Cosine,
}

impl Affinity {
    pub const ALL: [Affinity; 5] = [
        Affinity::Euclidean,
        Affinity::L1,
        Affinity::L2,
        Affinity::Manhattan,
        Affinity::Cosine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Affinity::Euclidean => "euclidean",
            Affinity::L1 => "l1",
            Affinity::L2 => "l2",
            Affinity::Manhattan => "manhattan",
            Affinity::Cosine => "cosine",
        }
    }
}

/// Linkage criterion used by the clustering stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    #[default]
    Ward,
    Complete,
    Average,
    Single,
}

impl Linkage {
    pub const ALL: [Linkage; 4] = [
        Linkage::Ward,
        Linkage::Complete,
        Linkage::Average,
        Linkage::Single,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Linkage::Ward => "ward",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Single => "single",
        }
    }
}

macro_rules! impl_name_conversions {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let lower = s.trim().to_ascii_lowercase();
                $ty::ALL
                    .into_iter()
                    .find(|v| v.as_str() == lower)
                    .ok_or_else(|| {
                        let known: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        Error::Configuration(format!(
                            "unknown {} '{}', expected one of: {}",
                            $what,
                            s,
                            known.join(", ")
                        ))
                    })
            }
        }
    };
}

impl_name_conversions!(Affinity, "affinity");
impl_name_conversions!(Linkage, "linkage");

/// Parameters handed to the clustering stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringParameters {
    pub n_clusters: Option<u64>,
    pub distance_threshold: Option<u64>,
    pub affinity: Affinity,
    pub linkage: Linkage,
    pub show_charts: bool,
}

impl ClusteringParameters {
    /// Keep `percent` % of `vertex_count` vertices, clustered with euclidean
    /// affinity and ward linkage.
    pub fn regular(vertex_count: usize, percent: f32) -> Result<Self> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(Error::Configuration(format!(
                "simplification percent must be within [0, 100], got {}",
                percent
            )));
        }
        let n_clusters = (vertex_count as f64 * f64::from(percent) / 100.0).floor() as u64;
        Self::with_cluster_count(n_clusters, Affinity::Euclidean, Linkage::Ward)
    }

    /// Stop clustering at `n_clusters` clusters.
    pub fn with_cluster_count(n_clusters: u64, affinity: Affinity, linkage: Linkage) -> Result<Self> {
        let parameters = Self {
            n_clusters: Some(n_clusters),
            distance_threshold: None,
            affinity,
            linkage,
            show_charts: false,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// Stop clustering once the linkage distance exceeds `distance_threshold`.
    pub fn with_distance_threshold(
        distance_threshold: u64,
        affinity: Affinity,
        linkage: Linkage,
    ) -> Result<Self> {
        let parameters = Self {
            n_clusters: None,
            distance_threshold: Some(distance_threshold),
            affinity,
            linkage,
            show_charts: false,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn with_show_charts(mut self, show_charts: bool) -> Self {
        self.show_charts = show_charts;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match (self.n_clusters, self.distance_threshold) {
            (Some(0), _) => {
                return Err(Error::Configuration(
                    "nClusters must be positive".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(Error::Configuration(
                    "nClusters and distanceThreshold are mutually exclusive".to_string(),
                ))
            }
            (None, None) => {
                return Err(Error::Configuration(
                    "one of nClusters or distanceThreshold must be set".to_string(),
                ))
            }
            _ => {}
        }
        if self.linkage == Linkage::Ward && self.affinity != Affinity::Euclidean {
            return Err(Error::Configuration(format!(
                "ward linkage requires euclidean affinity, got {}",
                self.affinity
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let parameters: Self =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Write the record to `path`. The parent directory must already exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(Error::Configuration(format!(
                    "Directory \"{}\" does not exist",
                    parent.display()
                )));
            }
        }
        info!("Saving clustering parameters to {:?}", path);
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }
}

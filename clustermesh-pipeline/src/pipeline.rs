//! Six-task simplification pipeline
//!
//! 1. Export the mesh vertices for the clustering stage
//! 2. Save the clustering parameters
//! 3. Run the clustering stage
//! 4. Rebuild the cluster forest from the merge log
//! 5. Collapse the mesh
//! 6. Save the simplified mesh
//!
//! The first failing task aborts the run; the output mesh is only written
//! once tasks 1 to 5 have succeeded.

use std::fs;
use std::path::PathBuf;

use clustermesh_core::{Drawable, Result, TriangleMesh};
use clustermesh_io::{write_mesh, NamingScheme, VertexCsvWriter};
use clustermesh_simplification::{build_forest, collapse_with_stats, CollapseStats, MergeLog};
use tracing::{debug, info};

use crate::parameters::{Affinity, ClusteringParameters, Linkage};
use crate::paths::SimplificationPaths;
use crate::runner::{ClusteringJob, ClusteringRunner};

const TASK_COUNT: usize = 6;

/// How the clustering stage is told where to stop
#[derive(Debug, Clone, PartialEq)]
pub enum SimplificationSettings {
    /// Keep a percentage of the vertices; euclidean affinity, ward linkage
    Regular { percent: f32 },
    ClusterCount {
        n_clusters: u64,
        affinity: Affinity,
        linkage: Linkage,
    },
    DistanceThreshold {
        distance_threshold: u64,
        affinity: Affinity,
        linkage: Linkage,
    },
}

impl Default for SimplificationSettings {
    fn default() -> Self {
        SimplificationSettings::Regular { percent: 90.0 }
    }
}

impl SimplificationSettings {
    /// Parameters record for a mesh with `vertex_count` vertices.
    pub fn parameters(&self, vertex_count: usize) -> Result<ClusteringParameters> {
        match *self {
            SimplificationSettings::Regular { percent } => {
                ClusteringParameters::regular(vertex_count, percent)
            }
            SimplificationSettings::ClusterCount {
                n_clusters,
                affinity,
                linkage,
            } => ClusteringParameters::with_cluster_count(n_clusters, affinity, linkage),
            SimplificationSettings::DistanceThreshold {
                distance_threshold,
                affinity,
                linkage,
            } => ClusteringParameters::with_distance_threshold(distance_threshold, affinity, linkage),
        }
    }

    /// Naming scheme describing these settings in the output file name.
    pub fn naming_scheme(&self) -> NamingScheme {
        let advanced = |affinity: Affinity, linkage: Linkage, parameter: &str, value: u64| {
            NamingScheme::Advanced {
                affinity: affinity.to_string(),
                linkage: linkage.to_string(),
                parameter: parameter.to_string(),
                value,
            }
        };
        match *self {
            SimplificationSettings::Regular { percent } => NamingScheme::Percent(percent),
            SimplificationSettings::ClusterCount {
                n_clusters,
                affinity,
                linkage,
            } => advanced(affinity, linkage, "nClusters", n_clusters),
            SimplificationSettings::DistanceThreshold {
                distance_threshold,
                affinity,
                linkage,
            } => advanced(affinity, linkage, "distanceThreshold", distance_threshold),
        }
    }
}

/// Where and how the simplified mesh is saved
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub directory: PathBuf,
    /// Save under the source mesh name, replacing any existing file
    pub overwrite: bool,
    /// Name used instead of the settings-derived one when not overwriting
    pub custom_name: Option<String>,
    /// Recompute vertex normals from the simplified geometry
    pub recompute_normals: bool,
}

impl OutputOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            overwrite: false,
            custom_name: None,
            recompute_normals: true,
        }
    }

    /// Scheme and overwrite flag for the given settings.
    pub fn naming(&self, settings: &SimplificationSettings) -> (NamingScheme, bool) {
        if self.overwrite {
            return (NamingScheme::Overwrite, true);
        }
        match self.custom_name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => (NamingScheme::Custom(name.to_string()), false),
            None => (settings.naming_scheme(), false),
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub output_path: PathBuf,
    pub mesh: TriangleMesh,
    pub parameters: ClusteringParameters,
    pub cluster_count: usize,
    pub stats: CollapseStats,
}

/// Drives one mesh through clustering, collapse and saving
pub struct SimplificationPipeline<R: ClusteringRunner> {
    runner: R,
    paths: SimplificationPaths,
    settings: SimplificationSettings,
    output: OutputOptions,
    show_charts: bool,
}

impl<R: ClusteringRunner> SimplificationPipeline<R> {
    pub fn new(runner: R, paths: SimplificationPaths, output: OutputOptions) -> Self {
        Self {
            runner,
            paths,
            settings: SimplificationSettings::default(),
            output,
            show_charts: false,
        }
    }

    pub fn with_settings(mut self, settings: SimplificationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Forwarded to the clustering stage as `showCharts`.
    pub fn with_show_charts(mut self, show_charts: bool) -> Self {
        self.show_charts = show_charts;
        self
    }

    pub fn settings(&self) -> &SimplificationSettings {
        &self.settings
    }

    pub fn paths(&self) -> &SimplificationPaths {
        &self.paths
    }

    /// Simplify `mesh`, saving the result under a name derived from `mesh_name`.
    pub fn run(&self, mesh: &TriangleMesh, mesh_name: &str) -> Result<PipelineReport> {
        info!("=== Hierarchical clustering mesh simplification: {} ===", mesh_name);
        mesh.validate()?;
        let parameters = self
            .settings
            .parameters(mesh.vertex_count())?
            .with_show_charts(self.show_charts);
        self.paths.check_directories()?;

        task(1, "Save mesh vertices to file");
        VertexCsvWriter::write_vertices(&mesh.vertices, &self.paths.vertices)?;

        task(2, "Save clustering parameters to file");
        parameters.save(&self.paths.parameters)?;

        task(3, "Run clustering");
        let job = ClusteringJob {
            paths: self.paths.clone(),
            parameters: parameters.clone(),
        };
        let result_path = self.runner.run(&job)?;

        task(4, "Recreate cluster trees from merge log");
        let log = MergeLog::from_file(&result_path)?;
        let forest = build_forest(mesh.vertex_count(), &log)?;

        task(5, "Simplify mesh");
        let (mut simplified, stats) = collapse_with_stats(mesh, &forest)?;
        finish_mesh(&mut simplified, self.output.recompute_normals);

        task(6, "Save simplified mesh");
        let (scheme, overwrite) = self.output.naming(&self.settings);
        fs::create_dir_all(&self.output.directory)?;
        let output_path = scheme.output_path(&self.output.directory, mesh_name, overwrite);
        write_mesh(&simplified, &output_path)?;

        info!(
            "Simplification finished: {} -> {} vertices, saved to {:?}",
            stats.vertices_before, stats.vertices_after, output_path
        );

        Ok(PipelineReport {
            output_path,
            mesh: simplified,
            parameters,
            cluster_count: forest.root_count(),
            stats,
        })
    }
}

fn task(index: usize, name: &str) {
    info!("Task [{}/{}]: {}", index, TASK_COUNT, name);
}

/// Post-collapse geometry refresh: optional normal recomputation and a
/// bounds report.
pub fn finish_mesh(mesh: &mut TriangleMesh, recompute_normals: bool) {
    if recompute_normals {
        mesh.recalculate_normals();
    }
    let (min, max) = mesh.bounding_box();
    debug!(
        "Bounding box: [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}]",
        min.x, min.y, min.z, max.x, max.y, max.z
    );
}

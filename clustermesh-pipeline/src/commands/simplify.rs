//! clustermesh simplify command - run the full pipeline.

use anyhow::{Context, Result};
use clustermesh_io::read_mesh;
use clustermesh_pipeline::{
    OutputOptions, ProcessClusteringRunner, SimplificationPaths, SimplificationPipeline,
    SimplificationSettings,
};

use super::mesh_name;
use crate::{Cli, SimplifyArgs};

fn settings(args: &SimplifyArgs) -> SimplificationSettings {
    match (args.percent, args.clusters, args.distance) {
        (_, Some(n_clusters), _) => SimplificationSettings::ClusterCount {
            n_clusters,
            affinity: args.affinity,
            linkage: args.linkage,
        },
        (_, _, Some(distance_threshold)) => SimplificationSettings::DistanceThreshold {
            distance_threshold,
            affinity: args.affinity,
            linkage: args.linkage,
        },
        (Some(percent), _, _) => SimplificationSettings::Regular { percent },
        (None, None, None) => SimplificationSettings::default(),
    }
}

pub fn run(args: &SimplifyArgs, cli: &Cli) -> Result<()> {
    let mesh = read_mesh(&args.input)
        .with_context(|| format!("Failed to load mesh from {:?}", args.input))?;

    let work_dir = args.work_dir.clone().unwrap_or_else(|| args.output.clone());
    std::fs::create_dir_all(&work_dir)
        .with_context(|| format!("Failed to create working directory {:?}", work_dir))?;

    let runner = ProcessClusteringRunner::new(&args.cluster_command)
        .args(&args.cluster_args)
        .working_dir(&work_dir);

    let mut output = OutputOptions::new(&args.output);
    output.overwrite = args.overwrite;
    output.custom_name = args.name.clone();
    output.recompute_normals = !args.keep_normals;

    let pipeline = SimplificationPipeline::new(runner, SimplificationPaths::in_dir(&work_dir), output)
        .with_settings(settings(args))
        .with_show_charts(args.show_charts);

    let report = pipeline
        .run(&mesh, &mesh_name(&args.input))
        .context("Simplification pipeline failed")?;

    if !cli.quiet {
        println!(
            "Simplified {:?}: {} -> {} vertices, {} -> {} faces ({} clusters)",
            args.input,
            report.stats.vertices_before,
            report.stats.vertices_after,
            report.stats.faces_before,
            report.stats.faces_after,
            report.cluster_count
        );
        println!("Saved to {:?}", report.output_path);
    }

    Ok(())
}

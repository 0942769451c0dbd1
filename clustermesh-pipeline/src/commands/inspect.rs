//! clustermesh inspect command - describe the forest encoded by a merge log.

use std::path::Path;

use anyhow::{Context, Result};
use clustermesh_simplification::{build_forest, MergeLog};

use crate::Cli;

pub fn run(merge_log: &Path, vertices: Option<usize>, cli: &Cli) -> Result<()> {
    let log = MergeLog::from_file(merge_log)
        .with_context(|| format!("Failed to read merge log {:?}", merge_log))?;
    let vertices = match vertices {
        Some(count) => {
            log.check_vertex_count(count)?;
            count
        }
        None => log.complete_vertex_count(),
    };
    let forest = build_forest(vertices, &log)?;

    if cli.quiet {
        return Ok(());
    }

    let sizes: Vec<usize> = forest
        .roots()
        .iter()
        .map(|&root| forest.leaves(root).len())
        .collect();
    let deepest = forest
        .roots()
        .iter()
        .map(|&root| forest.depth(root))
        .max()
        .unwrap_or(0);

    println!("Merge log:        {:?}", merge_log);
    println!("Vertices:         {}", vertices);
    println!("Target clusters:  {}", log.target_cluster_count());
    println!("Merge records:    {}", log.len());
    println!("Merges applied:   {}", forest.merge_count());
    println!("Clusters:         {}", forest.root_count());
    println!("Singletons:       {}", sizes.iter().filter(|&&s| s == 1).count());
    println!("Largest cluster:  {}", sizes.iter().max().copied().unwrap_or(0));
    println!("Deepest tree:     {}", deepest);
    Ok(())
}

//! Boundary to the external clustering stage
//!
//! The clustering stage reads the vertex CSV and the parameters record and
//! writes a merge log. Progress is reported on stdout: a line `SUCCEEDED`
//! ends a successful run, a line `ERROR` is followed by the failure message.

use std::ffi::OsString;
use std::io::BufRead;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use clustermesh_core::{Error, Result};
use tracing::{debug, info};

use crate::parameters::ClusteringParameters;
use crate::paths::SimplificationPaths;

/// Marker printed by the clustering stage on success
pub const SUCCESS_MARKER: &str = "SUCCEEDED";
/// Marker printed by the clustering stage before its error message
pub const ERROR_MARKER: &str = "ERROR";

/// Environment variables telling the clustering process where its files are
pub const VERTICES_ENV: &str = "CLUSTERMESH_VERTICES";
pub const PARAMETERS_ENV: &str = "CLUSTERMESH_PARAMETERS";
pub const RESULT_ENV: &str = "CLUSTERMESH_RESULT";

/// One request to the clustering stage
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringJob {
    pub paths: SimplificationPaths,
    pub parameters: ClusteringParameters,
}

/// Runs the clustering stage for a job and returns the merge-log path
pub trait ClusteringRunner {
    fn run(&self, job: &ClusteringJob) -> Result<PathBuf>;
}

impl<R: ClusteringRunner + ?Sized> ClusteringRunner for &R {
    fn run(&self, job: &ClusteringJob) -> Result<PathBuf> {
        (**self).run(job)
    }
}

/// Runs the clustering stage as a child process
#[derive(Debug, Clone)]
pub struct ProcessClusteringRunner {
    program: OsString,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
}

impl ProcessClusteringRunner {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command(&self, job: &ClusteringJob) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(VERTICES_ENV, &job.paths.vertices)
            .env(PARAMETERS_ENV, &job.paths.parameters)
            .env(RESULT_ENV, &job.paths.result)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl ClusteringRunner for ProcessClusteringRunner {
    fn run(&self, job: &ClusteringJob) -> Result<PathBuf> {
        info!("Started clustering process {:?}", self.program);
        let mut child = self.command(job).spawn().map_err(|e| {
            Error::Clustering(format!("failed to start {:?}: {}", self.program, e))
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            Error::Clustering("clustering process has no stdout".to_string())
        })?;
        let outcome = read_outcome(BufReader::new(stdout));

        if outcome.is_err() {
            // Already exited in the usual case
            let _ = child.kill();
        }
        let status = child.wait()?;
        debug!("Clustering process exited with {}", status);

        outcome?;
        info!("Finished clustering process");
        Ok(job.paths.result.clone())
    }
}

/// Follow the clustering stage's stdout until it reports an outcome.
pub fn read_outcome<R: BufRead>(reader: R) -> Result<()> {
    let mut lines = reader.lines();
    while let Some(line) = lines.next() {
        let line = line?;
        let line = line.trim_end();
        match line {
            SUCCESS_MARKER => return Ok(()),
            ERROR_MARKER => {
                let message = match lines.next() {
                    Some(next) => next?.trim_end().to_string(),
                    None => "clustering stage reported an error without a message".to_string(),
                };
                return Err(Error::Clustering(message));
            }
            "" => {}
            _ => info!(target: "clustermesh::clustering", "{}", line),
        }
    }
    Err(Error::Clustering(
        "clustering stage ended without reporting success".to_string(),
    ))
}

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::HashMap;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The name of the scenario that was run
    pub scenario_name: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The duration that the run was configured with, in seconds
    ///
    /// Not set when the run was bounded by an iteration cap instead.
    pub run_duration: Option<u64>,
    /// The number of iterations each virtual user was configured to run
    pub iteration_cap: Option<u64>,
    /// The number of virtual users configured
    pub virtual_users: usize,
    /// The number of virtual users that exited normally at the end of the run
    ///
    /// Less than [RunSummary::virtual_users] if some virtual users crashed.
    pub virtual_user_end_count: usize,
    /// Iterations that ran every step
    pub iterations_completed: u64,
    /// Iterations that stopped early because a required step failed
    pub iterations_aborted: u64,
    /// Environment variables set for the run
    ///
    /// This won't capture all environment variables. Just the ones that the runner is aware of or
    /// that are included by the scenario itself.
    pub env: HashMap<String, String>,
    /// The version of Breeze that was used for this run
    pub breeze_version: String,
}

impl RunSummary {
    /// Create a new run summary
    pub fn new(
        run_id: String,
        scenario_name: String,
        started_at: i64,
        run_duration: Option<u64>,
        iteration_cap: Option<u64>,
        virtual_users: usize,
        breeze_version: String,
    ) -> Self {
        Self {
            run_id,
            scenario_name,
            started_at,
            run_duration,
            iteration_cap,
            virtual_users,
            virtual_user_end_count: 0,
            iterations_completed: 0,
            iterations_aborted: 0,
            env: HashMap::with_capacity(0),
            breeze_version,
        }
    }

    /// Set the virtual user end count
    pub fn set_virtual_user_end_count(&mut self, virtual_user_end_count: usize) {
        self.virtual_user_end_count = virtual_user_end_count;
    }

    pub fn set_iterations(&mut self, completed: u64, aborted: u64) {
        self.iterations_completed = completed;
        self.iterations_aborted = aborted;
    }

    /// Add an environment variable
    pub fn add_env(&mut self, key: String, value: String) {
        self.env.insert(key, value);
    }

    pub fn total_iterations(&self) -> u64 {
        self.iterations_completed + self.iterations_aborted
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint is intended to uniquely identify the configuration used to run the scenario.
    /// It uses the
    ///     - Scenario name
    ///     - Run duration or iteration cap
    ///     - Virtual user count
    ///     - Selected environment variables
    ///     - Breeze version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.scenario_name.as_bytes());
        if let Some(run_duration) = self.run_duration {
            Digest::update(&mut hasher, b"duration");
            Digest::update(&mut hasher, run_duration.to_le_bytes());
        }
        if let Some(iteration_cap) = self.iteration_cap {
            Digest::update(&mut hasher, b"iterations");
            Digest::update(&mut hasher, iteration_cap.to_le_bytes());
        }
        Digest::update(&mut hasher, (self.virtual_users as u64).to_le_bytes());
        self.env
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        Digest::update(&mut hasher, self.breeze_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: RunSummary, path: PathBuf) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, &run_summary)?;
    Ok(())
}

/// Load a run summary from a reader
pub fn load_run_summary<R: Read>(reader: R) -> anyhow::Result<RunSummary> {
    let reader = std::io::BufReader::new(reader);
    let run_summary: RunSummary = serde_json::from_reader(reader)?;
    Ok(run_summary)
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: PathBuf) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}

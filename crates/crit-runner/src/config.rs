use crate::catalog::InstanceCatalog;
use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_PROFILE_REPETITIONS: usize = 30;

/// Harness settings, loaded from YAML. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Solver executable, resolved relative to the working directory.
    pub solver: PathBuf,
    pub instances_dir: PathBuf,
    pub time_limit_secs: u64,
    /// Repetitions per instance in a sweep.
    pub repetitions: usize,
    /// Repetitions of the single instance in a profile run.
    pub profile_repetitions: usize,
    pub concurrency: usize,
    pub output: PathBuf,
    /// Extra or replacement `k` values keyed by instance file name.
    pub catalog: BTreeMap<String, u32>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            solver: PathBuf::from("./critcol"),
            instances_dir: PathBuf::from("../data/"),
            time_limit_secs: 1,
            repetitions: 1,
            profile_repetitions: DEFAULT_PROFILE_REPETITIONS,
            concurrency: DEFAULT_CONCURRENCY,
            output: PathBuf::from("results.dat"),
            catalog: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let raw = fs::read_to_string(path).map_err(|source| HarnessError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_yaml::from_str(&raw).map_err(|e| HarnessError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn validate(&self, source: &Path) -> Result<(), HarnessError> {
        let mut problems = Vec::new();
        if self.concurrency == 0 {
            problems.push("concurrency must be at least 1");
        }
        if self.repetitions == 0 {
            problems.push("repetitions must be at least 1");
        }
        if self.profile_repetitions == 0 {
            problems.push("profile_repetitions must be at least 1");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::ConfigParse {
                path: source.to_path_buf(),
                message: problems.join("; "),
            })
        }
    }

    pub fn catalog(&self) -> InstanceCatalog {
        InstanceCatalog::with_overrides(&self.catalog)
    }
}

pub const CONFIG_TEMPLATE: &str = "\
# critbench harness configuration. Every key is optional.
solver: ./critcol              # invoked as <solver> -i <instance> -k <k> -t <secs>
instances_dir: ../data/        # regular, non-hidden files are benchmarked
time_limit_secs: 1             # passed to the solver; not enforced by the harness
repetitions: 1                 # per instance, for `critbench sweep`
profile_repetitions: 30        # for `critbench profile`
concurrency: 10                # solver processes in flight at once
output: results.dat
catalog: {}                    # extra k values, e.g. {\"my_graph.col\": 6}
";

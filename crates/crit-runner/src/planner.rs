//! Expands instances and repetitions into the flat task list handed to the
//! executor.

use crate::catalog::InstanceCatalog;
use crate::error::HarnessError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Leading character of entries that are never benchmarked.
const HIDDEN_MARKER: char = '.';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSpec {
    pub name: String,
    pub path: PathBuf,
    pub k: u32,
}

/// One solver invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub instance_index: usize,
    /// Zero-based repetition number within the instance.
    pub repetition: usize,
    pub path: PathBuf,
    pub k: u32,
    pub time_limit_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub instances: Vec<InstanceSpec>,
    pub tasks: Vec<Task>,
    pub repetitions: usize,
    pub time_limit_secs: u64,
}

impl RunPlan {
    fn expand(instances: Vec<InstanceSpec>, repetitions: usize, time_limit_secs: u64) -> Self {
        let mut tasks = Vec::with_capacity(instances.len() * repetitions);
        for (instance_index, instance) in instances.iter().enumerate() {
            for repetition in 0..repetitions {
                tasks.push(Task {
                    instance_index,
                    repetition,
                    path: instance.path.clone(),
                    k: instance.k,
                    time_limit_secs,
                });
            }
        }
        Self {
            instances,
            tasks,
            repetitions,
            time_limit_secs,
        }
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER)
}

/// Regular, non-hidden files directly inside `dir`, sorted by name.
///
/// Directory iteration order is not stable across filesystems, so the result
/// is sorted to keep report blocks in a reproducible order.
pub fn enumerate_instances(
    dir: &Path,
    catalog: &InstanceCatalog,
) -> Result<Vec<InstanceSpec>, HarnessError> {
    fs::read_dir(dir).map_err(|source| HarnessError::InstanceSource {
        path: dir.to_path_buf(),
        source,
    })?;

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    let mut instances = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&name) {
            continue;
        }
        let k = catalog.k_for(&name);
        if !catalog.contains(&name) {
            debug!(instance = %name, k, "instance not in catalog, using default k");
        }
        instances.push(InstanceSpec {
            name,
            path: entry.into_path(),
            k,
        });
    }
    Ok(instances)
}

/// Every instance in `dir`, `repetitions` times each.
pub fn plan_sweep(
    dir: &Path,
    catalog: &InstanceCatalog,
    repetitions: usize,
    time_limit_secs: u64,
) -> Result<RunPlan, HarnessError> {
    let instances = enumerate_instances(dir, catalog)?;
    Ok(RunPlan::expand(instances, repetitions, time_limit_secs))
}

/// A single named instance from `dir`, `repetitions` times.
pub fn plan_profile(
    dir: &Path,
    instance: &str,
    catalog: &InstanceCatalog,
    repetitions: usize,
    time_limit_secs: u64,
) -> Result<RunPlan, HarnessError> {
    let path = dir.join(instance);
    let is_regular = fs::symlink_metadata(&path)
        .map(|m| m.file_type().is_file())
        .unwrap_or(false);
    if !is_regular {
        return Err(HarnessError::InstanceMissing { path });
    }
    let spec = InstanceSpec {
        name: instance.to_string(),
        path,
        k: catalog.k_for(instance),
    };
    Ok(RunPlan::expand(vec![spec], repetitions, time_limit_secs))
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads, resolves, and caches named flows. A flow source is either a
//! built-in (compiled-in YAML, see [`crate::builtin`]) or a project
//! override file under `MINION_FLOWS_DIR/<name>.yaml`, the latter taking
//! precedence.

use crate::error::{FlowError, FlowResult};
use crate::flow::Flow;
use crate::yaml::{self, RawFlow, RawStage};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Process-wide cache of resolved flows, keyed by name. Exposed for tests
/// via [`FlowRegistry::reset_for_test`] rather than relying on process
/// restarts between cases.
pub struct FlowRegistry {
    cache: RwLock<HashMap<String, Arc<Flow>>>,
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(feature = "test-support")]
    pub fn reset_for_test(&self) {
        self.cache.write().clear();
    }

    pub fn load(&self, name: &str) -> FlowResult<Arc<Flow>> {
        if let Some(cached) = self.cache.read().get(name) {
            return Ok(cached.clone());
        }
        let flow = Arc::new(resolve(name)?);
        self.cache.write().insert(name.to_string(), flow.clone());
        Ok(flow)
    }

    /// Enumerates every flow name currently loadable: built-ins plus any
    /// `MINION_FLOWS_DIR` override files. Alias for [`Self::known_names`]
    /// under the name the `minion list-flows` command looks for.
    pub fn list_flows(&self) -> Vec<String> {
        self.known_names()
    }

    pub fn known_names(&self) -> Vec<String> {
        let mut names: Vec<String> = crate::builtin::names().iter().map(|s| s.to_string()).collect();
        if let Some(dir) = overrides_dir() {
            if let Ok(entries) = std::fs::read_dir(&dir) {
                for entry in entries.flatten() {
                    if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                        if entry.path().extension().and_then(|e| e.to_str()) == Some("yaml")
                            && !names.iter().any(|n| n == stem)
                        {
                            names.push(stem.to_string());
                        }
                    }
                }
            }
        }
        names
    }
}

static GLOBAL: OnceLock<FlowRegistry> = OnceLock::new();

/// The process-wide registry instance used outside of tests. Tests that
/// need isolation should construct their own `FlowRegistry` rather than
/// reaching for this one.
pub fn global() -> &'static FlowRegistry {
    GLOBAL.get_or_init(FlowRegistry::new)
}

fn overrides_dir() -> Option<PathBuf> {
    std::env::var(minion_core::ENV_FLOWS_DIR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn load_source(name: &str) -> FlowResult<String> {
    if let Some(dir) = overrides_dir() {
        let path = dir.join(format!("{name}.yaml"));
        if path.exists() {
            return std::fs::read_to_string(&path).map_err(|source| FlowError::Io {
                flow: name.to_string(),
                source,
            });
        }
    }
    crate::builtin::source(name)
        .map(str::to_string)
        .ok_or_else(|| FlowError::UnknownFlow(name.to_string()))
}

fn resolve(name: &str) -> FlowResult<Flow> {
    let mut visiting = Vec::new();
    let (raw, stages, dead_ends) = resolve_chain(name, &mut visiting)?;
    yaml::build_flow(raw, stages, dead_ends)
}

/// Walk the `inherits` chain from `name` up to its root ancestor, then fold
/// back down applying each child's stage overrides (full per-key override, not a
/// field-level merge).
fn resolve_chain(name: &str, visiting: &mut Vec<String>) -> FlowResult<(RawFlow, IndexMap<String, RawStage>, Vec<String>)> {
    if visiting.iter().any(|v| v == name) {
        return Err(FlowError::CyclicInheritance { flow: name.to_string() });
    }
    visiting.push(name.to_string());

    let source = load_source(name)?;
    let raw = yaml::parse_raw(name, &source)?;

    let (stages, dead_ends) = match &raw.inherits {
        None => (raw.stages.clone(), raw.dead_ends.clone()),
        Some(parent_name) => {
            if load_source(parent_name).is_err() {
                return Err(FlowError::UnknownParent {
                    flow: name.to_string(),
                    parent: parent_name.clone(),
                });
            }
            let (_, parent_stages, parent_dead_ends) = resolve_chain(parent_name, visiting)?;
            yaml::merge_inherited(&raw, parent_stages, &parent_dead_ends)
        }
    };

    visiting.pop();
    Ok((raw, stages, dead_ends))
}

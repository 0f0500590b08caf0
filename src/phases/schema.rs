//! The ordered phase definition table and its load-time validation.

use crate::errors::{ComplianceError, Result};
use crate::io::FileSystem;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const EMBEDDED_SCHEMA: &str = include_str!("default_phases.toml");

fn default_allow_list_file() -> String {
    "technology-lock.json".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub id: String,
    pub ordinal: u32,
    /// Artifact file name, relative to the project's design directory.
    pub output_file: String,
    pub required_sections: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Phase additionally needs a well-formed allow-list document to start.
    #[serde(default)]
    pub requires_allow_list: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseSchema {
    /// Last ordinal of the design stage; downstream work is ready once every
    /// phase up to and including it is complete.
    pub design_boundary: u32,
    #[serde(default = "default_allow_list_file")]
    pub allow_list_file: String,
    /// Phase credited with producing the allow-list document.
    #[serde(default)]
    pub allow_list_owner: Option<String>,
    pub phases: Vec<PhaseDefinition>,
}

impl PhaseSchema {
    /// The built-in nine-phase delivery workflow.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED_SCHEMA)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let schema: Self = toml::from_str(contents)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let schema: Self = serde_json::from_str(contents)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load a schema file, choosing the format by extension (`.json` or TOML).
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let contents = fs.read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        };
        parsed.map_err(|e| match e {
            ComplianceError::PhaseSchema(message) => {
                ComplianceError::PhaseSchema(format!("{}: {message}", path.display()))
            }
            other => ComplianceError::config_with_path(other.to_string(), path),
        })
    }

    pub fn get(&self, id: &str) -> Option<&PhaseDefinition> {
        self.phases.iter().find(|phase| phase.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&PhaseDefinition> {
        self.get(id)
            .ok_or_else(|| ComplianceError::UnknownPhase(id.to_string()))
    }

    pub fn at_ordinal(&self, ordinal: u32) -> Vec<&PhaseDefinition> {
        self.phases
            .iter()
            .filter(|phase| phase.ordinal == ordinal)
            .collect()
    }

    /// Phase whose artifact file is named `file_name`.
    pub fn owner_of_artifact(&self, file_name: &str) -> Option<&PhaseDefinition> {
        self.phases
            .iter()
            .find(|phase| phase.output_file == file_name)
    }

    pub fn allow_list_owner(&self) -> &str {
        self.allow_list_owner.as_deref().unwrap_or("workflow")
    }

    pub fn validate(&self) -> Result<()> {
        if self.phases.is_empty() {
            return Err(ComplianceError::schema("phase schema defines no phases"));
        }

        let mut ids = HashSet::new();
        let mut ordinals = HashSet::new();
        for phase in &self.phases {
            if !ids.insert(phase.id.as_str()) {
                return Err(ComplianceError::schema(format!("duplicate phase id '{}'", phase.id)));
            }
            if !ordinals.insert(phase.ordinal) {
                return Err(ComplianceError::schema(format!(
                    "duplicate ordinal {} (phase '{}')",
                    phase.ordinal, phase.id
                )));
            }
            if phase.required_sections.is_empty() {
                return Err(ComplianceError::schema(format!(
                    "phase '{}' has no required sections",
                    phase.id
                )));
            }
        }

        for phase in &self.phases {
            for dep in &phase.depends_on {
                if dep == &phase.id {
                    return Err(ComplianceError::schema(format!(
                        "phase '{}' depends on itself",
                        phase.id
                    )));
                }
                if !ids.contains(dep.as_str()) {
                    return Err(ComplianceError::schema(format!(
                        "phase '{}' depends on unknown phase '{dep}'",
                        phase.id
                    )));
                }
            }
        }

        self.check_acyclic()?;
        self.check_ordinal_order()
    }

    fn check_acyclic(&self) -> Result<()> {
        let (graph, _) = self.dependency_graph();
        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            ComplianceError::schema(format!(
                "dependency cycle through phase '{}'",
                graph[cycle.node_id()]
            ))
        })
    }

    fn check_ordinal_order(&self) -> Result<()> {
        if let Some(pair) = self.phases.windows(2).find(|w| w[0].ordinal >= w[1].ordinal) {
            return Err(ComplianceError::schema(format!(
                "phase '{}' (ordinal {}) is listed after '{}' (ordinal {})",
                pair[1].id, pair[1].ordinal, pair[0].id, pair[0].ordinal
            )));
        }

        let ordinal_of: HashMap<&str, u32> = self
            .phases
            .iter()
            .map(|phase| (phase.id.as_str(), phase.ordinal))
            .collect();

        for phase in &self.phases {
            for dep in &phase.depends_on {
                if ordinal_of.get(dep.as_str()).is_some_and(|&o| o >= phase.ordinal) {
                    return Err(ComplianceError::schema(format!(
                        "phase '{}' depends on later phase '{dep}'",
                        phase.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Edges run from prerequisite to dependent phase.
    fn dependency_graph(&self) -> (DiGraph<&str, ()>, HashMap<&str, NodeIndex>) {
        let mut graph = DiGraph::new();
        let nodes: HashMap<&str, NodeIndex> = self
            .phases
            .iter()
            .map(|phase| (phase.id.as_str(), graph.add_node(phase.id.as_str())))
            .collect();

        for phase in &self.phases {
            for dep in &phase.depends_on {
                if let (Some(&from), Some(&to)) = (nodes.get(dep.as_str()), nodes.get(phase.id.as_str())) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        (graph, nodes)
    }

    /// Every phase `id` depends on, directly or transitively.
    pub fn transitive_dependencies(&self, id: &str) -> Vec<&str> {
        let mut seen = Vec::new();
        let mut stack: Vec<&str> = self
            .get(id)
            .map(|phase| phase.depends_on.iter().map(String::as_str).collect())
            .unwrap_or_default();

        while let Some(next) = stack.pop() {
            if seen.contains(&next) {
                continue;
            }
            seen.push(next);
            if let Some(phase) = self.get(next) {
                stack.extend(phase.depends_on.iter().map(String::as_str));
            }
        }
        seen
    }
}

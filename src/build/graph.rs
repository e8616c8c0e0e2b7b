//! Dependency graph over source files.
//!
//! There are no import statements in Lua: an edge `A -> B` exists when `A`
//! imports a global that `B` declares. The declaring file is the first one
//! found, project files before library files. Library files only become
//! nodes once something reaches them.

use crate::source::SourceFile;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet, VecDeque};

/// Files keyed by id, each with the ids it depends on.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    /// Build the graph for one target's file set.
    pub fn build(project_files: &[SourceFile], library_files: &[SourceFile]) -> Self {
        let mut declarers: HashMap<&str, &SourceFile> = HashMap::new();
        for file in project_files.iter().chain(library_files) {
            for name in &file.declared_globals {
                declarers.entry(name.as_str()).or_insert(file);
            }
        }

        let mut nodes: IndexMap<String, IndexSet<String>> = IndexMap::new();
        let mut queue: VecDeque<&SourceFile> = VecDeque::new();
        for file in project_files {
            nodes.insert(file.id(), IndexSet::new());
            queue.push_back(file);
        }

        while let Some(file) = queue.pop_front() {
            let id = file.id();
            let mut edges = IndexSet::new();
            for name in &file.imported_globals {
                let Some(declarer) = declarers.get(name.as_str()) else {
                    continue;
                };
                let dep_id = declarer.id();
                if dep_id == id {
                    continue;
                }
                if !nodes.contains_key(&dep_id) {
                    tracing::debug!("{} pulls in library {}", file.file_name, declarer.file_name);
                    nodes.insert(dep_id.clone(), IndexSet::new());
                    queue.push_back(*declarer);
                }
                edges.insert(dep_id);
            }
            nodes.insert(id, edges);
        }

        Self { nodes }
    }

    /// Number of files in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no files.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a file id is a node.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Ids a file depends on, in import order.
    pub fn dependencies(&self, id: &str) -> Option<&IndexSet<String>> {
        self.nodes.get(id)
    }

    /// Get file ids in build order (dependencies before dependents).
    ///
    /// Ties keep node insertion order. Returns an error if there are
    /// circular dependencies.
    pub fn build_order(&self) -> Result<Vec<&str>, BuildOrderError> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();

        for id in self.nodes.keys() {
            self.visit(id, &mut visited, &mut visiting, &mut result)?;
        }

        Ok(result)
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        visited: &mut HashSet<&'a str>,
        visiting: &mut HashSet<&'a str>,
        result: &mut Vec<&'a str>,
    ) -> Result<(), BuildOrderError> {
        if visited.contains(id) {
            return Ok(());
        }

        if visiting.contains(id) {
            return Err(BuildOrderError::CyclicDependency(id.to_string()));
        }

        visiting.insert(id);

        if let Some(deps) = self.nodes.get(id) {
            for dep in deps {
                self.visit(dep, visited, visiting, result)?;
            }
        }

        visiting.remove(id);
        visited.insert(id);
        result.push(id);

        Ok(())
    }
}

/// Resolve the ordered output files for one target's file set.
pub fn resolve_order(
    project_files: &[SourceFile],
    library_files: &[SourceFile],
) -> Result<Vec<SourceFile>, BuildOrderError> {
    let graph = DependencyGraph::build(project_files, library_files);
    let mut by_id: HashMap<String, &SourceFile> = HashMap::new();
    for file in project_files.iter().chain(library_files) {
        by_id.entry(file.id()).or_insert(file);
    }

    Ok(graph
        .build_order()?
        .into_iter()
        .filter_map(|id| by_id.get(id).map(|file| (*file).clone()))
        .collect())
}

/// Error during build order calculation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildOrderError {
    /// Circular dependency detected
    #[error("Circular global dependency detected involving file '{0}'")]
    CyclicDependency(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, declares: &[&str], imports: &[&str]) -> SourceFile {
        let mut file = SourceFile::new("/src", name, "");
        file.declared_globals = declares.iter().map(|s| s.to_string()).collect();
        file.imported_globals = imports.iter().map(|s| s.to_string()).collect();
        file
    }

    fn lib(name: &str, declares: &[&str], imports: &[&str]) -> SourceFile {
        let mut file = file(name, declares, imports).library();
        file.path = "/libs".into();
        file
    }

    fn names(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn test_declarer_before_user() {
        let project = vec![file("B.lua", &[], &["Foo"]), file("A.lua", &["Foo"], &[])];
        let ordered = resolve_order(&project, &[]).unwrap();
        assert_eq!(names(&ordered), vec!["A.lua", "B.lua"]);
    }

    #[test]
    fn test_independent_files_keep_discovery_order() {
        let project = vec![file("C.lua", &[], &[]), file("A.lua", &[], &["Missing"]), file("B.lua", &[], &[])];
        let ordered = resolve_order(&project, &[]).unwrap();
        assert_eq!(names(&ordered), vec!["C.lua", "A.lua", "B.lua"]);
    }

    #[test]
    fn test_unused_library_not_included() {
        let project = vec![file("Core.lua", &[], &["LibStub"])];
        let libs = vec![lib("LibStub.lua", &["LibStub"], &[]), lib("Unused.lua", &["Unused"], &[])];

        let ordered = resolve_order(&project, &libs).unwrap();
        assert_eq!(names(&ordered), vec!["LibStub.lua", "Core.lua"]);
    }

    #[test]
    fn test_library_dependencies_are_transitive() {
        let project = vec![file("Core.lua", &[], &["AceAddon"])];
        let libs = vec![
            lib("AceAddon.lua", &["AceAddon"], &["LibStub"]),
            lib("LibStub.lua", &["LibStub"], &[]),
        ];

        let graph = DependencyGraph::build(&project, &libs);
        assert_eq!(graph.len(), 3);
        assert!(graph.contains("/libs/LibStub.lua"));

        let ordered = resolve_order(&project, &libs).unwrap();
        assert_eq!(names(&ordered), vec!["LibStub.lua", "AceAddon.lua", "Core.lua"]);
    }

    #[test]
    fn test_first_declarer_wins_project_before_library() {
        let project = vec![file("Core.lua", &[], &["Util"]), file("Util.lua", &["Util"], &[])];
        let libs = vec![lib("LibUtil.lua", &["Util"], &[])];

        let graph = DependencyGraph::build(&project, &libs);
        assert_eq!(
            graph.dependencies("/src/Core.lua").unwrap().iter().collect::<Vec<_>>(),
            vec!["/src/Util.lua"]
        );
        assert!(!graph.contains("/libs/LibUtil.lua"));
    }

    #[test]
    fn test_build_order_cycle() {
        let project = vec![file("A.lua", &["A"], &["B"]), file("B.lua", &["B"], &["A"])];
        let result = resolve_order(&project, &[]);
        assert!(matches!(result, Err(BuildOrderError::CyclicDependency(_))));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Circular global dependency detected involving file '/src/A.lua'"
        );
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(&[], &[]);
        assert!(graph.is_empty());
        assert!(graph.build_order().unwrap().is_empty());
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::BackendStepSpec;
use std::collections::{HashMap, HashSet};

/// Step dependency graph of one method: step name -> names it depends on.
///
/// Insertion order is remembered so that [`DependencyGraph::topological_order`] is
/// deterministic: unrelated steps keep the order they were declared in.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashMap<String, Vec<String>>,
    order: Vec<String>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a method's backend steps
    pub fn from_steps(steps: &[BackendStepSpec]) -> Self {
        let mut graph = Self::new();
        for step in steps {
            graph.add_step(step.name.clone(), step.depends_on.clone());
        }
        graph
    }

    /// Add a step with its dependencies. Re-adding a name replaces its dependencies.
    pub fn add_step(&mut self, name: String, dependencies: Vec<String>) {
        if !self.edges.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.edges.insert(name, dependencies);
    }

    /// Compute an execution order where every step follows all of its dependencies.
    ///
    /// Depth-first search from each root in declaration order, visiting dependencies in
    /// the order they were declared and emitting a node once all its dependencies are
    /// emitted. A node met again while it is still on the DFS stack closes a cycle;
    /// the cycle path is returned as the error (first node repeated at the end).
    ///
    /// Dependencies that aren't steps of this graph are ignored here; reference checks
    /// happen in validation before ordering.
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<String>> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();
        let mut ordered = Vec::with_capacity(self.order.len());

        for name in &self.order {
            if !visited.contains(name.as_str()) {
                self.visit(name, &mut visited, &mut on_stack, &mut path, &mut ordered)?;
            }
        }

        Ok(ordered)
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
        ordered: &mut Vec<String>,
    ) -> Result<(), Vec<String>> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(node);

        if let Some(dependencies) = self.edges.get(node) {
            for dependency in dependencies {
                let dependency = dependency.as_str();
                if !self.edges.contains_key(dependency) {
                    continue;
                }
                if on_stack.contains(dependency) {
                    let start = path.iter().position(|n| *n == dependency).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(dependency.to_string());
                    return Err(cycle);
                }
                if !visited.contains(dependency) {
                    self.visit(dependency, visited, on_stack, path, ordered)?;
                }
            }
        }

        on_stack.remove(node);
        path.pop();
        ordered.push(node.to_string());
        Ok(())
    }
}

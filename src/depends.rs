use std::collections::{BTreeMap, VecDeque};

use log::*;
use petgraph::Direction::{Incoming, Outgoing};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::SortError;
use crate::ir::Module;

/// Orders the wires of `module` so each comes after every wire it reads.
///
/// Wires with no ordering constraint between them keep their relative order.
pub fn sort(module: &Module) -> Result<Module, SortError> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut nodes: BTreeMap<&str, NodeIndex> = BTreeMap::new();

    for (i, wire) in module.wires.iter().enumerate() {
        if nodes.contains_key(wire.name.as_str()) {
            return Err(SortError::DuplicateWire(wire.name.clone()));
        }
        let node = graph.add_node(i);
        nodes.insert(&wire.name, node);
    }

    for wire in &module.wires {
        let node = nodes[wire.name.as_str()];
        for dep in &wire.deps {
            if module.is_input(dep) {
                continue;
            }
            match nodes.get(dep.as_str()) {
                Some(dependency) => {
                    graph.update_edge(*dependency, node, ());
                },
                None => {
                    return Err(SortError::DependencyNotFound {
                        wire: wire.name.clone(),
                        dependency: dep.clone(),
                    });
                },
            }
        }
    }

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Incoming).count())
        .collect();

    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|node| in_degree[node.index()] == 0)
        .collect();

    let mut sorted = vec![];
    while let Some(node) = queue.pop_front() {
        sorted.push(node);

        let mut dependents: Vec<NodeIndex> = graph.neighbors_directed(node, Outgoing).collect();
        dependents.sort();
        for dependent in dependents {
            in_degree[dependent.index()] -= 1;
            if in_degree[dependent.index()] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if sorted.len() < module.wires.len() {
        let remaining: Vec<String> = graph
            .node_indices()
            .filter(|node| in_degree[node.index()] > 0)
            .map(|node| module.wires[graph[node]].name.clone())
            .collect();
        error!("Cycle detected among: {}", remaining.join(", "));
        return Err(SortError::CycleDetected(remaining));
    }

    let wires = sorted.into_iter().map(|node| module.wires[graph[node]].clone()).collect();
    Ok(Module {
        name: module.name.clone(),
        inputs: module.inputs.clone(),
        wires,
        outputs: module.outputs.clone(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{Expr, Input, Wire};

    fn wire(name: &str, deps: &[&str]) -> Wire {
        let value = if deps.is_empty() {
            Expr::Constant("0".to_string())
        } else {
            Expr::Concat(deps.iter().map(|dep| Expr::Register(dep.to_string())).collect())
        };
        Wire::new(name, 1, value)
    }

    fn module(inputs: &[&str], wires: Vec<Wire>) -> Module {
        Module {
            name: "test".to_string(),
            inputs: inputs.iter().map(|name| Input { name: name.to_string(), width: 1 }).collect(),
            wires,
            outputs: vec![],
        }
    }

    fn names(module: &Module) -> Vec<&str> {
        module.wires.iter().map(|wire| wire.name.as_str()).collect()
    }

    #[test]
    fn test_one() {
        let m = module(&[], vec![
            wire("A", &["B", "C"]),
            wire("B", &["D", "E"]),
            wire("C", &["E"]),
            wire("D", &[]),
            wire("E", &[]),
            wire("F", &[]),
        ]);

        let sorted = sort(&m).unwrap();
        let sorted = names(&sorted);
        let a_idx = sorted.iter().position(|x| x == &"A").unwrap();
        let b_idx = sorted.iter().position(|x| x == &"B").unwrap();
        let c_idx = sorted.iter().position(|x| x == &"C").unwrap();
        let d_idx = sorted.iter().position(|x| x == &"D").unwrap();
        let e_idx = sorted.iter().position(|x| x == &"E").unwrap();

        assert!(d_idx < b_idx);
        assert!(e_idx < b_idx);
        assert!(e_idx < c_idx);
        assert!(b_idx < a_idx);
        assert!(c_idx < a_idx);
        assert_eq!(sorted, vec!["D", "E", "F", "B", "C", "A"]);
    }

    #[test]
    fn test_two() {
        let m = module(&[], vec![
            wire("A", &["B"]),
            wire("B", &["C"]),
            wire("C", &["A"]),
            wire("D", &[]),
        ]);

        assert_eq!(
            sort(&m),
            Err(SortError::CycleDetected(vec!["A".to_string(), "B".to_string(), "C".to_string()])),
        );
    }

    #[test]
    fn two_wire_cycle() {
        let m = module(&["x"], vec![wire("a", &["b", "x"]), wire("b", &["a"])]);
        assert!(matches!(sort(&m), Err(SortError::CycleDetected(names)) if names == vec!["a", "b"]));
    }

    #[test]
    fn self_loop() {
        let m = module(&[], vec![wire("a", &["a"])]);
        assert_eq!(sort(&m), Err(SortError::CycleDetected(vec!["a".to_string()])));
    }

    #[test]
    fn inputs_are_not_dependencies() {
        let m = module(&["x", "y"], vec![wire("b", &["a", "y"]), wire("a", &["x"])]);
        let sorted = sort(&m).unwrap();
        assert_eq!(names(&sorted), vec!["a", "b"]);
        assert_eq!(sorted.inputs, m.inputs);
    }

    #[test]
    fn independent_wires_keep_their_order() {
        let m = module(&[], vec![wire("z", &[]), wire("y", &[]), wire("x", &[])]);
        assert_eq!(names(&sort(&m).unwrap()), vec!["z", "y", "x"]);
    }

    #[test]
    fn missing_dependency() {
        let m = module(&[], vec![wire("a", &["ghost"])]);
        assert_eq!(
            sort(&m),
            Err(SortError::DependencyNotFound { wire: "a".to_string(), dependency: "ghost".to_string() }),
        );
    }

    #[test]
    fn duplicate_wire() {
        let m = module(&[], vec![wire("a", &[]), wire("a", &[])]);
        assert_eq!(sort(&m), Err(SortError::DuplicateWire("a".to_string())));
    }

    #[test]
    fn every_dependency_comes_first() {
        let m = module(&["i"], vec![
            wire("out", &["m2", "m1"]),
            wire("m2", &["m1", "i"]),
            wire("m1", &["leaf"]),
            wire("leaf", &["i"]),
        ]);
        let sorted = sort(&m).unwrap();
        for (i, wire) in sorted.wires.iter().enumerate() {
            for dep in &wire.deps {
                if sorted.is_input(dep) {
                    continue;
                }
                let j = sorted.wires.iter().position(|w| &w.name == dep).unwrap();
                assert!(j < i, "{dep} must come before {}", wire.name);
            }
        }
    }
}

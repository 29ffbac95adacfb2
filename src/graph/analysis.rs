//! Cycle detection over the FK dependency graph.

use super::DependencyGraph;
use ahash::AHashMap;

const UNVISITED: usize = usize::MAX;

/// Tables that participate in FK cycles (self-referencing or mutual).
///
/// Runs Tarjan's SCC algorithm with an explicit frame stack, so deep
/// reference chains cannot exhaust the call stack. A table is cyclic when
/// its component has more than one member, or when it carries an edge back
/// to itself. The result is sorted by name.
pub fn cyclic_tables(graph: &DependencyGraph) -> Vec<String> {
    let tables = graph.sorted_tables();
    let index_of: AHashMap<&str, usize> = tables
        .iter()
        .enumerate()
        .map(|(i, &table)| (table, i))
        .collect();
    let adjacency: Vec<Vec<usize>> = tables
        .iter()
        .map(|&table| {
            graph
                .edges_from(table)
                .iter()
                .filter_map(|edge| index_of.get(edge.referenced_table.as_str()).copied())
                .collect()
        })
        .collect();

    let mut tarjan = Tarjan::new(tables.len());
    for v in 0..tables.len() {
        if tarjan.index[v] == UNVISITED {
            tarjan.connect(v, &adjacency);
        }
    }

    let mut cyclic: Vec<String> = Vec::new();
    for scc in &tarjan.sccs {
        let is_cycle = scc.len() > 1 || adjacency[scc[0]].contains(&scc[0]);
        if is_cycle {
            cyclic.extend(scc.iter().map(|&v| tables[v].to_string()));
        }
    }
    cyclic.sort_unstable();
    cyclic
}

struct Tarjan {
    index: Vec<usize>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    counter: usize,
    sccs: Vec<Vec<usize>>,
}

struct Frame {
    v: usize,
    next_edge: usize,
}

impl Tarjan {
    fn new(n: usize) -> Self {
        Self {
            index: vec![UNVISITED; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            counter: 0,
            sccs: Vec::new(),
        }
    }

    fn visit(&mut self, v: usize) {
        self.index[v] = self.counter;
        self.lowlink[v] = self.counter;
        self.counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }

    /// One depth-first pass from `root`, driven by an explicit frame stack.
    fn connect(&mut self, root: usize, adjacency: &[Vec<usize>]) {
        self.visit(root);
        let mut frames = vec![Frame {
            v: root,
            next_edge: 0,
        }];

        while let Some(frame) = frames.last_mut() {
            let v = frame.v;
            if let Some(&w) = adjacency[v].get(frame.next_edge) {
                frame.next_edge += 1;
                if self.index[w] == UNVISITED {
                    self.visit(w);
                    frames.push(Frame { v: w, next_edge: 0 });
                } else if self.on_stack[w] {
                    self.lowlink[v] = self.lowlink[v].min(self.index[w]);
                }
            } else {
                frames.pop();
                if let Some(parent) = frames.last() {
                    self.lowlink[parent.v] = self.lowlink[parent.v].min(self.lowlink[v]);
                }
                if self.lowlink[v] == self.index[v] {
                    let mut scc = Vec::new();
                    while let Some(w) = self.stack.pop() {
                        self.on_stack[w] = false;
                        scc.push(w);
                        if w == v {
                            break;
                        }
                    }
                    self.sccs.push(scc);
                }
            }
        }
    }
}

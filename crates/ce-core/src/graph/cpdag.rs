//! Enumeration of the DAGs in a CPDAG's Markov equivalence class.
//!
//! An undetermined edge `{a, b}` appears in both directions of the CPDAG
//! matrix. Every assignment of a direction to each undetermined edge is a
//! candidate DAG; a candidate is kept when
//!
//! 1. no two newly oriented edges share a head,
//! 2. no newly oriented edge points into a node that already has a determined
//!    parent, and
//! 3. the completed graph is acyclic.
//!
//! Rules 1 and 2 forbid new colliders; rule 3 catches cycles through longer
//! paths. Candidates are visited in random order so that a sample budget
//! smaller than the class returns an unbiased subset.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use super::acyclic::approximate_maximal_acyclic_subgraph;
use super::{check_adjacency, is_dag, AdjacencyMatrix, GraphError, GraphOptions};

/// An undetermined edge between `lower < upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UndeterminedEdge {
    pub lower: usize,
    pub upper: usize,
}

impl UndeterminedEdge {
    /// `(source, head)` for an assignment bit: `false` orients
    /// `lower -> upper`, `true` orients `upper -> lower`.
    pub fn oriented(&self, bit: bool) -> (usize, usize) {
        if bit {
            (self.upper, self.lower)
        } else {
            (self.lower, self.upper)
        }
    }
}

/// A CPDAG split into its directed part and its undetermined edges.
#[derive(Debug, Clone, PartialEq)]
pub struct CpdagParts {
    /// Edges present in exactly one direction.
    pub determined: AdjacencyMatrix,
    /// Edges present in both directions, ordered by `(upper, lower)`.
    pub undetermined: Vec<UndeterminedEdge>,
    /// Whether the diagonal carried self-loops (dropped from `determined`).
    pub had_self_loops: bool,
}

/// Separate determined and undetermined edges.
pub fn split_cpdag(cpdag: &AdjacencyMatrix) -> Result<CpdagParts, GraphError> {
    check_adjacency(cpdag)?;
    let n = cpdag.nrows();

    let in_both = |i: usize, j: usize| cpdag[(i, j)] == 1 && cpdag[(j, i)] == 1;
    let determined = AdjacencyMatrix::from_fn(n, n, |i, j| if in_both(i, j) { 0 } else { cpdag[(i, j)] });

    let mut undetermined = Vec::new();
    for upper in 0..n {
        for lower in 0..upper {
            if in_both(upper, lower) {
                undetermined.push(UndeterminedEdge { lower, upper });
            }
        }
    }
    let had_self_loops = (0..n).any(|i| cpdag[(i, i)] == 1);

    Ok(CpdagParts {
        determined,
        undetermined,
        had_self_loops,
    })
}

/// Decode `index` into `n_bits` booleans, most significant bit first.
///
/// Bits above `n_bits` are ignored.
pub fn decode_assignment(index: u64, n_bits: usize) -> Vec<bool> {
    (0..n_bits)
        .map(|k| {
            let shift = n_bits - 1 - k;
            shift < 64 && (index >> shift) & 1 == 1
        })
        .collect()
}

/// Orientation assignments in random order, without repetition.
enum AssignmentOrder {
    /// Every index of the `2^k` space, pre-shuffled.
    Exhaustive {
        order: Vec<u64>,
        next: usize,
        n_bits: usize,
    },
    /// Random draws checked against a visited set, up to a fixed number of draws.
    Sampled {
        n_bits: usize,
        visited: HashSet<Vec<bool>>,
        attempts: usize,
        max_attempts: usize,
        space: Option<u64>,
    },
}

impl AssignmentOrder {
    fn new<R: Rng>(n_bits: usize, options: &GraphOptions, rng: &mut R) -> Self {
        let max_exhaustive = options.enumeration.max_exhaustive_edges.min(30);
        if n_bits <= max_exhaustive {
            let mut order: Vec<u64> = (0..1u64 << n_bits).collect();
            order.shuffle(rng);
            AssignmentOrder::Exhaustive {
                order,
                next: 0,
                n_bits,
            }
        } else {
            AssignmentOrder::Sampled {
                n_bits,
                visited: HashSet::new(),
                attempts: 0,
                max_attempts: options.enumeration.max_attempts,
                space: if n_bits < 64 { Some(1u64 << n_bits) } else { None },
            }
        }
    }

    fn next_assignment<R: Rng>(&mut self, rng: &mut R) -> Option<Vec<bool>> {
        match self {
            AssignmentOrder::Exhaustive {
                order,
                next,
                n_bits,
            } => {
                let index = *order.get(*next)?;
                *next += 1;
                Some(decode_assignment(index, *n_bits))
            }
            AssignmentOrder::Sampled {
                n_bits,
                visited,
                attempts,
                max_attempts,
                space,
            } => {
                while *attempts < *max_attempts {
                    if space.is_some_and(|s| visited.len() as u64 >= s) {
                        return None;
                    }
                    *attempts += 1;
                    let bits: Vec<bool> = (0..*n_bits).map(|_| rng.random_bool(0.5)).collect();
                    if visited.insert(bits.clone()) {
                        return Some(bits);
                    }
                }
                None
            }
        }
    }
}

/// Whether an assignment creates a collider not implied by the determined part.
fn creates_collider(edges: &[UndeterminedEdge], bits: &[bool], in_degree: &[usize]) -> bool {
    let mut heads = HashSet::with_capacity(edges.len());
    edges.iter().zip(bits).any(|(edge, &bit)| {
        let (_, head) = edge.oriented(bit);
        !heads.insert(head) || in_degree[head] > 0
    })
}

/// DAGs consistent with `cpdag`, at most `samples` of them (all when `None`).
///
/// Always returns at least one matrix: when every orientation is rejected the
/// determined part alone is returned. Cyclic determined parts are repaired
/// with [`approximate_maximal_acyclic_subgraph`] first.
pub fn cpdag_to_dags<R: Rng>(
    cpdag: &AdjacencyMatrix,
    samples: Option<usize>,
    options: &GraphOptions,
    rng: &mut R,
) -> Result<Vec<AdjacencyMatrix>, GraphError> {
    let parts = split_cpdag(cpdag)?;
    let tolerance = options.dag_tolerance;
    let repair_samples = options.enumeration.repair_samples;

    if parts.undetermined.is_empty() && !parts.had_self_loops {
        if is_dag(cpdag, tolerance) {
            return Ok(vec![cpdag.clone()]);
        }
        warn!(
            nodes = cpdag.nrows(),
            "fully directed CPDAG is cyclic; repairing with acyclic subgraph approximation"
        );
        let repaired = approximate_maximal_acyclic_subgraph(cpdag, repair_samples, rng)?;
        return Ok(vec![repaired]);
    }

    let mut determined = parts.determined;
    if !is_dag(&determined, tolerance) {
        warn!(
            nodes = determined.nrows(),
            "determined edges of CPDAG contain a cycle; pruning before enumeration"
        );
        determined = approximate_maximal_acyclic_subgraph(&determined, repair_samples, rng)?;
    }

    let n = determined.nrows();
    let in_degree: Vec<usize> = (0..n)
        .map(|j| determined.column(j).iter().map(|&v| usize::from(v)).sum())
        .collect();
    let edges = parts.undetermined;
    let n_bits = edges.len();

    let space = if n_bits < usize::BITS as usize {
        1usize << n_bits
    } else {
        usize::MAX
    };
    let target = samples.unwrap_or(space);

    let mut order = AssignmentOrder::new(n_bits, options, rng);
    let mut dags: Vec<AdjacencyMatrix> = Vec::new();
    let mut visited = 0usize;
    let mut colliders = 0usize;
    let mut cyclic = 0usize;

    while dags.len() < target {
        let Some(bits) = order.next_assignment(rng) else {
            break;
        };
        visited += 1;

        if creates_collider(&edges, &bits, &in_degree) {
            colliders += 1;
            continue;
        }

        let mut candidate = determined.clone();
        for (edge, &bit) in edges.iter().zip(&bits) {
            let (source, head) = edge.oriented(bit);
            candidate[(source, head)] = 1;
        }

        if is_dag(&candidate, tolerance) {
            dags.push(candidate);
        } else {
            cyclic += 1;
        }
    }

    debug!(
        nodes = n,
        undetermined = n_bits,
        visited,
        rejected_colliders = colliders,
        rejected_cycles = cyclic,
        accepted = dags.len(),
        "enumerated CPDAG orientations"
    );

    if dags.is_empty() {
        debug!("no consistent orientation found; keeping determined edges only");
        dags.push(determined);
    }
    Ok(dags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge_count;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn options_tolerance() -> f64 {
        GraphOptions::default().dag_tolerance
    }

    fn undirected(n: usize, pairs: &[(usize, usize)]) -> AdjacencyMatrix {
        let mut m = AdjacencyMatrix::zeros(n, n);
        for &(a, b) in pairs {
            m[(a, b)] = 1;
            m[(b, a)] = 1;
        }
        m
    }

    #[test]
    fn decode_is_most_significant_bit_first() {
        assert_eq!(decode_assignment(0b101, 3), vec![true, false, true]);
        assert_eq!(decode_assignment(1, 3), vec![false, false, true]);
        assert_eq!(decode_assignment(0, 0), Vec::<bool>::new());
    }

    #[test]
    fn split_orders_pairs_by_upper_then_lower() {
        let cp = undirected(3, &[(0, 2), (0, 1), (1, 2)]);
        let parts = split_cpdag(&cp).unwrap();
        assert_eq!(
            parts.undetermined,
            vec![
                UndeterminedEdge { lower: 0, upper: 1 },
                UndeterminedEdge { lower: 0, upper: 2 },
                UndeterminedEdge { lower: 1, upper: 2 },
            ]
        );
        assert_eq!(edge_count(&parts.determined), 0);
    }

    #[test]
    fn single_undirected_edge_yields_both_orientations() {
        let cp = undirected(2, &[(0, 1)]);
        let mut rng = StdRng::seed_from_u64(5);
        let dags = cpdag_to_dags(&cp, None, &GraphOptions::default(), &mut rng).unwrap();

        assert_eq!(dags.len(), 2);
        let forward = AdjacencyMatrix::from_row_slice(2, 2, &[0, 1, 0, 0]);
        let backward = AdjacencyMatrix::from_row_slice(2, 2, &[0, 0, 1, 0]);
        assert!(dags.contains(&forward));
        assert!(dags.contains(&backward));
    }

    #[test]
    fn chain_skeleton_excludes_the_collider() {
        // 0 - 1 - 2: of 4 orientations only 0 -> 1 <- 2 shares a head
        let cp = undirected(3, &[(0, 1), (1, 2)]);
        let mut rng = StdRng::seed_from_u64(9);
        let dags = cpdag_to_dags(&cp, None, &GraphOptions::default(), &mut rng).unwrap();

        assert_eq!(dags.len(), 3);
        for dag in &dags {
            assert!(!(dag[(0, 1)] == 1 && dag[(2, 1)] == 1));
        }
    }

    #[test]
    fn sample_budget_stops_early() {
        let cp = undirected(3, &[(0, 1), (1, 2)]);
        let mut rng = StdRng::seed_from_u64(1);
        let dags = cpdag_to_dags(&cp, Some(1), &GraphOptions::default(), &mut rng).unwrap();
        assert_eq!(dags.len(), 1);
    }

    #[test]
    fn determined_parent_blocks_orientation_into_child() {
        // 0 -> 1 determined, 1 - 2 undetermined: 2 -> 1 would add a collider at 1
        let mut cp = undirected(3, &[(1, 2)]);
        cp[(0, 1)] = 1;
        let mut rng = StdRng::seed_from_u64(2);
        let dags = cpdag_to_dags(&cp, None, &GraphOptions::default(), &mut rng).unwrap();

        let expected = AdjacencyMatrix::from_row_slice(3, 3, &[0, 1, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(dags, vec![expected]);
    }

    #[test]
    fn all_rejected_falls_back_to_determined_edges() {
        // 0 -> 2 and 1 -> 2 determined, 2 - 3 undetermined, plus 0 -> 3 and 1 -> 3:
        // both orientations point into a node with a determined parent
        let mut cp = undirected(4, &[(2, 3)]);
        cp[(0, 2)] = 1;
        cp[(1, 3)] = 1;
        let mut rng = StdRng::seed_from_u64(4);
        let dags = cpdag_to_dags(&cp, None, &GraphOptions::default(), &mut rng).unwrap();

        let mut determined = AdjacencyMatrix::zeros(4, 4);
        determined[(0, 2)] = 1;
        determined[(1, 3)] = 1;
        assert_eq!(dags, vec![determined]);
    }

    #[test]
    fn fully_directed_dag_is_returned_unchanged() {
        let dag = AdjacencyMatrix::from_row_slice(3, 3, &[0, 1, 1, 0, 0, 1, 0, 0, 0]);
        let mut rng = StdRng::seed_from_u64(0);
        let dags = cpdag_to_dags(&dag, None, &GraphOptions::default(), &mut rng).unwrap();
        assert_eq!(dags, vec![dag]);
    }

    #[test]
    fn fully_directed_cycle_is_repaired() {
        let cycle = AdjacencyMatrix::from_row_slice(3, 3, &[0, 1, 0, 0, 0, 1, 1, 0, 0]);
        let mut rng = StdRng::seed_from_u64(0);
        let dags = cpdag_to_dags(&cycle, None, &GraphOptions::default(), &mut rng).unwrap();
        assert_eq!(dags.len(), 1);
        assert_eq!(edge_count(&dags[0]), 2);
    }

    #[test]
    fn long_directed_cycle_is_repaired() {
        let n = 14;
        let ring = AdjacencyMatrix::from_fn(n, n, |i, j| u8::from(j == (i + 1) % n));
        let mut rng = StdRng::seed_from_u64(6);
        let dags = cpdag_to_dags(&ring, None, &GraphOptions::default(), &mut rng).unwrap();

        assert_eq!(dags.len(), 1);
        assert_ne!(dags[0], ring);
        assert!(is_dag(&dags[0], options_tolerance()));
        assert!(edge_count(&dags[0]) >= n / 2);
    }

    #[test]
    fn cyclic_determined_part_is_pruned_before_orienting() {
        // determined 0 -> 1 -> 2 -> 0, with pendant edges 0 - 3, 1 - 4, 2 - 5
        let mut cp = undirected(6, &[(0, 3), (1, 4), (2, 5)]);
        let cycle_edges = [(0, 1), (1, 2), (2, 0)];
        for &(a, b) in &cycle_edges {
            cp[(a, b)] = 1;
        }
        let mut rng = StdRng::seed_from_u64(12);
        let dags = cpdag_to_dags(&cp, None, &GraphOptions::default(), &mut rng).unwrap();

        // pruning keeps two cycle edges, leaving exactly one cycle node without
        // a parent; only its pendant edge may point either way
        assert_eq!(dags.len(), 2);
        let kept: Vec<(usize, usize)> = cycle_edges
            .iter()
            .copied()
            .filter(|&(a, b)| dags[0][(a, b)] == 1)
            .collect();
        assert_eq!(kept.len(), 2);
        let root = (0..3).find(|&v| kept.iter().all(|&(_, b)| b != v)).unwrap();

        for dag in &dags {
            assert!(is_dag(dag, options_tolerance()));
            for &(a, b) in &cycle_edges {
                assert_eq!(dag[(a, b)] == 1, kept.contains(&(a, b)));
            }
            for (node, pendant) in [(0, 3), (1, 4), (2, 5)] {
                assert_eq!(dag[(node, pendant)] + dag[(pendant, node)], 1);
                if node != root {
                    assert_eq!(dag[(node, pendant)], 1, "collider at {node}");
                }
            }
        }
        assert_ne!(dags[0][(3 + root, root)], dags[1][(3 + root, root)]);
    }

    #[test]
    fn self_loops_are_dropped() {
        let mut cp = AdjacencyMatrix::zeros(2, 2);
        cp[(0, 0)] = 1;
        cp[(0, 1)] = 1;
        let mut rng = StdRng::seed_from_u64(0);
        let dags = cpdag_to_dags(&cp, None, &GraphOptions::default(), &mut rng).unwrap();
        assert_eq!(dags, vec![AdjacencyMatrix::from_row_slice(2, 2, &[0, 1, 0, 0])]);
    }

    #[test]
    fn sampled_mode_matches_exhaustive_mode() {
        let cp = undirected(4, &[(0, 1), (1, 2), (2, 3)]);
        let mut options = GraphOptions::default();
        options.enumeration.max_exhaustive_edges = 0;

        let mut rng = StdRng::seed_from_u64(8);
        let sampled = cpdag_to_dags(&cp, None, &options, &mut rng).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let exhaustive = cpdag_to_dags(&cp, None, &GraphOptions::default(), &mut rng).unwrap();

        // a path of 3 undirected edges has 4 collider-free orientations
        assert_eq!(exhaustive.len(), 4);
        assert_eq!(sampled.len(), 4);
        for dag in &sampled {
            assert!(exhaustive.contains(dag));
        }
    }

    #[test]
    fn same_seed_same_order() {
        let cp = undirected(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            cpdag_to_dags(&cp, None, &GraphOptions::default(), &mut rng).unwrap()
        };
        assert_eq!(run(17), run(17));
    }

    #[test]
    fn rejects_non_square_input() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            cpdag_to_dags(&AdjacencyMatrix::zeros(2, 3), None, &GraphOptions::default(), &mut rng),
            Err(GraphError::NotSquare { rows: 2, cols: 3 })
        );
    }
}

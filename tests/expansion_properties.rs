use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use semtree::error::Result;
use semtree::expander::{Expander, ExpanderConfig, SeededSelector, Step, Traversal};
use semtree::graph::{EdgePolicy, NodeRole, SizeMetric};
use semtree::oracle::{NeighborOracle, TableOracle};

/// A random oracle over `size` terms, each with up to `fanout` neighbors.
fn random_oracle(seed: u64, size: usize, fanout: usize) -> TableOracle {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut oracle = TableOracle::new();
    for i in 0..size {
        let count = rng.random_range(0..=fanout);
        let neighbors: Vec<(String, f32)> = (0..count)
            .map(|_| {
                let j = rng.random_range(0..size);
                (format!("t{j}"), rng.random_range(-1.0f32..1.0))
            })
            .collect();
        oracle = oracle.with_neighbors(format!("t{i}"), neighbors);
    }
    oracle
}

fn configs() -> Vec<ExpanderConfig> {
    let mut configs = Vec::new();
    for metric in [SizeMetric::Edges, SizeMetric::Nodes] {
        for policy in [EdgePolicy::Undirected, EdgePolicy::Directed] {
            for (max_neighbors, min_similarity, max_size) in
                [(0, 0.0, 10), (3, 0.2, 5), (5, -1.0, 40), (8, 0.5, 1000)]
            {
                configs.push(
                    ExpanderConfig::default()
                        .max_neighbors(max_neighbors)
                        .min_similarity(min_similarity)
                        .max_size(max_size)
                        .size_metric(metric)
                        .edge_policy(policy),
                );
            }
        }
    }
    configs
}

#[test]
fn expansion_invariants_hold_on_random_oracles() -> Result<()> {
    for seed in 0..12 {
        let oracle = random_oracle(seed, 60, 8);
        for config in configs() {
            let expansion = Expander::new(&oracle, config.clone())?
                .with_selector(SeededSelector::new(seed))
                .expand("t0")?;
            let graph = &expansion.graph;

            // soft size bound
            assert!(graph.size(config.size_metric) <= config.max_size + config.max_neighbors);

            // threshold
            assert!(
                graph
                    .edges()
                    .iter()
                    .all(|e| e.weight >= config.min_similarity)
            );

            // root membership
            assert_eq!(graph.root(), "t0");
            assert_eq!(graph.role("t0"), Some(NodeRole::Root));
            assert_eq!(
                graph.nodes().filter(|n| n.role == NodeRole::Root).count(),
                1
            );

            // every non-root node was reported as a neighbor of a scanned term
            for edge in graph.edges() {
                assert!(expansion.scanned.contains(&edge.source));
            }

            // scanned terms are exactly the oracle calls
            assert_eq!(expansion.scanned.len(), expansion.oracle_calls);
        }
    }
    Ok(())
}

#[test]
fn each_term_queried_at_most_once_per_run() -> Result<()> {
    for seed in 0..8 {
        let config = ExpanderConfig::default()
            .max_neighbors(6)
            .min_similarity(-1.0)
            .max_size(usize::MAX);
        let oracle = random_oracle(seed, 40, 6);
        let expansion = Expander::new(&oracle, config)?.expand("t1")?;

        for i in 0..40 {
            assert!(oracle.query_count(&format!("t{i}")) <= 1);
        }
        // unbounded size still terminates by exhausting the frontier
        assert_eq!(oracle.total_queries(), expansion.scanned.len());
    }
    Ok(())
}

#[test]
fn parallel_expansion_matches_sequential_on_random_oracles() -> Result<()> {
    for seed in 0..6 {
        let oracle = random_oracle(seed, 80, 6);
        for config in configs() {
            let config = config.batch_size(4);
            let sequential = Expander::new(&oracle, config.clone())?.expand("t3")?;
            let parallel = Expander::new(&oracle, config)?.expand_parallel("t3")?;

            assert_eq!(sequential.graph.edges(), parallel.graph.edges());
            assert_eq!(sequential.scanned.as_slice(), parallel.scanned.as_slice());
        }
    }
    Ok(())
}

#[test]
fn re_expanding_scanned_terms_is_a_no_op() -> Result<()> {
    let oracle = random_oracle(99, 30, 5);
    let config = ExpanderConfig::default()
        .max_neighbors(5)
        .min_similarity(-1.0);
    let mut traversal = Traversal::new(&oracle, config, "t0");

    for _ in 0..10 {
        if traversal.step()? == Step::Exhausted {
            break;
        }
    }

    let scanned: Vec<String> = traversal.scanned().as_slice().to_vec();
    let edges = traversal.graph().edge_count();
    let frontier = traversal.frontier().len();
    let calls = traversal.oracle_calls();

    for term in &scanned {
        assert_eq!(
            traversal.expand_term(term)?,
            Step::AlreadyScanned(term.clone())
        );
    }
    assert_eq!(traversal.graph().edge_count(), edges);
    assert_eq!(traversal.frontier().len(), frontier);
    assert_eq!(traversal.oracle_calls(), calls);
    Ok(())
}

#[test]
fn unknown_root_substitution_is_reproducible() -> Result<()> {
    let oracle = random_oracle(5, 50, 4);
    let config = ExpanderConfig::default().max_neighbors(4);

    let first = Expander::new(&oracle, config.clone())?
        .with_selector(SeededSelector::new(11))
        .expand("not-a-term")?;
    let second = Expander::new(&oracle, config)?
        .with_selector(SeededSelector::new(11))
        .expand("not-a-term")?;

    assert_eq!(first.root, second.root);
    assert!(oracle.contains(&first.root));
    assert_eq!(first.graph.root(), first.root);
    assert_eq!(first.graph.edges(), second.graph.edges());

    let substitution = first.substitution.unwrap();
    assert_eq!(substitution.requested, "not-a-term");
    assert_eq!(substitution.substitute, first.root);
    Ok(())
}

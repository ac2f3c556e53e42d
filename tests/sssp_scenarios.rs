use delta_sssp::{
    compute_sssp, compute_sssp_with, BackendKind, EdgeDirection, ExecutionContext, Graph,
    SsspConfig, SsspError, Weight, INF,
};

fn contexts() -> Vec<ExecutionContext> {
    BackendKind::ALL
        .iter()
        .map(|&kind| ExecutionContext::new(kind, 4).unwrap())
        .collect()
}

fn five_vertex_graph() -> Graph {
    Graph::with_edges(
        5,
        [(0, 1, 2), (0, 2, 5), (1, 2, 1), (1, 3, 4), (2, 3, 1), (3, 4, 3)],
    )
    .unwrap()
}

#[test]
fn five_vertex_example() {
    let g = five_vertex_graph();
    for ctx in contexts() {
        let paths = compute_sssp(&g, 0, 3, &ctx).unwrap();
        assert_eq!(paths.distances(), &[0, 2, 3, 4, 7], "{ctx:?}");
    }
}

#[test]
fn disconnected_graph_keeps_inf() {
    let g = Graph::new(3);
    for ctx in contexts() {
        let paths = compute_sssp(&g, 0, 1, &ctx).unwrap();
        assert_eq!(paths.distances(), &[0, INF, INF]);
        assert_eq!(paths.stats().relaxations, 0);
    }
}

#[test]
fn triangle_terminates_for_every_delta() {
    let g = Graph::with_edges(3, [(0, 1, 1), (1, 2, 1), (2, 0, 1)]).unwrap();
    for ctx in contexts() {
        for delta in [1, 2, 3, 100, u64::MAX] {
            let paths = compute_sssp(&g, 0, delta, &ctx).unwrap();
            assert_eq!(paths.distances(), &[0, 1, 2], "delta={delta}");
        }
    }
}

#[test]
fn invalid_source_fails_before_running() {
    let g = five_vertex_graph();
    let ctx = ExecutionContext::sequential();
    let err = compute_sssp(&g, 5, 3, &ctx).unwrap_err();
    assert!(matches!(err, SsspError::InvalidSource { vertex: 5, vertices: 5 }));
    assert!(err.to_string().contains("out of range"));

    let empty = Graph::new(0);
    assert!(matches!(
        compute_sssp(&empty, 0, 3, &ctx),
        Err(SsspError::InvalidSource { .. })
    ));
}

#[test]
fn zero_delta_is_rejected() {
    let g = five_vertex_graph();
    assert!(matches!(
        compute_sssp(&g, 0, 0, &ExecutionContext::sequential()),
        Err(SsspError::InvalidDelta)
    ));
}

#[test]
fn degenerate_delta_puts_everything_in_one_bucket() {
    let g = five_vertex_graph();
    for ctx in contexts() {
        let paths = compute_sssp(&g, 0, 1_000, &ctx).unwrap();
        assert_eq!(paths.distances(), &[0, 2, 3, 4, 7]);
        assert_eq!(paths.stats().buckets_visited, 1);
        assert_eq!(paths.stats().heavy_passes, 1);
    }
}

#[test]
fn zero_weight_edges_stay_in_the_current_bucket() {
    let g = Graph::with_edges(4, [(0, 1, 0), (1, 2, 0), (2, 3, 4), (0, 3, 9)]).unwrap();
    for ctx in contexts() {
        let paths = compute_sssp(&g, 0, 2, &ctx).unwrap();
        assert_eq!(paths.distances(), &[0, 0, 0, 4]);
    }
}

#[test]
fn undirected_relaxes_both_orientations() {
    let g = Graph::with_edges(3, [(1, 0, 4), (2, 1, 3)]).unwrap();
    let ctx = ExecutionContext::sequential();

    let directed = compute_sssp(&g, 0, 2, &ctx).unwrap();
    assert_eq!(directed.distances(), &[0, INF, INF]);

    let config = SsspConfig::new(2).with_direction(EdgeDirection::Undirected);
    let undirected = compute_sssp_with(&g, 0, &config, &ctx).unwrap();
    assert_eq!(undirected.distances(), &[0, 4, 7]);
}

#[test]
fn large_weights_do_not_wrap() {
    let w = Weight::MAX;
    let g = Graph::with_edges(4, [(0, 1, w), (1, 2, w), (2, 3, w)]).unwrap();
    for ctx in contexts() {
        let paths = compute_sssp(&g, 0, u64::from(w) / 2, &ctx).unwrap();
        let w = u64::from(w);
        assert_eq!(paths.distances(), &[0, w, 2 * w, 3 * w]);
    }
}

#[test]
fn nonzero_source() {
    let g = five_vertex_graph();
    for ctx in contexts() {
        let paths = compute_sssp(&g, 2, 2, &ctx).unwrap();
        assert_eq!(paths.distances(), &[INF, INF, 0, 1, 4]);
        assert_eq!(paths.distance(2), Some(0));
        assert!(!paths.is_reachable(0));
    }
}

#[test]
fn buckets_grow_beyond_the_initial_estimate() {
    // A long chain of heavy edges walks far past (max_edge_weight / delta + 1) * 3 buckets.
    let n = 200;
    let g = Graph::with_edges(n, (0..n - 1).map(|i| (i, i + 1, 100))).unwrap();
    let config = SsspConfig::new(1);
    for ctx in contexts() {
        let paths = compute_sssp_with(&g, 0, &config, &ctx).unwrap();
        assert_eq!(paths.distance(n - 1), Some(100 * (n as u64 - 1)));
        assert!(paths.stats().bucket_count > config.initial_bucket_count());
    }
}

#[test]
fn out_of_range_bucket_fails_on_every_backend() {
    // 2^31 / 1 would need billions of bucket headers
    let g = Graph::with_edges(3, [(0, 1, 1), (1, 2, 1u32 << 31)]).unwrap();
    for ctx in contexts() {
        let err = compute_sssp(&g, 0, 1, &ctx).unwrap_err();
        assert!(
            matches!(err, SsspError::BucketLimit { index, .. } if index == (1 << 31) + 1),
            "{}: {err}",
            ctx.backend().name()
        );
    }
}

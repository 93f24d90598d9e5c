mod util;

use approx::assert_relative_eq;
use mesh_rendezvous::prelude::*;
use serial_test::serial;
use util::{eid, spmd, unit_quad};

/// Two adjacent unit squares, one per rank, with targets split across
/// the ranks and one target far outside the source domain.
fn adjacent_squares(rank: usize) -> (InMemoryMesh, Vec<[f64; 3]>) {
    let mut mesh = InMemoryMesh::new();
    mesh.add_element(eid(rank as u64 + 1), CellType::Quadrilateral, unit_quad(rank as f64))
        .unwrap();
    let points = if rank == 0 {
        vec![[0.5, 0.5, 0.0]]
    } else {
        vec![[1.5, 0.5, 0.0], [5.0, 5.0, 0.0]]
    };
    (mesh, points)
}

#[test]
#[serial]
fn two_rank_transfer_across_decompositions() {
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let (mesh, points) = adjacent_squares(rank);

        let mut map = SharedDomainMap::with_tag(comm, true, CommTag(0x4000));
        map.setup(&mesh, &StandardContainment::default(), &points)
            .unwrap();

        let mut out = vec![f64::NAN; points.len()];
        let eval = ScalarClosureEvaluator(|_, p: [f64; 3]| p[0] + p[1]);
        map.apply(&eval, &mut out).unwrap();

        (out, map.missed_target_points().unwrap().to_vec())
    });

    let (out0, missed0) = &results[0];
    assert_relative_eq!(out0[0], 1.0);
    assert!(missed0.is_empty());

    let (out1, missed1) = &results[1];
    assert_relative_eq!(out1[0], 2.0);
    assert!(out1[1].is_nan(), "unmatched point must be left untouched");
    assert_eq!(missed1, &vec![1]);
}

#[test]
#[serial]
fn target_points_on_a_remote_rank_only() {
    // All targets live on rank 1; rank 0 contributes mesh only and still
    // participates in every collective.
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let mut mesh = InMemoryMesh::new();
        mesh.add_element(
            eid(rank as u64 + 1),
            CellType::Quadrilateral,
            unit_quad(rank as f64),
        )
        .unwrap();
        let points: Vec<[f64; 3]> = if rank == 1 {
            vec![[0.25, 0.25, 0.0], [1.75, 0.75, 0.0]]
        } else {
            vec![]
        };

        let mut map = SharedDomainMap::with_tag(comm, false, CommTag(0x4100));
        map.setup(&mesh, &StandardContainment::default(), &points)
            .unwrap();

        let mut out = vec![f64::NAN; points.len()];
        let eval = ScalarClosureEvaluator(|_, p: [f64; 3]| 2.0 * p[0]);
        map.apply(&eval, &mut out).unwrap();
        out
    });

    assert!(results[0].is_empty());
    assert_eq!(results[1], vec![0.5, 3.5]);
}

#[test]
#[serial]
fn apply_is_repeatable_with_different_evaluators() {
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let (mesh, points) = adjacent_squares(rank);

        let mut map = SharedDomainMap::with_tag(comm, false, CommTag(0x4200));
        map.setup(&mesh, &StandardContainment::default(), &points)
            .unwrap();

        let mut first = vec![0.0; points.len()];
        map.apply(&ScalarClosureEvaluator(|_, p: [f64; 3]| p[0]), &mut first)
            .unwrap();
        let mut second = vec![0.0; points.len()];
        map.apply(&ScalarClosureEvaluator(|_, p: [f64; 3]| -p[1]), &mut second)
            .unwrap();
        (first, second)
    });

    assert_eq!(results[0].0[0], 0.5);
    assert_eq!(results[0].1[0], -0.5);
    assert_eq!(results[1].0[0], 1.5);
    assert_eq!(results[1].1[0], -0.5);
}

#[test]
#[serial]
fn repeated_setup_rebuilds_the_same_maps() {
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let (mesh, points) = adjacent_squares(rank);
        let containment = StandardContainment::default();

        let mut map = SharedDomainMap::with_tag(comm, true, CommTag(0x4300));
        map.setup(&mesh, &containment, &points).unwrap();
        let import_a = map.import_map().unwrap().ordinals().to_vec();
        let export_a = map.export_map().unwrap().ordinals().to_vec();
        let missed_a = map.missed_target_points().unwrap().to_vec();

        map.setup(&mesh, &containment, &points).unwrap();
        let import_b = map.import_map().unwrap().ordinals().to_vec();
        let export_b = map.export_map().unwrap().ordinals().to_vec();
        let missed_b = map.missed_target_points().unwrap().to_vec();

        (import_a == import_b, export_a == export_b, missed_a == missed_b)
    });

    for (imports_match, exports_match, missed_match) in results {
        assert!(imports_match && exports_match && missed_match);
    }
}

#[test]
#[serial]
fn disjoint_domains_error_on_every_rank() {
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let mut mesh = InMemoryMesh::new();
        mesh.add_element(
            eid(rank as u64 + 1),
            CellType::Quadrilateral,
            unit_quad(rank as f64),
        )
        .unwrap();
        // Targets nowhere near the source domain.
        let points = vec![[100.0 + rank as f64, 100.0, 0.0]];

        let mut map = SharedDomainMap::with_tag(comm, false, CommTag(0x4400));
        let err = map
            .setup(&mesh, &StandardContainment::default(), &points)
            .unwrap_err();
        (matches!(err, TransferError::DomainMismatch), map.is_mapped())
    });

    for (is_mismatch, mapped) in results {
        assert!(is_mismatch);
        assert!(!mapped);
    }
}

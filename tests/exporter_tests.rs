mod util;

use mesh_rendezvous::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use util::spmd;

#[test]
fn export_moves_values_to_the_owning_rank() {
    // Rank 0 holds source values for ordinals {10, 11}, rank 1 for {12, 13};
    // destination holdings are swapped.
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let src = if rank == 0 {
            GlobalMap::from_ordinals(vec![10, 11])
        } else {
            GlobalMap::from_ordinals(vec![12, 13])
        };
        let dst = if rank == 0 {
            GlobalMap::from_ordinals(vec![13, 12])
        } else {
            GlobalMap::from_ordinals(vec![11, 10])
        };
        let exporter = Exporter::make(&comm, CommTag(0x2100), &src, &dst).unwrap();

        let src_data: Vec<u64> = src.ordinals().iter().map(|&g| g * 100).collect();
        let mut dst_data = vec![0u64; dst.local_len()];
        exporter
            .export(&comm, CommTag(0x2108), &src_data, 1, &mut dst_data)
            .unwrap();
        dst_data
    });

    assert_eq!(results[0], vec![1300, 1200]);
    assert_eq!(results[1], vec![1100, 1000]);
}

#[test]
fn replicated_destination_ordinal_receives_on_every_holder() {
    // Ordinal 7 lives on rank 0 under the source map but on both ranks under
    // the destination map; each holder must get a copy.
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let src = if rank == 0 {
            GlobalMap::from_ordinals(vec![7])
        } else {
            GlobalMap::from_ordinals(vec![])
        };
        let dst = GlobalMap::from_ordinals(vec![7]);
        let exporter = Exporter::make(&comm, CommTag(0x2110), &src, &dst).unwrap();

        let src_data: Vec<u64> = if rank == 0 { vec![777] } else { vec![] };
        let mut dst_data = vec![0u64; 1];
        exporter
            .export(&comm, CommTag(0x2118), &src_data, 1, &mut dst_data)
            .unwrap();
        dst_data
    });

    assert_eq!(results[0], vec![777]);
    assert_eq!(results[1], vec![777]);
}

#[test]
fn source_ordinals_without_destination_are_dropped() {
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let src = if rank == 0 {
            GlobalMap::from_ordinals(vec![1, 2, 3])
        } else {
            GlobalMap::from_ordinals(vec![])
        };
        // Only ordinal 2 has a destination, on rank 1.
        let dst = if rank == 0 {
            GlobalMap::from_ordinals(vec![])
        } else {
            GlobalMap::from_ordinals(vec![2])
        };
        let exporter = Exporter::make(&comm, CommTag(0x2120), &src, &dst).unwrap();

        let src_data: Vec<u64> = if rank == 0 { vec![100, 200, 300] } else { vec![] };
        let mut dst_data = vec![0u64; dst.local_len()];
        exporter
            .export(&comm, CommTag(0x2128), &src_data, 1, &mut dst_data)
            .unwrap();
        dst_data
    });

    assert!(results[0].is_empty());
    assert_eq!(results[1], vec![200]);
}

#[test]
fn duplicate_source_resolves_to_highest_sender_rank() {
    // Both ranks claim ordinal 5 under the source map; INSERT keeps the
    // highest-ranked sender's value on every destination rank.
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let src = GlobalMap::from_ordinals(vec![5]);
        let dst = GlobalMap::from_ordinals(vec![5]);
        let exporter = Exporter::make(&comm, CommTag(0x2130), &src, &dst).unwrap();

        let src_data = vec![rank as u64 + 1];
        let mut dst_data = vec![0u64; 1];
        exporter
            .export(&comm, CommTag(0x2138), &src_data, 1, &mut dst_data)
            .unwrap();
        dst_data
    });

    assert_eq!(results[0], vec![2]);
    assert_eq!(results[1], vec![2]);
}

#[test]
fn random_redistribution_delivers_every_ordinal() {
    // 64 ordinals dealt across 3 ranks in one shuffled order under the
    // source map and an independently shuffled order under the destination
    // map; every destination slot must end up with its ordinal's value.
    let results = spmd(3, |comm| {
        let rank = comm.rank();
        let mut src_deal: Vec<u64> = (0..64).collect();
        src_deal.shuffle(&mut StdRng::seed_from_u64(11));
        let mut dst_deal: Vec<u64> = (0..64).collect();
        dst_deal.shuffle(&mut StdRng::seed_from_u64(23));

        let mine = |deal: &[u64]| -> Vec<u64> {
            deal.iter()
                .enumerate()
                .filter(|&(i, _)| i % 3 == rank)
                .map(|(_, &g)| g)
                .collect()
        };
        let src = GlobalMap::from_ordinals(mine(&src_deal));
        let dst = GlobalMap::from_ordinals(mine(&dst_deal));
        let exporter = Exporter::make(&comm, CommTag(0x2150), &src, &dst).unwrap();

        let src_data: Vec<u64> = src.ordinals().iter().map(|&g| g + 1000).collect();
        let mut dst_data = vec![0u64; dst.local_len()];
        exporter
            .export(&comm, CommTag(0x2158), &src_data, 1, &mut dst_data)
            .unwrap();
        (dst.ordinals().to_vec(), dst_data)
    });

    for (ordinals, data) in results {
        for (g, v) in ordinals.iter().zip(&data) {
            assert_eq!(*v, g + 1000);
        }
    }
}

#[test]
fn exporter_is_reusable_with_strided_payloads() {
    let results = spmd(2, |comm| {
        let rank = comm.rank();
        let src = if rank == 0 {
            GlobalMap::from_ordinals(vec![40, 41])
        } else {
            GlobalMap::from_ordinals(vec![])
        };
        let dst = if rank == 1 {
            GlobalMap::from_ordinals(vec![41, 40])
        } else {
            GlobalMap::from_ordinals(vec![])
        };
        let exporter = Exporter::make(&comm, CommTag(0x2140), &src, &dst).unwrap();

        let mut rounds = Vec::new();
        for round in 0..2u64 {
            let src_data: Vec<u64> = if rank == 0 {
                // Two components per source item.
                vec![400 + round, 4000 + round, 410 + round, 4100 + round]
            } else {
                vec![]
            };
            let mut dst_data = vec![0u64; dst.local_len() * 2];
            exporter
                .export(&comm, CommTag(0x2148), &src_data, 2, &mut dst_data)
                .unwrap();
            rounds.push(dst_data);
        }
        rounds
    });

    assert!(results[0].iter().all(|r| r.is_empty()));
    assert_eq!(results[1][0], vec![410, 4100, 400, 4000]);
    assert_eq!(results[1][1], vec![411, 4101, 401, 4001]);
}

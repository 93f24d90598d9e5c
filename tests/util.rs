#![allow(dead_code)]
use mesh_rendezvous::prelude::*;

pub fn eid(raw: u64) -> ElementId {
    ElementId::new(raw).unwrap()
}

/// Run `body` once per simulated rank, one thread per rank, over the
/// in-process mailbox. Results come back ordered by rank.
pub fn spmd<T, F>(size: usize, body: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(RayonComm) -> T + Send + Sync + Clone + 'static,
{
    let handles: Vec<_> = (0..size)
        .map(|rank| {
            let body = body.clone();
            std::thread::spawn(move || body(RayonComm::new(rank, size)))
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("rank panicked"))
        .collect()
}

/// Unit quad `[x0, x0+1] x [0, 1]` in the z = 0 plane.
pub fn unit_quad(x0: f64) -> Vec<[f64; 3]> {
    vec![
        [x0, 0.0, 0.0],
        [x0 + 1.0, 0.0, 0.0],
        [x0 + 1.0, 1.0, 0.0],
        [x0, 1.0, 0.0],
    ]
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}

//! Small collective operations built from point-to-point primitives.
//!
//! Every function here is collective: all ranks must call it with compatible
//! arguments and in the same order. The implementation follows the
//! post-all-receives-first, then-send, then-drain discipline so no pair of
//! ranks can deadlock on buffer availability.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::transfer_error::TransferError;

/// Gather an equal-sized byte payload from every rank. Result is indexed by
/// rank and includes the caller's own payload.
pub fn allgather_bytes<C: Communicator>(
    comm: &C,
    tag: CommTag,
    payload: &[u8],
) -> Result<Vec<Vec<u8>>, TransferError> {
    let rank = comm.rank();
    let size = comm.size();
    if size == 1 {
        return Ok(vec![payload.to_vec()]);
    }

    let mut recvs = Vec::with_capacity(size - 1);
    for peer in (0..size).filter(|&p| p != rank) {
        let mut buf = vec![0u8; payload.len()];
        let h = comm.irecv(peer, tag.as_u16(), &mut buf);
        recvs.push((peer, h));
    }
    let mut sends = Vec::with_capacity(size - 1);
    for peer in (0..size).filter(|&p| p != rank) {
        sends.push(comm.isend(peer, tag.as_u16(), payload));
    }

    let mut out = vec![Vec::new(); size];
    out[rank] = payload.to_vec();
    let mut maybe_err = None;
    for (peer, h) in recvs {
        match h.wait() {
            Some(data) if data.len() == payload.len() => {
                if maybe_err.is_none() {
                    out[peer] = data;
                }
            }
            Some(data) if maybe_err.is_none() => {
                maybe_err = Some(TransferError::BufferSizeMismatch {
                    neighbor: peer,
                    expected: payload.len(),
                    got: data.len(),
                });
            }
            None if maybe_err.is_none() => {
                maybe_err = Some(TransferError::CommError {
                    neighbor: peer,
                    source: "allgather receive returned no data".into(),
                });
            }
            _ => {} // already failing; just drain
        }
    }
    for s in sends {
        let _ = s.wait();
    }

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(out),
    }
}

/// Gather one `u64` from every rank, indexed by rank.
pub fn allgather_u64<C: Communicator>(
    comm: &C,
    tag: CommTag,
    value: u64,
) -> Result<Vec<u64>, TransferError> {
    let gathered = allgather_bytes(comm, tag, &value.to_le_bytes())?;
    Ok(gathered
        .iter()
        .map(|raw| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(raw);
            u64::from_le_bytes(buf)
        })
        .collect())
}

/// Exclusive prefix scan of per-rank counts. Returns `(offset, total)` where
/// `offset` is the sum of counts on lower ranks. This is the ordinal
/// numbering primitive: rank r owns the dense range `offset..offset+count`.
pub fn exclusive_scan_u64<C: Communicator>(
    comm: &C,
    tag: CommTag,
    count: u64,
) -> Result<(u64, u64), TransferError> {
    let counts = allgather_u64(comm, tag, count)?;
    let offset = counts.iter().take(comm.rank()).sum();
    let total = counts.iter().sum();
    Ok((offset, total))
}

/// Block until every rank has arrived.
pub fn barrier<C: Communicator>(comm: &C, tag: CommTag) -> Result<(), TransferError> {
    allgather_bytes(comm, tag, &[0u8]).map(|_| ())
}

/// Deliver `root`'s payload to every rank. Non-root callers pass their own
/// buffer of the agreed length; it is returned unchanged on the root.
pub fn broadcast_bytes<C: Communicator>(
    comm: &C,
    tag: CommTag,
    root: usize,
    payload: &[u8],
) -> Result<Vec<u8>, TransferError> {
    if root >= comm.size() {
        return Err(TransferError::RankOutOfRange {
            rank: root,
            size: comm.size(),
        });
    }
    let gathered = allgather_bytes(comm, tag, payload)?;
    Ok(gathered.into_iter().nth(root).unwrap_or_default())
}

/// Maximum of one `u64` per rank, on every rank.
pub fn all_reduce_max_u64<C: Communicator>(
    comm: &C,
    tag: CommTag,
    value: u64,
) -> Result<u64, TransferError> {
    let gathered = allgather_u64(comm, tag, value)?;
    Ok(gathered.into_iter().max().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, RayonComm};

    #[test]
    fn serial_allgather_is_identity() {
        let comm = NoComm;
        let got = allgather_u64(&comm, CommTag(0x0200), 17).unwrap();
        assert_eq!(got, vec![17]);
        let (offset, total) = exclusive_scan_u64(&comm, CommTag(0x0201), 5).unwrap();
        assert_eq!((offset, total), (0, 5));
    }

    #[test]
    fn serial_broadcast_and_reduce() {
        let comm = NoComm;
        let got = broadcast_bytes(&comm, CommTag(0x0202), 0, &[9, 9]).unwrap();
        assert_eq!(got, vec![9, 9]);
        assert_eq!(all_reduce_max_u64(&comm, CommTag(0x0203), 41).unwrap(), 41);
        barrier(&comm, CommTag(0x0204)).unwrap();
    }

    #[test]
    fn broadcast_from_nonzero_root() {
        let tag = CommTag(0x0220);
        let handles: Vec<_> = (0..3)
            .map(|rank| {
                std::thread::spawn(move || {
                    let comm = RayonComm::new(rank, 3);
                    let mine = [rank as u8; 2];
                    broadcast_bytes(&comm, tag, 2, &mine).unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![2, 2]);
        }
    }

    #[test]
    fn scan_over_three_ranks() {
        let tag = CommTag(0x0210);
        let handles: Vec<_> = (0..3)
            .map(|rank| {
                std::thread::spawn(move || {
                    let comm = RayonComm::new(rank, 3);
                    exclusive_scan_u64(&comm, tag, (rank as u64 + 1) * 10).unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0], (0, 60));
        assert_eq!(results[1], (10, 60));
        assert_eq!(results[2], (30, 60));
    }
}

//! Personalized inverse all-to-all: the communication plan.
//!
//! Senders know their destinations; destinations learn who will send to them
//! through a collective handshake ([`CommunicationPlan::from_sends`]). The
//! plan is the single "push data to wherever it is geometrically needed"
//! mechanism in the rendezvous algorithm, and it is reusable: one handshake,
//! then any number of [`posts_and_waits`](CommunicationPlan::posts_and_waits)
//! calls with different payloads of matching shape.
//!
//! Receive order is grouped by sender rank, ascending, with the local rank's
//! own items in their rank position. It does **not** follow the sender's
//! original item order across ranks — callers carry ordinals alongside
//! payloads whenever index correspondence matters downstream.

use bytemuck::Pod;
use log::trace;

use crate::algs::collective::allgather_bytes;
use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::transfer_error::TransferError;

/// Precomputed personalized exchange pattern.
#[derive(Clone, Debug)]
pub struct CommunicationPlan {
    rank: usize,
    n_items: usize,
    /// (destination rank, local item indices in original order), ascending rank.
    send_blocks: Vec<(usize, Vec<usize>)>,
    /// (source rank, item count), ascending rank.
    recv_blocks: Vec<(usize, usize)>,
    total_recv: usize,
}

impl CommunicationPlan {
    /// Collective handshake. `destinations[i]` is the rank that local item `i`
    /// must be delivered to. Every rank learns how many items it will receive
    /// and from whom, without knowing its senders in advance.
    pub fn from_sends<C: Communicator>(
        comm: &C,
        tag: CommTag,
        destinations: &[usize],
    ) -> Result<Self, TransferError> {
        let rank = comm.rank();
        let size = comm.size();

        let mut counts = vec![0u64; size];
        for &dest in destinations {
            if dest >= size {
                return Err(TransferError::RankOutOfRange { rank: dest, size });
            }
            counts[dest] += 1;
        }

        // Exchange the full count matrix; column `rank` gives our receives.
        let mut row = Vec::with_capacity(size * 8);
        for &c in &counts {
            row.extend_from_slice(&c.to_le_bytes());
        }
        let matrix = allgather_bytes(comm, tag, &row)?;

        let mut recv_blocks = Vec::new();
        let mut total_recv = 0usize;
        for (src, raw) in matrix.iter().enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&raw[rank * 8..rank * 8 + 8]);
            let count = u64::from_le_bytes(buf) as usize;
            if count > 0 {
                recv_blocks.push((src, count));
                total_recv += count;
            }
        }

        let mut send_blocks: Vec<(usize, Vec<usize>)> = Vec::new();
        for dest in 0..size {
            if counts[dest] > 0 {
                let items = destinations
                    .iter()
                    .enumerate()
                    .filter(|&(_, &d)| d == dest)
                    .map(|(i, _)| i)
                    .collect();
                send_blocks.push((dest, items));
            }
        }

        trace!(
            "plan on rank {rank}: {} items out to {} ranks, {total_recv} items in from {} ranks",
            destinations.len(),
            send_blocks.len(),
            recv_blocks.len()
        );

        Ok(Self {
            rank,
            n_items: destinations.len(),
            send_blocks,
            recv_blocks,
            total_recv,
        })
    }

    /// Number of items this rank will receive on each execution.
    pub fn total_receives(&self) -> usize {
        self.total_recv
    }

    /// Execute the exchange. `send` holds `stride` values per original send
    /// item, in local item order; `recv` must hold `total_receives() *
    /// stride` values and is filled grouped by sender rank, ascending.
    /// Blocking.
    pub fn posts_and_waits<C: Communicator, T: Pod>(
        &self,
        comm: &C,
        tag: CommTag,
        send: &[T],
        stride: usize,
        recv: &mut [T],
    ) -> Result<(), TransferError> {
        if send.len() != self.n_items * stride {
            return Err(TransferError::PayloadSizeMismatch {
                expected: self.n_items * stride,
                got: send.len(),
            });
        }
        if recv.len() != self.total_recv * stride {
            return Err(TransferError::PayloadSizeMismatch {
                expected: self.total_recv * stride,
                got: recv.len(),
            });
        }
        let item_bytes = std::mem::size_of::<T>() * stride;

        // Post all receives first.
        let mut pending_recvs = Vec::new();
        let mut offset = 0usize;
        for &(src, count) in &self.recv_blocks {
            if src != self.rank {
                let mut buf = vec![0u8; count * item_bytes];
                let h = comm.irecv(src, tag.as_u16(), &mut buf);
                pending_recvs.push((src, offset, count, h));
            }
            offset += count;
        }

        // Then all sends, keeping packed buffers alive until drained.
        let mut pending_sends = Vec::new();
        let mut send_bufs: Vec<Vec<T>> = Vec::new();
        for (dest, items) in &self.send_blocks {
            let mut packed = Vec::with_capacity(items.len() * stride);
            for &i in items {
                packed.extend_from_slice(&send[i * stride..(i + 1) * stride]);
            }
            if *dest == self.rank {
                // Self-delivery bypasses the transport.
                let offset = self.self_recv_offset();
                recv[offset * stride..offset * stride + packed.len()].copy_from_slice(&packed);
            } else {
                pending_sends.push(comm.isend(*dest, tag.as_u16(), crate::algs::wire::cast_slice(&packed)));
                send_bufs.push(packed);
            }
        }

        let mut maybe_err = None;
        for (src, offset, count, h) in pending_recvs {
            match h.wait() {
                Some(data) if data.len() == count * item_bytes => {
                    if maybe_err.is_none() {
                        let dst =
                            &mut recv[offset * stride..offset * stride + count * stride];
                        crate::algs::wire::cast_slice_mut(dst).copy_from_slice(&data);
                    }
                }
                Some(data) if maybe_err.is_none() => {
                    maybe_err = Some(TransferError::BufferSizeMismatch {
                        neighbor: src,
                        expected: count * item_bytes,
                        got: data.len(),
                    });
                }
                None if maybe_err.is_none() => {
                    maybe_err = Some(TransferError::CommError {
                        neighbor: src,
                        source: "plan receive returned no data".into(),
                    });
                }
                _ => {} // already failing; just drain
            }
        }
        for s in pending_sends {
            let _ = s.wait();
        }
        drop(send_bufs);

        match maybe_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Item offset of the self block within the receive layout.
    fn self_recv_offset(&self) -> usize {
        let mut offset = 0;
        for &(src, count) in &self.recv_blocks {
            if src == self.rank {
                return offset;
            }
            offset += count;
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::algs::wire::WireOrdinal;

    #[test]
    fn serial_plan_is_a_permutation() {
        let comm = NoComm;
        let plan =
            CommunicationPlan::from_sends(&comm, CommTag(0x0300), &[0, 0, 0]).unwrap();
        assert_eq!(plan.total_receives(), 3);

        let send: Vec<WireOrdinal> = [5u64, 6, 7].iter().map(|&v| WireOrdinal::of(v)).collect();
        let mut recv = vec![WireOrdinal::of(0); 3];
        plan.posts_and_waits(&comm, CommTag(0x0301), &send, 1, &mut recv)
            .unwrap();
        let got: Vec<u64> = recv.iter().map(|w| w.get()).collect();
        assert_eq!(got, vec![5, 6, 7]);
    }

    #[test]
    fn rejects_out_of_range_destination() {
        let comm = NoComm;
        let err = CommunicationPlan::from_sends(&comm, CommTag(0x0302), &[1]).unwrap_err();
        assert!(matches!(err, TransferError::RankOutOfRange { rank: 1, size: 1 }));
    }

    #[test]
    fn rejects_short_payload() {
        let comm = NoComm;
        let plan = CommunicationPlan::from_sends(&comm, CommTag(0x0303), &[0, 0]).unwrap();
        let send = vec![WireOrdinal::of(1)];
        let mut recv = vec![WireOrdinal::of(0); 2];
        let err = plan
            .posts_and_waits(&comm, CommTag(0x0304), &send, 1, &mut recv)
            .unwrap_err();
        assert!(matches!(err, TransferError::PayloadSizeMismatch { expected: 2, got: 1 }));
    }
}

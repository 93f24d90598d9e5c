//! Precomputed data movement between two [`GlobalMap`]s.
//!
//! `Exporter::make` resolves, once, which ranks own each source ordinal under
//! the destination map and freezes the communication pattern; `export` then
//! moves any number of payload buffers along it. Owner resolution goes
//! through a distributed hash directory: ordinal `g` is registered with and
//! queried at its home rank `g % size`, so no rank ever needs global
//! knowledge of either map.
//!
//! Combine policy is INSERT: received copies are applied in ascending sender
//! rank order, so when several sources write the same destination ordinal the
//! highest-ranked sender's value survives, deterministically.

use bytemuck::{Pod, Zeroable};
use hashbrown::HashMap;
use log::debug;

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::distributor::CommunicationPlan;
use crate::algs::wire::{WireOrdinal, WireOwner};
use crate::map::global_map::{GlobalMap, GlobalOrdinal};
use crate::transfer_error::TransferError;

/// Frozen export pattern from a source map to a destination map.
#[derive(Clone, Debug)]
pub struct Exporter {
    plan: CommunicationPlan,
    /// Source local index for each plan item, in plan item order.
    send_items: Vec<usize>,
    /// Destination local index for each received item, in receive order.
    recv_indices: Vec<usize>,
    src_len: usize,
    dst_len: usize,
}

impl Exporter {
    /// Collective. Precomputes the pattern that moves per-ordinal payloads
    /// from wherever they live under `src` to every rank holding them under
    /// `dst`. Source ordinals absent from `dst` are dropped. Consumes eight
    /// consecutive tags starting at `tag`.
    pub fn make<C: Communicator>(
        comm: &C,
        tag: CommTag,
        src: &GlobalMap,
        dst: &GlobalMap,
    ) -> Result<Self, TransferError> {
        let rank = comm.rank();
        let size = comm.size();
        let home = |g: GlobalOrdinal| (g % size as u64) as usize;

        // Destination ranks register their holdings with each ordinal's
        // home rank.
        let reg_dests: Vec<usize> = dst.ordinals().iter().map(|&g| home(g)).collect();
        let reg_plan = CommunicationPlan::from_sends(comm, tag, &reg_dests)?;
        let reg_send: Vec<WireOwner> = dst
            .ordinals()
            .iter()
            .map(|&g| WireOwner::new(g, rank as u32))
            .collect();
        let mut reg_recv = vec![WireOwner::zeroed(); reg_plan.total_receives()];
        reg_plan.posts_and_waits(comm, tag.offset(1), &reg_send, 1, &mut reg_recv)?;

        let mut directory: HashMap<GlobalOrdinal, Vec<u32>> = HashMap::new();
        for owner in &reg_recv {
            directory.entry(owner.ordinal()).or_default().push(owner.rank());
        }
        for owners in directory.values_mut() {
            owners.sort_unstable();
        }

        // Source ranks ask the home ranks who holds each of their ordinals.
        let query_dests: Vec<usize> = src.ordinals().iter().map(|&g| home(g)).collect();
        let query_plan = CommunicationPlan::from_sends(comm, tag.offset(2), &query_dests)?;
        let query_send: Vec<WireOwner> = src
            .ordinals()
            .iter()
            .map(|&g| WireOwner::new(g, rank as u32))
            .collect();
        let mut query_recv = vec![WireOwner::zeroed(); query_plan.total_receives()];
        query_plan.posts_and_waits(comm, tag.offset(3), &query_send, 1, &mut query_recv)?;

        // Home ranks answer each query with one record per destination owner.
        let mut reply_dests = Vec::new();
        let mut reply_send = Vec::new();
        for query in &query_recv {
            if let Some(owners) = directory.get(&query.ordinal()) {
                for &owner in owners {
                    reply_dests.push(query.rank() as usize);
                    reply_send.push(WireOwner::new(query.ordinal(), owner));
                }
            }
        }
        let reply_plan = CommunicationPlan::from_sends(comm, tag.offset(4), &reply_dests)?;
        let mut reply_recv = vec![WireOwner::zeroed(); reply_plan.total_receives()];
        reply_plan.posts_and_waits(comm, tag.offset(5), &reply_send, 1, &mut reply_recv)?;

        // One data-plan item per (source item, destination owner) pair.
        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(reply_recv.len());
        for reply in &reply_recv {
            let local = src
                .local_index(reply.ordinal())
                .ok_or(TransferError::OrdinalNotLocal(reply.ordinal()))?;
            pairs.push((local, reply.rank() as usize));
        }
        pairs.sort_unstable();
        let dropped = src.local_len().saturating_sub(
            pairs.iter().map(|&(i, _)| i).collect::<hashbrown::HashSet<_>>().len(),
        );
        if dropped > 0 {
            debug!("exporter on rank {rank}: {dropped} source ordinals have no destination owner");
        }

        let data_dests: Vec<usize> = pairs.iter().map(|&(_, d)| d).collect();
        let plan = CommunicationPlan::from_sends(comm, tag.offset(6), &data_dests)?;

        // Ship the ordinals once so receivers can freeze their scatter
        // indices; after this, export() moves payloads only.
        let ord_send: Vec<WireOrdinal> = pairs
            .iter()
            .map(|&(i, _)| WireOrdinal::of(src.ordinals()[i]))
            .collect();
        let mut ord_recv = vec![WireOrdinal::zeroed(); plan.total_receives()];
        plan.posts_and_waits(comm, tag.offset(7), &ord_send, 1, &mut ord_recv)?;
        let recv_indices = ord_recv
            .iter()
            .map(|w| {
                dst.local_index(w.get())
                    .ok_or(TransferError::OrdinalNotLocal(w.get()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            plan,
            send_items: pairs.into_iter().map(|(i, _)| i).collect(),
            recv_indices,
            src_len: src.local_len(),
            dst_len: dst.local_len(),
        })
    }

    /// Execute the pattern. `src_data` holds `stride` values per source-map
    /// local index; matching entries of `dst_data` are overwritten (INSERT),
    /// the rest are left untouched. Collective and blocking; reusable with
    /// any payload buffers of matching shape.
    pub fn export<C: Communicator, T: Pod>(
        &self,
        comm: &C,
        tag: CommTag,
        src_data: &[T],
        stride: usize,
        dst_data: &mut [T],
    ) -> Result<(), TransferError> {
        if src_data.len() != self.src_len * stride {
            return Err(TransferError::PayloadSizeMismatch {
                expected: self.src_len * stride,
                got: src_data.len(),
            });
        }
        if dst_data.len() != self.dst_len * stride {
            return Err(TransferError::PayloadSizeMismatch {
                expected: self.dst_len * stride,
                got: dst_data.len(),
            });
        }

        let mut send = Vec::with_capacity(self.send_items.len() * stride);
        for &i in &self.send_items {
            send.extend_from_slice(&src_data[i * stride..(i + 1) * stride]);
        }
        let mut recv = vec![T::zeroed(); self.recv_indices.len() * stride];
        self.plan.posts_and_waits(comm, tag, &send, stride, &mut recv)?;

        // Ascending receive order makes the INSERT tie-break deterministic.
        for (j, &dst_local) in self.recv_indices.iter().enumerate() {
            dst_data[dst_local * stride..(dst_local + 1) * stride]
                .copy_from_slice(&recv[j * stride..(j + 1) * stride]);
        }
        Ok(())
    }
}

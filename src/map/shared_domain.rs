//! The shared domain map: the orchestrator of the rendezvous transfer.
//!
//! `setup()` performs the one-time geometric search and freezes a transfer
//! plan; `apply()` then moves field values between the two decompositions as
//! often as needed. Both are collective entry points: every rank must call
//! them the same number of times, in the same order.
//!
//! The map owns all cached state exclusively. It is immutable once mapped;
//! a second `setup()` discards and rebuilds everything. No internal locking
//! is provided — single-threaded-per-process invocation is assumed.

use itertools::Itertools;
use log::debug;

use crate::algs::collective::exclusive_scan_u64;
use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::distributor::CommunicationPlan;
use crate::algs::wire::{WireCoord, WireOrdinal};
use crate::field::evaluator::FieldEvaluator;
use crate::geometry::bounding_box::{BoundingBox, global_bounding_box};
use crate::geometry::containment::Containment;
use crate::map::exporter::Exporter;
use crate::map::global_map::GlobalMap;
use crate::mesh::adapter::MeshAdapter;
use crate::mesh::element::ElementId;
use crate::rendezvous::decomposition::RendezvousDecomposition;
use crate::transfer_error::TransferError;

// Tag offsets within the map's tag block; see setup() for the protocol order.
const TAG_SOURCE_BOX: u16 = 0;
const TAG_TARGET_BOX: u16 = 1;
const TAG_RENDEZVOUS: u16 = 2; // 2 tags
const TAG_ORDINAL_SCAN: u16 = 4;
const TAG_POINT_PLAN: u16 = 5; // 2 tags
const TAG_POINT_EXPORTER: u16 = 7; // 8 tags
const TAG_COORD_EXPORT: u16 = 15;
const TAG_RANK_EXPORTER: u16 = 16; // 8 tags
const TAG_RANK_EXPORT: u16 = 24;
const TAG_INVERSE_PLAN: u16 = 25;
const TAG_INVERSE_ELEMENTS: u16 = 26;
const TAG_INVERSE_COORDS: u16 = 27;
const TAG_INVERSE_ORDINALS: u16 = 28;
const TAG_DATA_EXPORTER: u16 = 29; // 8 tags
const TAG_APPLY: u16 = 37;

/// Everything a successful `setup()` caches.
#[derive(Debug)]
struct Mapped {
    /// All locally owned target point ordinals; where results land.
    import_map: GlobalMap,
    /// Target point ordinals whose values this rank must supply.
    export_map: GlobalMap,
    /// Frozen pattern from `export_map` onto `import_map`.
    data_export: Exporter,
    /// Per export-map local index: the containing source element...
    source_elements: Vec<ElementId>,
    /// ...and the target point's coordinates.
    target_coords: Vec<[f64; 3]>,
}

#[derive(Debug, Default)]
enum MapState {
    #[default]
    Unconfigured,
    Mapped(Mapped),
}

/// Decomposition-independent map between a distributed source mesh and a
/// distributed target point set sharing a geometric domain.
pub struct SharedDomainMap<C: Communicator> {
    comm: C,
    tag: CommTag,
    keep_missed_points: bool,
    missed_points: Vec<usize>,
    state: MapState,
}

impl<C: Communicator> SharedDomainMap<C> {
    /// Default tag block claimed by a map's protocol.
    pub const DEFAULT_TAG: CommTag = CommTag::new(0x4000);

    pub fn new(comm: C, keep_missed_points: bool) -> Self {
        Self::with_tag(comm, keep_missed_points, Self::DEFAULT_TAG)
    }

    /// Use a custom tag block (38 consecutive tags) so several maps can
    /// coexist on one communicator.
    pub fn with_tag(comm: C, keep_missed_points: bool, tag: CommTag) -> Self {
        Self {
            comm,
            tag,
            keep_missed_points,
            missed_points: Vec::new(),
            state: MapState::Unconfigured,
        }
    }

    /// Whether a successful `setup()` has run.
    pub fn is_mapped(&self) -> bool {
        matches!(self.state, MapState::Mapped(_))
    }

    /// Map of all locally owned target point ordinals.
    pub fn import_map(&self) -> Result<&GlobalMap, TransferError> {
        self.mapped().map(|m| &m.import_map)
    }

    /// Map of target point ordinals this rank supplies values for.
    pub fn export_map(&self) -> Result<&GlobalMap, TransferError> {
        self.mapped().map(|m| &m.export_map)
    }

    /// Local indices of target points that fell outside the shared domain
    /// box during the last `setup()`. Only available when the map was
    /// constructed with `keep_missed_points = true`.
    pub fn missed_target_points(&self) -> Result<&[usize], TransferError> {
        if !self.keep_missed_points {
            return Err(TransferError::MissedPointsUnavailable);
        }
        self.mapped().map(|_| self.missed_points.as_slice())
    }

    fn mapped(&self) -> Result<&Mapped, TransferError> {
        match &self.state {
            MapState::Mapped(m) => Ok(m),
            MapState::Unconfigured => Err(TransferError::Unconfigured),
        }
    }

    /// Generate the shared domain map. Collective.
    ///
    /// `target_points` are the locally owned target points, in the local
    /// order the caller will use for `apply()`'s output buffer. On a
    /// domain mismatch the map is left Unconfigured with no partial state;
    /// the caller may adjust the domains and retry.
    pub fn setup<M, G>(
        &mut self,
        mesh: &M,
        containment: &G,
        target_points: &[[f64; 3]],
    ) -> Result<(), TransferError>
    where
        M: MeshAdapter,
        G: Containment,
    {
        // Invalidate any previous mapping up front.
        self.state = MapState::Unconfigured;
        self.missed_points.clear();
        let tag = self.tag;
        let rank = self.comm.rank();

        // Global boxes of both domains, then the shared box.
        let source_box = global_bounding_box(
            &self.comm,
            tag.offset(TAG_SOURCE_BOX),
            mesh.local_bounding_box()?,
        )?;
        let target_box = global_bounding_box(
            &self.comm,
            tag.offset(TAG_TARGET_BOX),
            BoundingBox::from_points(target_points.iter()),
        )?;
        let shared_box = match (source_box, target_box) {
            (Some(s), Some(t)) => {
                BoundingBox::intersection(&s, &t).ok_or(TransferError::DomainMismatch)?
            }
            _ => return Err(TransferError::DomainMismatch),
        };
        debug!(
            "shared domain box on rank {rank}: {:?}..{:?}",
            shared_box.min, shared_box.max
        );

        // Rendezvous decomposition over the source mesh, confined to the box.
        let rendezvous =
            RendezvousDecomposition::build(&self.comm, tag.offset(TAG_RENDEZVOUS), mesh, shared_box)?;

        // Route each local target point; points outside the box participate
        // in nothing further. The tiling covers the box exactly, so routing
        // doubles as the in-box test.
        let mut qualifying = Vec::new();
        let mut destinations = Vec::new();
        for (i, &p) in target_points.iter().enumerate() {
            match rendezvous.region_of_point(p) {
                Some(region) => {
                    qualifying.push(i);
                    destinations.push(region);
                }
                None => {
                    if self.keep_missed_points {
                        self.missed_points.push(i);
                    }
                }
            }
        }

        // Globally unique point ordinals: dense exclusive scan of local
        // counts, one ordinal per local point (in-box or not).
        let (offset, total) = exclusive_scan_u64(
            &self.comm,
            tag.offset(TAG_ORDINAL_SCAN),
            target_points.len() as u64,
        )?;
        let point_ordinals: Vec<u64> =
            (0..target_points.len() as u64).map(|i| offset + i).collect();
        let import_map = GlobalMap::from_ordinals(point_ordinals.clone());
        debug!("rank {rank}: {} of {total} target points, {} qualify", target_points.len(), qualifying.len());

        // Inverse communication: push qualifying point ordinals into the
        // rendezvous decomposition.
        let point_plan =
            CommunicationPlan::from_sends(&self.comm, tag.offset(TAG_POINT_PLAN), &destinations)?;
        let ordinal_send: Vec<WireOrdinal> = qualifying
            .iter()
            .map(|&i| WireOrdinal::of(point_ordinals[i]))
            .collect();
        let mut rendezvous_points =
            vec![WireOrdinal::of(0); point_plan.total_receives()];
        point_plan.posts_and_waits(
            &self.comm,
            tag.offset(TAG_POINT_PLAN + 1),
            &ordinal_send,
            1,
            &mut rendezvous_points,
        )?;
        let rendezvous_point_map =
            GlobalMap::from_ordinals(rendezvous_points.iter().map(|w| w.get()).collect());

        // Target-to-rendezvous coordinates follow the same ownership change.
        let point_exporter = Exporter::make(
            &self.comm,
            tag.offset(TAG_POINT_EXPORTER),
            &import_map,
            &rendezvous_point_map,
        )?;
        let coord_send: Vec<WireCoord> =
            target_points.iter().map(|&p| WireCoord::of(p)).collect();
        let mut rendezvous_coords =
            vec![WireCoord::of([0.0; 3]); rendezvous_point_map.local_len()];
        point_exporter.export(
            &self.comm,
            tag.offset(TAG_COORD_EXPORT),
            &coord_send,
            1,
            &mut rendezvous_coords,
        )?;
        let rendezvous_coord_values: Vec<[f64; 3]> =
            rendezvous_coords.iter().map(|w| w.get()).collect();

        // Exact local search in the rendezvous decomposition.
        let matches =
            rendezvous.elements_containing_points(&rendezvous_coord_values, containment)?;

        // Unique working set of matched elements.
        let unique_elements: Vec<u64> = matches
            .iter()
            .flatten()
            .map(|e| e.get())
            .sorted_unstable()
            .dedup()
            .collect();
        let rendezvous_element_map = GlobalMap::from_ordinals(unique_elements);

        // Each source rank stamps its rank onto the elements it owns in the
        // computation decomposition; INSERT onto the rendezvous copies.
        let mesh_element_map =
            GlobalMap::from_ordinals(mesh.elements().map(|e| e.get()).collect());
        let rank_importer = Exporter::make(
            &self.comm,
            tag.offset(TAG_RANK_EXPORTER),
            &mesh_element_map,
            &rendezvous_element_map,
        )?;
        let rank_send = vec![WireOrdinal::of(rank as u64); mesh_element_map.local_len()];
        let mut element_owner_ranks =
            vec![WireOrdinal::of(0); rendezvous_element_map.local_len()];
        rank_importer.export(
            &self.comm,
            tag.offset(TAG_RANK_EXPORT),
            &rank_send,
            1,
            &mut element_owner_ranks,
        )?;

        // Inverse leg: per matched point, send (element, coords, ordinal)
        // back to the element's true owner. Three posts on one plan.
        let mut inverse_dests = Vec::new();
        let mut matched_elements = Vec::new();
        let mut matched_coords = Vec::new();
        let mut matched_ordinals = Vec::new();
        for (i, m) in matches.iter().enumerate() {
            if let Some(element) = m {
                let set_index = rendezvous_element_map
                    .local_index(element.get())
                    .ok_or(TransferError::PostconditionViolation(
                        "matched element missing from rendezvous element map",
                    ))?;
                inverse_dests.push(element_owner_ranks[set_index].get() as usize);
                matched_elements.push(WireOrdinal::of(element.get()));
                matched_coords.push(rendezvous_coords[i]);
                matched_ordinals.push(WireOrdinal::of(rendezvous_point_map.ordinals()[i]));
            }
        }
        let inverse_plan =
            CommunicationPlan::from_sends(&self.comm, tag.offset(TAG_INVERSE_PLAN), &inverse_dests)?;
        let n_supplied = inverse_plan.total_receives();

        let mut supplied_elements = vec![WireOrdinal::of(0); n_supplied];
        inverse_plan.posts_and_waits(
            &self.comm,
            tag.offset(TAG_INVERSE_ELEMENTS),
            &matched_elements,
            1,
            &mut supplied_elements,
        )?;
        let mut supplied_coords = vec![WireCoord::of([0.0; 3]); n_supplied];
        inverse_plan.posts_and_waits(
            &self.comm,
            tag.offset(TAG_INVERSE_COORDS),
            &matched_coords,
            1,
            &mut supplied_coords,
        )?;
        let mut supplied_ordinals = vec![WireOrdinal::of(0); n_supplied];
        inverse_plan.posts_and_waits(
            &self.comm,
            tag.offset(TAG_INVERSE_ORDINALS),
            &matched_ordinals,
            1,
            &mut supplied_ordinals,
        )?;

        // Maps and the persistent transfer plan.
        let export_map =
            GlobalMap::from_ordinals(supplied_ordinals.iter().map(|w| w.get()).collect());
        let data_export = Exporter::make(
            &self.comm,
            tag.offset(TAG_DATA_EXPORTER),
            &export_map,
            &import_map,
        )?;

        let source_elements = supplied_elements
            .iter()
            .map(|w| ElementId::new(w.get()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                TransferError::PostconditionViolation("null element handle in inverse leg")
            })?;
        let target_coords: Vec<[f64; 3]> =
            supplied_coords.iter().map(|w| w.get()).collect();
        debug!("rank {rank}: supplies {} point values", source_elements.len());

        self.state = MapState::Mapped(Mapped {
            import_map,
            export_map,
            data_export,
            source_elements,
            target_coords,
        });
        Ok(())
    }

    /// Apply the map: evaluate the source field at every cached (element,
    /// point) pair and deliver the values onto the caller's target buffer,
    /// `evaluator.dim()` values per target point in import-map local order.
    /// Entries for unmatched points are left untouched. Collective.
    ///
    /// The size precondition is checked before any communication; on a
    /// violating rank no exchange is started, so peers that already entered
    /// `apply()` will block until the caller resolves the mismatch
    /// out-of-band.
    pub fn apply<E: FieldEvaluator>(
        &self,
        evaluator: &E,
        target: &mut [f64],
    ) -> Result<(), TransferError> {
        let mapped = self.mapped()?;
        let dim = evaluator.dim();
        let expected = mapped.import_map.local_len() * dim;
        if target.len() != expected {
            return Err(TransferError::TargetSizeMismatch {
                expected,
                got: target.len(),
            });
        }

        let values = evaluator.evaluate(&mapped.source_elements, &mapped.target_coords)?;
        let supplied = mapped.export_map.local_len() * dim;
        if values.len() != supplied {
            return Err(TransferError::EvaluatorSizeMismatch {
                expected: supplied,
                got: values.len(),
            });
        }

        mapped.data_export.export(
            &self.comm,
            self.tag.offset(TAG_APPLY),
            &values,
            dim,
            target,
        )
    }
}

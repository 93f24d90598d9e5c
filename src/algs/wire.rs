//! Fixed, little-endian wire records for the transfer protocol.
//!
//! All multi-byte integers are **little-endian** on the wire: stored pre-LE
//! with `.to_le()` and decoded with `from_le`. Floats travel as the LE bit
//! pattern of their `u64` representation.

use bytemuck::{Pod, Zeroable};
use std::mem::{align_of, size_of};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// A global ordinal (u64) carried on the wire.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireOrdinal {
    pub id_le: u64,
}

impl WireOrdinal {
    pub fn of(id: u64) -> Self {
        Self { id_le: id.to_le() }
    }
    pub fn get(&self) -> u64 {
        u64::from_le(self.id_le)
    }
}

/// An (ordinal, rank) pair — directory registration, query, and reply record.
/// NOTE: `rank_le` is u32 (never usize) on the wire.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireOwner {
    pub ordinal_le: u64,
    pub rank_le: u32,
    pub _pad: u32, // pad to 8-byte alignment (explicit)
}

impl WireOwner {
    pub fn new(ordinal: u64, rank: u32) -> Self {
        Self {
            ordinal_le: ordinal.to_le(),
            rank_le: rank.to_le(),
            _pad: 0,
        }
    }
    pub fn ordinal(&self) -> u64 {
        u64::from_le(self.ordinal_le)
    }
    pub fn rank(&self) -> u32 {
        u32::from_le(self.rank_le)
    }
}

/// A 3D coordinate as LE `f64` bit patterns.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireCoord {
    pub bits_le: [u64; 3],
}

impl WireCoord {
    pub fn of(p: [f64; 3]) -> Self {
        Self {
            bits_le: [
                p[0].to_bits().to_le(),
                p[1].to_bits().to_le(),
                p[2].to_bits().to_le(),
            ],
        }
    }
    pub fn get(&self) -> [f64; 3] {
        [
            f64::from_bits(u64::from_le(self.bits_le[0])),
            f64::from_bits(u64::from_le(self.bits_le[1])),
            f64::from_bits(u64::from_le(self.bits_le[2])),
        ]
    }
}

/// Maximum vertices of any supported cell (hexahedron).
pub const WIRE_ELEMENT_MAX_VERTS: usize = 8;

/// A packed mesh element: handle, cell kind, and padded vertex coordinates.
/// Used when redistributing source elements into the rendezvous
/// decomposition.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireElement {
    pub handle_le: u64,
    pub kind_le: u32,
    pub n_verts_le: u32,
    pub coords_le: [u64; 3 * WIRE_ELEMENT_MAX_VERTS],
}

impl WireElement {
    pub fn new(handle: u64, kind: u32, vertices: &[[f64; 3]]) -> Self {
        debug_assert!(vertices.len() <= WIRE_ELEMENT_MAX_VERTS);
        let mut coords_le = [0u64; 3 * WIRE_ELEMENT_MAX_VERTS];
        for (i, v) in vertices.iter().enumerate() {
            for d in 0..3 {
                coords_le[3 * i + d] = v[d].to_bits().to_le();
            }
        }
        Self {
            handle_le: handle.to_le(),
            kind_le: kind.to_le(),
            n_verts_le: (vertices.len() as u32).to_le(),
            coords_le,
        }
    }

    pub fn handle(&self) -> u64 {
        u64::from_le(self.handle_le)
    }

    pub fn kind(&self) -> u32 {
        u32::from_le(self.kind_le)
    }

    pub fn vertices(&self) -> Vec<[f64; 3]> {
        let n = (u32::from_le(self.n_verts_le) as usize).min(WIRE_ELEMENT_MAX_VERTS);
        (0..n)
            .map(|i| {
                [
                    f64::from_bits(u64::from_le(self.coords_le[3 * i])),
                    f64::from_bits(u64::from_le(self.coords_le[3 * i + 1])),
                    f64::from_bits(u64::from_le(self.coords_le[3 * i + 2])),
                ]
            })
            .collect()
    }
}

// ===== Compile-time sanity checks =========================================

const _: () = {
    // Pod/Zeroable ensures no padding contains uninit when cast to bytes.
    assert!(size_of::<WireOrdinal>() == 8);
    assert!(size_of::<WireOwner>() == 16);
    assert!(size_of::<WireCoord>() == 24);
    assert!(size_of::<WireElement>() == 16 + 24 * WIRE_ELEMENT_MAX_VERTS);
    assert!(align_of::<WireOwner>() == 8);
};

// sharding.rs — Sharding descriptors and their concrete tilings
//
// A `ShardingDescriptor` says how a value is partitioned across devices. For
// array values it is converted into a `Tiling` (replicate, single device, or
// per-dimension tile factors) once the array's rank is known. Tuple values
// carry one descriptor per element.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ShardError;

// ── Descriptors ─────────────────────────────────────────────────────────────

/// Tile assignment of a tiled sharding.
///
/// `dimensions[i]` is the number of tiles along tile dimension `i`. With
/// `replicate_on_last_tile_dim`, the trailing tile dimension does not split
/// data: it groups devices that hold identical copies of a tile.
///
/// `devices` lists device ids in row-major tile order. An empty list means the
/// implicit assignment `0..product(dimensions)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAssignment {
    pub dimensions: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub replicate_on_last_tile_dim: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TileAssignment {
    /// Tile assignment with implicit device order.
    pub fn new(dimensions: Vec<u64>) -> Self {
        Self {
            dimensions,
            devices: Vec::new(),
            replicate_on_last_tile_dim: false,
        }
    }

    pub fn with_devices(mut self, devices: Vec<u64>) -> Self {
        self.devices = devices;
        self
    }

    pub fn replicating_last_tile_dim(mut self) -> Self {
        self.replicate_on_last_tile_dim = true;
        self
    }

    /// Total number of tiles (devices) in the assignment, if it fits in `u64`.
    pub fn device_count(&self) -> Option<u64> {
        self.dimensions
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d))
    }

    /// Number of tile dimensions that split data.
    pub fn data_rank(&self) -> usize {
        if self.replicate_on_last_tile_dim {
            self.dimensions.len().saturating_sub(1)
        } else {
            self.dimensions.len()
        }
    }
}

/// How a value is partitioned across devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShardingDescriptor {
    /// Every device holds the full value.
    Replicated,
    /// A single device holds the full value.
    Maximal { device: u64 },
    /// The value is split into equal tiles along its dimensions.
    Tiled(TileAssignment),
    /// One descriptor per element of a tuple value.
    Tuple { elements: Vec<ShardingDescriptor> },
}

impl ShardingDescriptor {
    /// Tiled sharding with implicit device order.
    pub fn tiled(dimensions: Vec<u64>) -> Self {
        ShardingDescriptor::Tiled(TileAssignment::new(dimensions))
    }

    pub fn tuple(elements: Vec<ShardingDescriptor>) -> Self {
        ShardingDescriptor::Tuple { elements }
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, ShardingDescriptor::Tuple { .. })
    }

    /// Convert a non-tuple descriptor into a concrete tiling for an array of
    /// the given rank.
    pub fn to_tiling(&self, rank: usize) -> Result<Tiling, ShardError> {
        match self {
            ShardingDescriptor::Replicated => Ok(Tiling::Replicated),
            ShardingDescriptor::Maximal { device } => Ok(Tiling::Maximal { device: *device }),
            ShardingDescriptor::Tiled(assignment) => tiling_from_assignment(assignment, rank),
            ShardingDescriptor::Tuple { elements } => Err(ShardError::invalid_sharding(format!(
                "tuple sharding with {} element(s) has no single tiling",
                elements.len()
            ))),
        }
    }
}

fn tiling_from_assignment(assignment: &TileAssignment, rank: usize) -> Result<Tiling, ShardError> {
    let sharding = ShardingDescriptor::Tiled(assignment.clone());
    if assignment.dimensions.is_empty() {
        return Err(ShardError::invalid_sharding(format!(
            "{} has an empty tile assignment",
            sharding
        )));
    }
    if let Some(dim) = assignment.dimensions.iter().position(|&d| d == 0) {
        return Err(ShardError::invalid_sharding(format!(
            "{} has zero tiles along tile dimension {}",
            sharding, dim
        )));
    }
    if assignment.data_rank() != rank {
        let expected = rank + usize::from(assignment.replicate_on_last_tile_dim);
        return Err(ShardError::invalid_sharding(format!(
            "{} has {} tile dimension(s), expected {} for a rank-{} shape",
            sharding,
            assignment.dimensions.len(),
            expected,
            rank
        )));
    }
    let device_count = assignment.device_count().ok_or_else(|| {
        ShardError::invalid_sharding(format!("{} has too many tiles", sharding))
    })?;
    if !assignment.devices.is_empty() {
        if assignment.devices.len() as u64 != device_count {
            return Err(ShardError::invalid_sharding(format!(
                "{} lists {} device(s) but its tile dimensions imply {}",
                sharding,
                assignment.devices.len(),
                device_count
            )));
        }
        let mut seen = HashSet::with_capacity(assignment.devices.len());
        if let Some(dup) = assignment.devices.iter().find(|d| !seen.insert(**d)) {
            return Err(ShardError::invalid_sharding(format!(
                "{} assigns device {} more than once",
                sharding, dup
            )));
        }
    }
    Ok(Tiling::Tiled {
        tile_factors: assignment.dimensions[..rank].to_vec(),
    })
}

// ── Concrete tiling ─────────────────────────────────────────────────────────

/// Concrete partitioning of one array value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tiling {
    Replicated,
    Maximal { device: u64 },
    /// `tile_factors[i]` tiles along array dimension `i` (1 = not split).
    Tiled { tile_factors: Vec<u64> },
}

impl Tiling {
    /// Dimensions of the tile one device holds.
    ///
    /// Uneven splits round up: the last tile is padded to the common size.
    pub fn tile_dimensions(&self, dimensions: &[u64]) -> Vec<u64> {
        match self {
            Tiling::Replicated | Tiling::Maximal { .. } => dimensions.to_vec(),
            Tiling::Tiled { tile_factors } => dimensions
                .iter()
                .zip(tile_factors)
                .map(|(&dim, &factor)| dim.div_ceil(factor))
                .collect(),
        }
    }
}

impl fmt::Display for Tiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tiling::Replicated => f.write_str("replicated"),
            Tiling::Maximal { device } => write!(f, "device {}", device),
            Tiling::Tiled { tile_factors } => write!(f, "tiles {:?}", tile_factors),
        }
    }
}

// ── Display ─────────────────────────────────────────────────────────────────

impl fmt::Display for ShardingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardingDescriptor::Replicated => f.write_str("{replicated}"),
            ShardingDescriptor::Maximal { device } => write!(f, "{{maximal device={}}}", device),
            ShardingDescriptor::Tiled(assignment) => {
                f.write_str("{devices=[")?;
                for (i, d) in assignment.dimensions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", d)?;
                }
                f.write_str("]")?;
                if assignment.devices.is_empty() {
                    match assignment.device_count() {
                        Some(n) => write!(f, "<=[{}]", n)?,
                        None => f.write_str("<=[?]")?,
                    }
                } else {
                    for (i, d) in assignment.devices.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{}", d)?;
                    }
                }
                if assignment.replicate_on_last_tile_dim {
                    f.write_str(" last_tile_dim_replicate")?;
                }
                f.write_str("}")
            }
            ShardingDescriptor::Tuple { elements } => {
                f.write_str("{")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                f.write_str("}")
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

//! Work-group sizing for the one-element-per-work-item dispatch.

use serde::Serialize;
use thiserror::Error;

/// Upper bound on work-items per work-group.
pub const MAX_WORKGROUP_SIZE: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("cannot dispatch an empty sequence")]
    Empty,
    #[error("device reports a zero work-group limit per dimension")]
    NoWorkgroups,
    #[error(
        "{elements} elements need {workgroups} work-groups, more than a {limit}x{limit} grid \
         with 32-bit indices allows"
    )]
    TooLarge {
        elements: u32,
        workgroups: u32,
        limit: u32,
    },
}

/// How `elements` work-items are laid out on the device.
///
/// `workgroup_count * workgroup_size` is the logical global size: `elements`
/// rounded up to a multiple of the work-group size. When the count exceeds the
/// per-dimension limit the groups are folded into a 2D grid and the kernel
/// linearizes `gid.y * row_stride + gid.x`. Every index `>= elements` must be
/// discarded by the kernel.
///
/// The kernel indexes in `u32`, so every launched work-item's linear index,
/// padding included, has to fit in `u32`. Plans that would wrap are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    pub elements: u32,
    pub workgroup_size: u32,
    pub workgroup_count: u32,
    pub grid: [u32; 3],
    pub row_stride: u32,
}

impl DispatchPlan {
    pub fn new(elements: u32, max_groups_per_dimension: u32) -> Result<Self, DispatchError> {
        if elements == 0 {
            return Err(DispatchError::Empty);
        }
        if max_groups_per_dimension == 0 {
            return Err(DispatchError::NoWorkgroups);
        }

        let workgroup_size = elements.min(MAX_WORKGROUP_SIZE);
        let workgroup_count = elements.div_ceil(workgroup_size);

        let too_large = DispatchError::TooLarge {
            elements,
            workgroups: workgroup_count,
            limit: max_groups_per_dimension,
        };

        let grid = if workgroup_count <= max_groups_per_dimension {
            [workgroup_count, 1, 1]
        } else {
            let rows = workgroup_count.div_ceil(max_groups_per_dimension);
            if rows > max_groups_per_dimension {
                return Err(too_large);
            }
            [max_groups_per_dimension, rows, 1]
        };

        let row_stride = grid[0].checked_mul(workgroup_size).ok_or(too_large.clone())?;
        let launched = u64::from(grid[1]) * u64::from(row_stride);
        if launched > u64::from(u32::MAX) + 1 {
            return Err(too_large);
        }

        Ok(Self {
            elements,
            workgroup_size,
            workgroup_count,
            grid,
            row_stride,
        })
    }

    /// Logical global size (`elements` rounded up to the work-group size).
    pub fn global_size(&self) -> u64 {
        u64::from(self.workgroup_count) * u64::from(self.workgroup_size)
    }

    /// Work-items actually launched, including any padding row of a folded grid.
    pub fn dispatched_items(&self) -> u64 {
        self.grid.iter().map(|&g| u64::from(g)).product::<u64>() * u64::from(self.workgroup_size)
    }

    /// Index a work-item at global id `(x, y)` writes, or `None` when it is a
    /// trailing item that must not touch the output.
    pub fn element_index(&self, x: u32, y: u32) -> Option<u32> {
        let index = u64::from(y) * u64::from(self.row_stride) + u64::from(x);
        (index < u64::from(self.elements)).then_some(index as u32)
    }
}

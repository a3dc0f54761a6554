//! Precomputed chunk offsets around the viewer.

use cgmath::{Point3, Vector3};

/// Chunk offsets inside the view volume, nearest first.
///
/// Offsets are sorted by Chebyshev distance, then by squared Euclidean
/// distance, so the creation queue fills shells outward from the viewer.
/// Ties keep their x, y, z iteration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewOffsets {
    view_distance: i32,
    view_distance_y: i32,
    offsets: Vec<Vector3<i32>>,
}

impl ViewOffsets {
    /// Computes the offsets for the given radii.
    ///
    /// # Arguments
    /// * `view_distance` - Horizontal radius in chunks
    /// * `view_distance_y` - Vertical radius in chunks
    pub fn new(view_distance: i32, view_distance_y: i32) -> Self {
        let view_distance = view_distance.max(0);
        let view_distance_y = view_distance_y.max(0);

        let mut offsets = Vec::with_capacity(
            ((2 * view_distance + 1).pow(2) * (2 * view_distance_y + 1)) as usize,
        );
        for x in -view_distance..=view_distance {
            for y in -view_distance_y..=view_distance_y {
                for z in -view_distance..=view_distance {
                    let offset = Vector3::new(x, y, z);
                    if in_view(offset, view_distance, view_distance_y) {
                        offsets.push(offset);
                    }
                }
            }
        }

        offsets.sort_by_key(|offset| {
            let chebyshev = offset.x.abs().max(offset.y.abs()).max(offset.z.abs());
            let euclidean = offset.x * offset.x + offset.y * offset.y + offset.z * offset.z;
            (chebyshev, euclidean)
        });

        ViewOffsets {
            view_distance,
            view_distance_y,
            offsets,
        }
    }

    /// Horizontal radius in chunks.
    pub fn view_distance(&self) -> i32 {
        self.view_distance
    }

    /// Vertical radius in chunks.
    pub fn view_distance_y(&self) -> i32 {
        self.view_distance_y
    }

    /// Whether the radii differ from the ones these offsets were built for.
    pub fn is_stale(&self, view_distance: i32, view_distance_y: i32) -> bool {
        self.view_distance != view_distance.max(0) || self.view_distance_y != view_distance_y.max(0)
    }

    /// The sorted offsets.
    pub fn offsets(&self) -> &[Vector3<i32>] {
        &self.offsets
    }

    /// Number of chunks in the view volume.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the view volume is empty.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Whether `chunk` lies in the view volume centered on `center`.
    pub fn contains(&self, center: Point3<i32>, chunk: Point3<i32>) -> bool {
        in_view(chunk - center, self.view_distance, self.view_distance_y)
    }

    /// Whether `chunk` lies within the view volume grown by `margin` chunks.
    pub fn contains_with_margin(&self, center: Point3<i32>, chunk: Point3<i32>, margin: i32) -> bool {
        in_view(
            chunk - center,
            self.view_distance + margin.max(0),
            self.view_distance_y + margin.max(0),
        )
    }
}

/// Horizontal disc of radius `view_distance`, vertical band of half-height
/// `view_distance_y`.
fn in_view(offset: Vector3<i32>, view_distance: i32, view_distance_y: i32) -> bool {
    offset.x * offset.x + offset.z * offset.z <= view_distance * view_distance
        && offset.y.abs() <= view_distance_y
}

//! Vertex correspondence between two polygons.
//!
//! The angle-sort matcher assumes both polygons are star-shaped around their
//! own centroid and similarly oriented. Concave shapes or very different
//! vertex counts can yield a non-physical band; a stricter matcher (e.g. a
//! minimum-displacement DP) plugs in through `VertexMatcher`.

use crate::geomath::{angle_order, Point};

/// Aligned vertex pairs between an outer and an inner polygon.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Correspondence {
    /// Outer polygon in matcher order.
    pub outer: Vec<Point>,
    /// Inner polygon in matcher order.
    pub inner: Vec<Point>,
    /// `(i, j)` pairs indexing `outer` and `inner`.
    pub pairs: Vec<(usize, usize)>,
    /// `outer_order[i]` is the input index of `outer[i]`.
    pub outer_order: Vec<usize>,
    /// `inner_order[j]` is the input index of `inner[j]`.
    pub inner_order: Vec<usize>,
}

impl Correspondence {
    /// Pairs expressed as indices into the caller's original sequences.
    pub fn source_pairs(&self) -> Vec<(usize, usize)> {
        self.pairs
            .iter()
            .map(|&(i, j)| (self.outer_order[i], self.inner_order[j]))
            .collect()
    }
}

pub trait VertexMatcher {
    fn correspond(&self, outer: &[Point], inner: &[Point]) -> Correspondence;
}

/// Default matcher: sort both polygons by angle around their centroids, then
/// pair equal indices up to the shorter length.
#[derive(Clone, Copy, Debug, Default)]
pub struct AngleSortMatcher;

impl VertexMatcher for AngleSortMatcher {
    fn correspond(&self, outer: &[Point], inner: &[Point]) -> Correspondence {
        let outer_order = angle_order(outer);
        let inner_order = angle_order(inner);
        let outer: Vec<Point> = outer_order.iter().map(|&i| outer[i]).collect();
        let inner: Vec<Point> = inner_order.iter().map(|&i| inner[i]).collect();
        let n = outer.len().min(inner.len());
        let pairs = (0..n).map(|i| (i % outer.len(), i % inner.len())).collect();
        Correspondence {
            outer,
            inner,
            pairs,
            outer_order,
            inner_order,
        }
    }
}

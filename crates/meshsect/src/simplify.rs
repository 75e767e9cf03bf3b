//! Loop simplification - merge collinear runs into single straight edges.

use meshsect_math::{angle_between, Tolerance};
use tracing::trace;

use crate::section_loop::{SectionLoop, SectionPoint};

/// Is `mid` a straight pass-through between `from` and `to`?
///
/// Zero-length edges never count as straight.
fn is_straight(from: &SectionPoint, mid: &SectionPoint, to: &SectionPoint, tol: &Tolerance) -> bool {
    let a = from.position - mid.position;
    let b = to.position - mid.position;
    angle_between(&a, &b).is_some_and(|angle| tol.is_straight(angle))
}

/// Remove interior points whose neighbors make a straight angle through them.
///
/// Walks every point triple (wrapping around closed loops) keeping the start
/// of the current straight run fixed, so a run of any length collapses to
/// one edge. The run's first point is tagged `LineStart` and its last point
/// `LineEnd` (or `LineStartAndEnd` when a point ends one run and starts the
/// next). Open loops keep both endpoints. Closed loops keep at least three
/// points and open loops at least two. Running this on its own output
/// removes nothing.
pub fn merge_collinear(section: &SectionLoop, tol: &Tolerance) -> SectionLoop {
    let n = section.points.len();
    if !section.connected || n < 3 {
        return section.clone();
    }

    let mut points = section.points.clone();
    let mut removed = vec![false; n];
    let mut remaining = n;
    let min_points = if section.closed { 3 } else { 2 };

    // (mid, end) index pairs to test; the anchor is tracked separately
    let checks: Vec<(usize, usize)> = if section.closed {
        (1..=n).map(|mid| (mid % n, (mid + 1) % n)).collect()
    } else {
        (1..n - 1).map(|mid| (mid, mid + 1)).collect()
    };

    let mut anchor = 0;
    for (mid, end) in checks {
        // Skip ahead past points already dropped from the front of the loop
        let end = next_kept(&removed, end, section.closed).unwrap_or(end);
        if removed[mid] || mid == anchor || end == anchor {
            continue;
        }

        if remaining > min_points && is_straight(&points[anchor], &points[mid], &points[end], tol) {
            removed[mid] = true;
            remaining -= 1;
            points[anchor].kind = points[anchor].kind.with_line_start();
            points[end].kind = points[end].kind.with_line_end();
        } else {
            anchor = mid;
        }
    }

    let dropped = n - remaining;
    if dropped > 0 {
        trace!(dropped, remaining, closed = section.closed, "merged collinear points");
    }

    SectionLoop {
        points: points
            .into_iter()
            .zip(removed)
            .filter_map(|(p, gone)| (!gone).then_some(p))
            .collect(),
        closed: section.closed,
        connected: section.connected,
    }
}

/// First index at or after `from` (wrapping when `circular`) not yet removed.
fn next_kept(removed: &[bool], from: usize, circular: bool) -> Option<usize> {
    let n = removed.len();
    if circular {
        (0..n).map(|k| (from + k) % n).find(|&i| !removed[i])
    } else {
        (from..n).find(|&i| !removed[i])
    }
}

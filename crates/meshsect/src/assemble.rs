//! Loop assembly - stitch unordered section segments into chains.

use meshsect_math::{Point3, Tolerance};
use tracing::{debug, trace};

use crate::intersect::Segment;
use crate::section_loop::{LoopBuilder, SectionLoop, SectionPoint};

/// Which end of the growing loop a segment attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Head,
    Tail,
}

/// A segment that touches the loop, and the point it contributes.
#[derive(Debug, Clone, Copy)]
struct Attachment {
    segment: usize,
    point: Point3,
    end: End,
}

/// Find the first unused segment touching the loop's head or tail.
///
/// Segments are tried in index order, and for each segment the four
/// endpoint pairings in a fixed order, so ties always resolve the same way.
fn find_attachment(
    segments: &[Segment],
    used: &[bool],
    head: &Point3,
    tail: &Point3,
    tol: &Tolerance,
) -> Option<Attachment> {
    segments
        .iter()
        .enumerate()
        .filter(|(i, _)| !used[*i])
        .find_map(|(i, seg)| {
            let (point, end) = if tol.points_equal(&seg.start, head) {
                (seg.end, End::Head)
            } else if tol.points_equal(&seg.start, tail) {
                (seg.end, End::Tail)
            } else if tol.points_equal(&seg.end, head) {
                (seg.start, End::Head)
            } else if tol.points_equal(&seg.end, tail) {
                (seg.start, End::Tail)
            } else {
                return None;
            };
            Some(Attachment {
                segment: i,
                point,
                end,
            })
        })
}

/// Stitch segments into loops by matching endpoints within the coincidence
/// tolerance.
///
/// Each loop is seeded from the lowest-index unused segment and grown at
/// whichever end a matching segment touches. A loop closes when the point a
/// segment would add coincides with the loop's opposite end; that point is
/// not added. A loop that runs out of matches is kept as an open chain, so
/// every segment ends up in exactly one loop. Points within tolerance of the
/// end they would extend are skipped to avoid zero-length edges.
///
/// This is a quadratic scan; the crossing count is small next to the mesh.
pub fn assemble_loops(segments: &[Segment], tol: &Tolerance) -> Vec<SectionLoop> {
    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();
    let mut next_seed = 0;

    while let Some(seed) = (next_seed..segments.len()).find(|&i| !used[i]) {
        used[seed] = true;
        next_seed = seed + 1;

        let mut builder = LoopBuilder::seeded(segments[seed].start, segments[seed].end);
        let mut closed = false;

        while let Some(att) = find_attachment(segments, &used, &builder.head(), &builder.tail(), tol) {
            used[att.segment] = true;

            let (opposite, adjacent) = match att.end {
                End::Head => (builder.tail(), builder.head()),
                End::Tail => (builder.head(), builder.tail()),
            };

            if tol.points_equal(&att.point, &opposite) {
                closed = true;
                break;
            }

            if tol.points_equal(&att.point, &adjacent) {
                trace!(segment = att.segment, "skipping zero-length edge");
                continue;
            }

            match att.end {
                End::Head => builder.push_front(att.point),
                End::Tail => builder.push_back(att.point),
            }
        }

        let section = builder.finish(closed);
        trace!(points = section.len(), closed, "finished loop");
        loops.push(section);
    }

    debug!(
        segments = segments.len(),
        loops = loops.len(),
        closed = loops.iter().filter(|l| l.closed).count(),
        "assembled loops"
    );

    loops
}

/// Dump segments without stitching: one unconnected loop of (start, end) pairs.
pub fn unconnected_loop(segments: &[Segment]) -> SectionLoop {
    SectionLoop {
        points: segments
            .iter()
            .flat_map(|s| [SectionPoint::new(s.start), SectionPoint::new(s.end)])
            .collect(),
        closed: false,
        connected: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn seg(a: Point3, b: Point3) -> Segment {
        Segment::new(a, b)
    }

    /// Is `got` the same cycle as `expected`, in either direction?
    fn cyclically_equal(got: &SectionLoop, expected: &[Point3]) -> bool {
        let n = expected.len();
        if got.len() != n {
            return false;
        }
        let pts: Vec<Point3> = got.positions().copied().collect();
        let same = |a: &Point3, b: &Point3| (a - b).norm() < 1e-9;
        (0..n).any(|shift| {
            let forward = (0..n).all(|i| same(&pts[i], &expected[(i + shift) % n]));
            let backward = (0..n).all(|i| same(&pts[i], &expected[(shift + n - i) % n]));
            forward || backward
        })
    }

    #[test]
    fn test_shuffled_polygon_reassembles() {
        let hexagon: Vec<Point3> = (0..6)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / 6.0;
                p(a.cos(), a.sin())
            })
            .collect();

        // Edges out of order, some flipped
        let order = [3, 0, 5, 1, 4, 2];
        let segments: Vec<Segment> = order
            .iter()
            .map(|&i| {
                let (a, b) = (hexagon[i], hexagon[(i + 1) % 6]);
                if i % 2 == 0 {
                    seg(b, a)
                } else {
                    seg(a, b)
                }
            })
            .collect();

        let loops = assemble_loops(&segments, &Tolerance::DEFAULT);
        assert_eq!(loops.len(), 1);
        assert!(loops[0].closed);
        assert!(loops[0].connected);
        assert!(cyclically_equal(&loops[0], &hexagon));
    }

    #[test]
    fn test_disjoint_segments_stay_open() {
        let segments = vec![seg(p(0.0, 0.0), p(1.0, 0.0)), seg(p(5.0, 5.0), p(6.0, 5.0))];
        let loops = assemble_loops(&segments, &Tolerance::DEFAULT);
        assert_eq!(loops.len(), 2);
        for l in &loops {
            assert!(!l.closed);
            assert_eq!(l.len(), 2);
        }
        assert_relative_eq!(loops[1].start().unwrap().position, p(5.0, 5.0));
    }

    #[test]
    fn test_open_chain_grows_at_both_ends() {
        // Seed is the middle segment
        let segments = vec![
            seg(p(1.0, 0.0), p(2.0, 0.0)),
            seg(p(0.0, 0.0), p(1.0, 0.0)),
            seg(p(3.0, 0.0), p(2.0, 0.0)),
        ];
        let loops = assemble_loops(&segments, &Tolerance::DEFAULT);
        assert_eq!(loops.len(), 1);
        let xs: Vec<f64> = loops[0].positions().map(|q| q.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(!loops[0].closed);
    }

    #[test]
    fn test_near_coincident_endpoints_match() {
        let tol = Tolerance::DEFAULT;
        let segments = vec![
            seg(p(0.0, 0.0), p(1.0, 0.0)),
            seg(p(1.0 + 5e-7, 0.0), p(1.0, 1.0)),
            seg(p(1.0, 1.0), p(0.0, 5e-7)),
        ];
        let loops = assemble_loops(&segments, &tol);
        assert_eq!(loops.len(), 1);
        assert!(loops[0].closed);
        assert_eq!(loops[0].len(), 3);
    }

    #[test]
    fn test_zero_length_edge_is_skipped() {
        // Second segment's far end is within tolerance of the point it touches
        let segments = vec![
            seg(p(0.0, 0.0), p(1.0, 0.0)),
            seg(p(1.0, 0.0), p(1.0 + 1e-7, 0.0)),
            seg(p(1.0, 0.0), p(2.0, 0.0)),
        ];
        let loops = assemble_loops(&segments, &Tolerance::DEFAULT);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 3);
    }

    #[test]
    fn test_two_separate_squares() {
        let square = |ox: f64| {
            let c = [p(ox, 0.0), p(ox + 1.0, 0.0), p(ox + 1.0, 1.0), p(ox, 1.0)];
            (0..4).map(move |i| seg(c[i], c[(i + 1) % 4])).collect::<Vec<_>>()
        };
        let mut segments = square(0.0);
        segments.extend(square(10.0));
        segments.swap(1, 6);

        let loops = assemble_loops(&segments, &Tolerance::DEFAULT);
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(|l| l.closed && l.len() == 4));
    }

    #[test]
    fn test_unconnected_loop_pairs() {
        let segments = vec![seg(p(0.0, 0.0), p(1.0, 0.0)), seg(p(5.0, 5.0), p(6.0, 5.0))];
        let l = unconnected_loop(&segments);
        assert!(!l.connected);
        assert!(!l.closed);
        assert_eq!(l.len(), 4);
        assert_relative_eq!(l.points[2].position, p(5.0, 5.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble_loops(&[], &Tolerance::DEFAULT).is_empty());
    }
}

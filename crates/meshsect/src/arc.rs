//! Arc fitting - collapse runs of points on a common circle.
//!
//! A run starts from three consecutive points, fits the circle through
//! them, and grows while each next point stays on that circle. Runs long
//! enough are reduced to their two ends plus a middle point tagged
//! [`PointKind::ArcMid`], which tells the renderer to draw a three-point arc.
//!
//! Besides the on-circle test, every step must keep turning the same way
//! around the center and must not be much longer than the seed steps. This
//! stops a chord whose far end happens to land on the circle (the flat side
//! of a "D" profile) from being swallowed into the arc.

use meshsect_math::{Point3, Tolerance, Vec3};
use std::f64::consts::TAU;
use tracing::trace;

use crate::circle::Circle;
use crate::section_loop::{PointKind, SectionLoop, SectionPoint};

/// Default minimum number of points in a run before it becomes an arc.
pub const MIN_ARC_POINTS: usize = 6;

/// A step may sweep at most this multiple of the largest seed step.
const MAX_STEP_RATIO: f64 = 2.0;

/// Slack on the full-turn limit for round-off in the accumulated sweep.
const FULL_TURN_SLACK: f64 = 1e-9;

/// A run of points on one circle, growing forward.
struct Run {
    circle: Circle,
    axis: Vec3,
    max_step: f64,
    sweep: f64,
}

impl Run {
    /// Fit the circle through three points and check they turn one way
    /// with comparable steps.
    fn seed(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let circle = Circle::through(a, b, c)?;
        let axis = (b - a).cross(&(c - b)).try_normalize(f64::MIN_POSITIVE)?;

        let first = signed_sweep(&circle.center, &axis, a, b);
        let second = signed_sweep(&circle.center, &axis, b, c);
        if first <= 0.0 || second <= 0.0 {
            return None;
        }
        if first.max(second) > MAX_STEP_RATIO * first.min(second) {
            return None;
        }

        Some(Self {
            circle,
            axis,
            max_step: MAX_STEP_RATIO * first.max(second),
            sweep: first + second,
        })
    }

    /// Try to extend the run from `last` to `next`.
    fn extend(&mut self, last: &Point3, next: &Point3, tol: &Tolerance) -> bool {
        if !self.circle.contains(next, tol) {
            return false;
        }
        let step = signed_sweep(&self.circle.center, &self.axis, last, next);
        if step <= 0.0 || step > self.max_step || self.sweep + step > TAU + FULL_TURN_SLACK {
            return false;
        }
        self.sweep += step;
        true
    }
}

/// Angle swept around `axis` going from `from` to `to` about `center`, in `(-π, π]`.
fn signed_sweep(center: &Point3, axis: &Vec3, from: &Point3, to: &Point3) -> f64 {
    let a = from - center;
    let b = to - center;
    axis.dot(&a.cross(&b)).atan2(a.dot(&b))
}

/// Can point `i` of a closed ring sit inside an arc?
///
/// It can when its two neighbors seed a run through it and the circle also
/// holds the point two steps ahead or two steps behind.
fn is_smooth(points: &[SectionPoint], i: usize, tol: &Tolerance) -> bool {
    let n = points.len();
    let at = |k: usize| &points[(i + n + k - 2) % n].position;
    match Run::seed(at(1), at(2), at(3)) {
        Some(run) => run.circle.contains(at(0), tol) || run.circle.contains(at(4), tol),
        None => false,
    }
}

/// Where to open a closed ring for the linear scan.
///
/// Prefers the first point ending a merged straight edge, then the first
/// point that cannot be inside an arc, then index 0 (the ring is one circle).
fn seam(points: &[SectionPoint], tol: &Tolerance) -> usize {
    points
        .iter()
        .position(|p| p.kind.is_line_terminator())
        .or_else(|| (0..points.len()).find(|&i| !is_smooth(points, i, tol)))
        .unwrap_or(0)
}

/// Keep the run's ends and its middle point, tag the middle as an arc mid.
fn collapse(points: &mut [SectionPoint], keep: &mut [bool], start: usize, end: usize) {
    for k in keep.iter_mut().take(end).skip(start + 1) {
        *k = false;
    }
    let mid = (start + end) / 2;
    keep[mid] = true;
    points[mid].kind = PointKind::ArcMid;
}

/// Scan a linear point sequence and collapse every long enough circular run.
///
/// With `closing_duplicate` set, the last point repeats the first; a run
/// covering the whole sequence is then a full circle and is split into two
/// half arcs (or left alone when the halves would be too short).
fn collapse_runs(
    points: &mut [SectionPoint],
    min_points: usize,
    tol: &Tolerance,
    closing_duplicate: bool,
) -> Vec<bool> {
    let len = points.len();
    let mut keep = vec![true; len];
    let mut runs = 0;
    let mut i = 0;

    while i + 2 < len {
        let Some(mut run) = Run::seed(
            &points[i].position,
            &points[i + 1].position,
            &points[i + 2].position,
        ) else {
            i += 1;
            continue;
        };

        let mut last = i + 2;
        while last + 1 < len && run.extend(&points[last].position, &points[last + 1].position, tol) {
            last += 1;
        }

        if last - i + 1 < min_points {
            i += 1;
            continue;
        }

        if closing_duplicate && i == 0 && last == len - 1 {
            let half = last / 2;
            if half + 1 >= min_points && last - half + 1 >= min_points {
                collapse(points, &mut keep, 0, half);
                collapse(points, &mut keep, half, last);
                runs += 2;
            }
            break;
        }

        collapse(points, &mut keep, i, last);
        runs += 1;
        i = last;
    }

    if runs > 0 {
        trace!(runs, points = len, "fitted arcs");
    }

    keep
}

/// Collapse runs of at least `min_points` points lying on a common circle.
///
/// Expects a loop that already went through
/// [`crate::simplify::merge_collinear`]. Closed loops are treated as
/// circular: the scan starts at a break between curves (the first point
/// ending a merged straight edge, else the first point no arc can pass
/// through), so no arc is cut by where the loop happens to start.
/// Fit failures on collinear or repeated points just leave those points as
/// line vertices.
pub fn fit_arcs(section: &SectionLoop, min_points: usize, tol: &Tolerance) -> SectionLoop {
    let min_points = min_points.max(3);
    let n = section.points.len();
    if !section.connected || n < min_points {
        return section.clone();
    }

    let points = if section.closed {
        let start = seam(&section.points, tol);

        let mut seq: Vec<SectionPoint> = section.points[start..]
            .iter()
            .chain(&section.points[..start])
            .copied()
            .collect();
        seq.push(seq[0]);

        let keep = collapse_runs(&mut seq, min_points, tol, true);
        seq.pop();
        seq.into_iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(p))
            .collect()
    } else {
        let mut seq = section.points.clone();
        let keep = collapse_runs(&mut seq, min_points, tol, false);
        seq.into_iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(p))
            .collect()
    };

    SectionLoop {
        points,
        closed: section.closed,
        connected: section.connected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::SectionCurve;
    use crate::simplify::merge_collinear;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn on_circle(center: Point3, r: f64, angles: impl IntoIterator<Item = f64>) -> Vec<Point3> {
        angles
            .into_iter()
            .map(|a| Point3::new(center.x + r * a.cos(), center.y + r * a.sin(), 0.0))
            .collect()
    }

    fn kinds(section: &SectionLoop) -> Vec<PointKind> {
        section.points.iter().map(|p| p.kind).collect()
    }

    #[test]
    fn test_arc_round_trip() {
        let center = Point3::new(3.0, -2.0, 0.0);
        let pts = on_circle(center, 5.0, (0..8).map(|k| k as f64 * 0.2));
        let section = SectionLoop::from_positions(pts, false);

        let fitted = fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT);
        assert_eq!(fitted.len(), 3);
        assert_eq!(
            kinds(&fitted),
            vec![PointKind::Unknown, PointKind::ArcMid, PointKind::Unknown]
        );

        let c = Circle::through(
            &fitted.points[0].position,
            &fitted.points[1].position,
            &fitted.points[2].position,
        )
        .unwrap();
        assert_relative_eq!(c.center, center, epsilon = 1e-3);
        assert_relative_eq!(c.radius, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn test_short_run_is_kept() {
        let pts = on_circle(Point3::origin(), 1.0, (0..5).map(|k| k as f64 * 0.3));
        let section = SectionLoop::from_positions(pts, false);
        let fitted = fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT);
        assert_eq!(fitted, section);
    }

    #[test]
    fn test_straight_lines_are_not_arcs() {
        let pts: Vec<Point3> = (0..10)
            .map(|k| Point3::new(k as f64, if k % 2 == 0 { 0.0 } else { 1.0 }, 0.0))
            .collect();
        let section = SectionLoop::from_positions(pts, false);
        assert_eq!(fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT), section);

        let line: Vec<Point3> = (0..10).map(|k| Point3::new(k as f64, 0.0, 0.0)).collect();
        let section = SectionLoop::from_positions(line, false);
        assert_eq!(fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT), section);
    }

    #[test]
    fn test_arc_between_lines() {
        // Straight lead-in, quarter circle of 9 points, straight lead-out
        let mut pts = vec![Point3::new(1.0, -2.0, 0.0)];
        pts.extend(on_circle(Point3::origin(), 1.0, (0..9).map(|k| k as f64 * PI / 16.0)));
        pts.push(Point3::new(-2.0, 1.0, 0.0));
        let section = SectionLoop::from_positions(pts, false);

        let fitted = fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT);
        assert_eq!(fitted.len(), 5);
        assert_eq!(fitted.points[2].kind, PointKind::ArcMid);
        assert_relative_eq!(fitted.points[1].position, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(fitted.points[3].position, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_d_profile_keeps_flat_side() {
        // Upper half circle with a point in the middle of the flat side
        let mut pts = on_circle(Point3::origin(), 1.0, (0..=12).map(|k| k as f64 * PI / 12.0));
        pts.push(Point3::new(0.0, 0.0, 0.0));
        let section = SectionLoop::from_positions(pts, true);
        let tol = Tolerance::DEFAULT;

        let merged = merge_collinear(&section, &tol);
        assert_eq!(merged.len(), 13);

        let fitted = fit_arcs(&merged, MIN_ARC_POINTS, &tol);
        assert!(fitted.closed);
        assert_eq!(fitted.len(), 3);
        assert_eq!(fitted.points[1].kind, PointKind::ArcMid);
        assert_relative_eq!(fitted.points[0].position, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(fitted.points[1].position, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(fitted.points[2].position, Point3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_seed_rejects_uneven_steps() {
        // Second step sweeps 3.5 times the first
        let pts = on_circle(Point3::origin(), 1.0, [0.0, 0.2, 0.9]);
        assert!(Run::seed(&pts[0], &pts[1], &pts[2]).is_none());

        let pts = on_circle(Point3::origin(), 1.0, [0.0, 0.2, 0.5]);
        assert!(Run::seed(&pts[0], &pts[1], &pts[2]).is_some());
    }

    #[test]
    fn test_d_profile_bare_flat_side_starting_mid_arc() {
        // Half circle from 90° round to 180°, then straight across to 0° and
        // back up to 75°; the flat side has no point in its middle
        let angles = (6..=12).chain(0..6).map(|k| k as f64 * PI / 12.0);
        let pts = on_circle(Point3::origin(), 1.0, angles);
        let section = SectionLoop::from_positions(pts, true);
        let tol = Tolerance::DEFAULT;

        let merged = merge_collinear(&section, &tol);
        assert_eq!(merged.len(), 13);

        let fitted = fit_arcs(&merged, MIN_ARC_POINTS, &tol);
        assert_eq!(fitted.len(), 3);
        assert_eq!(
            fitted.points.iter().filter(|p| p.kind == PointKind::ArcMid).count(),
            1
        );

        let curves = fitted.curves();
        assert_eq!(curves.len(), 2);
        let total: f64 = curves.iter().map(|c| c.length()).sum();
        assert_relative_eq!(total, PI + 2.0, epsilon = 1e-9);
        let flat: Vec<_> = curves
            .iter()
            .filter(|c| matches!(c, SectionCurve::Line { .. }))
            .collect();
        assert_eq!(flat.len(), 1);
        assert_relative_eq!(flat[0].start(), Point3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(flat[0].end(), Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_ring_starting_inside_an_arc() {
        // Arc from 45° to 315° closed through the center, starting at 285°
        let step = PI / 12.0;
        let mut pts = on_circle(Point3::origin(), 1.0, (19..=21).map(|k| k as f64 * step));
        pts.push(Point3::origin());
        pts.extend(on_circle(Point3::origin(), 1.0, (3..=18).map(|k| k as f64 * step)));
        let section = SectionLoop::from_positions(pts, true);
        assert_eq!(section.len(), 20);
        assert!(section.points.iter().all(|p| p.kind == PointKind::Unknown));

        let fitted = fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT);
        assert_eq!(fitted.len(), 4);
        assert_eq!(
            kinds(&fitted),
            vec![
                PointKind::Unknown,
                PointKind::Unknown,
                PointKind::Unknown,
                PointKind::ArcMid
            ]
        );
        let a315 = 21.0 * step;
        assert_relative_eq!(fitted.points[0].position, Point3::new(a315.cos(), a315.sin(), 0.0), epsilon = 1e-12);
        assert_relative_eq!(fitted.points[3].position, Point3::new(-1.0, PI.sin(), 0.0), epsilon = 1e-12);

        let total: f64 = fitted.curves().iter().map(|c| c.length()).sum();
        assert_relative_eq!(total, 2.0 + 1.5 * PI, epsilon = 1e-9);
    }

    #[test]
    fn test_full_circle_splits_in_two() {
        let pts = on_circle(Point3::origin(), 2.0, (0..16).map(|k| k as f64 * TAU / 16.0));
        let section = SectionLoop::from_positions(pts, true);

        let fitted = fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT);
        assert_eq!(fitted.len(), 4);
        assert_eq!(
            kinds(&fitted),
            vec![
                PointKind::Unknown,
                PointKind::ArcMid,
                PointKind::Unknown,
                PointKind::ArcMid
            ]
        );
        assert_relative_eq!(fitted.points[2].position, Point3::new(-2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_small_full_circle_left_alone() {
        let pts = on_circle(Point3::origin(), 2.0, (0..8).map(|k| k as f64 * TAU / 8.0));
        let section = SectionLoop::from_positions(pts, true);
        assert_eq!(fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT), section);
    }

    #[test]
    fn test_min_points_is_configurable() {
        let pts = on_circle(Point3::origin(), 1.0, (0..5).map(|k| k as f64 * 0.3));
        let section = SectionLoop::from_positions(pts, false);
        let fitted = fit_arcs(&section, 4, &Tolerance::DEFAULT);
        assert_eq!(fitted.len(), 3);
        assert_eq!(fitted.points[1].kind, PointKind::ArcMid);
    }

    #[test]
    fn test_unsorted_points_on_circle_are_not_an_arc() {
        // All on the unit circle, but the walk doubles back
        let angles = [0.0, 0.4, 0.8, 0.5, 0.9, 1.3, 1.7];
        let pts = on_circle(Point3::origin(), 1.0, angles);
        let section = SectionLoop::from_positions(pts, false);
        let fitted = fit_arcs(&section, MIN_ARC_POINTS, &Tolerance::DEFAULT);
        assert!(fitted.points.iter().all(|p| p.kind != PointKind::ArcMid));
    }
}

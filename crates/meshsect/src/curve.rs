//! Line and arc primitives for drawing a section loop.

use meshsect_math::{bearing, ccw_sweep, Point3};
use serde::{Deserialize, Serialize};

use crate::circle::Circle;
use crate::section_loop::{PointKind, SectionLoop};

/// A drawable piece of a section loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionCurve {
    /// Straight edge.
    Line {
        /// Start point.
        start: Point3,
        /// End point.
        end: Point3,
    },
    /// Three-point arc.
    Arc {
        /// Start point.
        start: Point3,
        /// A point on the arc between start and end.
        mid: Point3,
        /// End point.
        end: Point3,
    },
}

impl SectionCurve {
    /// Start point.
    pub fn start(&self) -> Point3 {
        match self {
            SectionCurve::Line { start, .. } | SectionCurve::Arc { start, .. } => *start,
        }
    }

    /// End point.
    pub fn end(&self) -> Point3 {
        match self {
            SectionCurve::Line { end, .. } | SectionCurve::Arc { end, .. } => *end,
        }
    }

    /// Length along the curve.
    ///
    /// Arcs are measured in the plane-local XY frame the loops live in. An
    /// arc whose points do not define a circle falls back to its two chords.
    pub fn length(&self) -> f64 {
        match self {
            SectionCurve::Line { start, end } => (end - start).norm(),
            SectionCurve::Arc { start, mid, end } => match Circle::through(start, mid, end) {
                Some(circle) => {
                    let a_start = bearing(&(start - circle.center));
                    let a_mid = bearing(&(mid - circle.center));
                    let a_end = bearing(&(end - circle.center));
                    let ccw = ccw_sweep(a_start, a_end);
                    let sweep = if ccw_sweep(a_start, a_mid) <= ccw {
                        ccw
                    } else {
                        std::f64::consts::TAU - ccw
                    };
                    circle.radius * sweep
                }
                None => (mid - start).norm() + (end - mid).norm(),
            },
        }
    }
}

impl SectionLoop {
    /// Lines and arcs to draw for this loop, in walking order.
    ///
    /// Unconnected loops give one line per stored (start, end) pair. For
    /// connected loops every point followed by an `ArcMid` point starts an
    /// arc through that point to the one after it (wrapping to the first
    /// point on closed loops); other consecutive points are joined by
    /// lines. Closed loops get a closing line back to the first point unless
    /// an arc already ends there.
    pub fn curves(&self) -> Vec<SectionCurve> {
        let pts = &self.points;
        let n = pts.len();

        if !self.connected {
            return pts
                .chunks_exact(2)
                .map(|pair| SectionCurve::Line {
                    start: pair[0].position,
                    end: pair[1].position,
                })
                .collect();
        }

        if n < 2 {
            return Vec::new();
        }

        // Index after `i`, wrapping only for closed loops
        let next = |i: usize| -> Option<usize> {
            if i + 1 < n {
                Some(i + 1)
            } else if self.closed {
                Some(0)
            } else {
                None
            }
        };

        let mut curves = Vec::new();
        let mut i = 0;
        // Edges walked so far; a closed loop is done after `n`
        let mut walked = 0;

        while walked < n {
            let Some(j) = next(i) else { break };
            if self.closed && n == 2 && walked == 1 {
                // A two-point closed loop folds back on itself; one edge is enough
                break;
            }

            if pts[j].kind == PointKind::ArcMid {
                let Some(k) = next(j) else {
                    curves.push(SectionCurve::Line {
                        start: pts[i].position,
                        end: pts[j].position,
                    });
                    break;
                };
                curves.push(SectionCurve::Arc {
                    start: pts[i].position,
                    mid: pts[j].position,
                    end: pts[k].position,
                });
                walked += 2;
                i = k;
            } else {
                curves.push(SectionCurve::Line {
                    start: pts[i].position,
                    end: pts[j].position,
                });
                walked += 1;
                i = j;
            }
        }

        curves
    }
}

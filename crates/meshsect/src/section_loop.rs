//! Section loops: ordered point sequences produced by the assembler.

use meshsect_math::Point3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How a renderer should read a point while walking a loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    /// Plain vertex.
    #[default]
    Unknown,
    /// Starts a merged straight edge.
    LineStart,
    /// Ends a merged straight edge.
    LineEnd,
    /// Ends one merged straight edge and starts the next.
    LineStartAndEnd,
    /// Middle point of a fitted arc; its neighbors are the arc's ends.
    ArcMid,
}

impl PointKind {
    /// This kind with the line-start role added.
    pub fn with_line_start(self) -> Self {
        match self {
            PointKind::LineEnd | PointKind::LineStartAndEnd => PointKind::LineStartAndEnd,
            PointKind::ArcMid => PointKind::ArcMid,
            _ => PointKind::LineStart,
        }
    }

    /// This kind with the line-end role added.
    pub fn with_line_end(self) -> Self {
        match self {
            PointKind::LineStart | PointKind::LineStartAndEnd => PointKind::LineStartAndEnd,
            PointKind::ArcMid => PointKind::ArcMid,
            _ => PointKind::LineEnd,
        }
    }

    /// Does this point terminate a merged straight edge?
    pub fn is_line_terminator(self) -> bool {
        matches!(
            self,
            PointKind::LineStart | PointKind::LineEnd | PointKind::LineStartAndEnd
        )
    }
}

/// A loop vertex: a position plus its [`PointKind`] tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionPoint {
    /// Position in plane-local coordinates.
    pub position: Point3,
    /// Rendering tag set by simplification.
    pub kind: PointKind,
}

impl SectionPoint {
    /// An untagged point.
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            kind: PointKind::Unknown,
        }
    }

    /// A point with the given tag.
    pub fn with_kind(position: Point3, kind: PointKind) -> Self {
        Self { position, kind }
    }
}

/// An ordered chain of section points.
///
/// A closed loop's closing edge runs from the last point back to the first;
/// the first point is not repeated. A loop that is not `connected` is a bag
/// of unrelated segments stored as consecutive (start, end) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionLoop {
    /// Points in walking order.
    pub points: Vec<SectionPoint>,
    /// Does the last point connect back to the first?
    pub closed: bool,
    /// Are consecutive points joined? False for the raw segment dump.
    pub connected: bool,
}

impl SectionLoop {
    /// Create an open, connected loop.
    pub fn new(points: Vec<SectionPoint>) -> Self {
        Self {
            points,
            closed: false,
            connected: true,
        }
    }

    /// Create a loop from bare positions.
    pub fn from_positions(positions: impl IntoIterator<Item = Point3>, closed: bool) -> Self {
        Self {
            points: positions.into_iter().map(SectionPoint::new).collect(),
            closed,
            connected: true,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Is the loop empty?
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First point.
    pub fn start(&self) -> Option<&SectionPoint> {
        self.points.first()
    }

    /// Last point.
    pub fn end(&self) -> Option<&SectionPoint> {
        self.points.last()
    }

    /// Iterator over positions.
    pub fn positions(&self) -> impl Iterator<Item = &Point3> + '_ {
        self.points.iter().map(|p| &p.position)
    }

    /// Total length of the polyline through all points (closing edge included).
    ///
    /// Arcs are measured as their chords; use [`crate::SectionCurve::length`]
    /// for true arc lengths.
    pub fn polyline_length(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let open: f64 = self
            .points
            .windows(2)
            .map(|w| (w[1].position - w[0].position).norm())
            .sum();
        if self.closed {
            open + (self.points[0].position - self.points[n - 1].position).norm()
        } else {
            open
        }
    }
}

/// A loop under construction, grown at both ends.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoopBuilder {
    points: VecDeque<Point3>,
}

impl LoopBuilder {
    pub(crate) fn seeded(start: Point3, end: Point3) -> Self {
        Self {
            points: VecDeque::from([start, end]),
        }
    }

    pub(crate) fn head(&self) -> Point3 {
        self.points[0]
    }

    pub(crate) fn tail(&self) -> Point3 {
        self.points[self.points.len() - 1]
    }

    pub(crate) fn push_front(&mut self, p: Point3) {
        self.points.push_front(p);
    }

    pub(crate) fn push_back(&mut self, p: Point3) {
        self.points.push_back(p);
    }

    pub(crate) fn finish(self, closed: bool) -> SectionLoop {
        SectionLoop::from_positions(self.points, closed)
    }
}

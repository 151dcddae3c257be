use std::fmt;

/// A half-open interval `[start, end)` on an integer-encoded chromosome.
#[derive(Debug, Clone)]
pub struct Interval {
    pub chr: i64,
    pub start: i64,
    pub end: i64,
    pub idx: i64,
}

/// Which kind of position an event in the point sweep stands for.
///
/// At equal positions ends are handled first, then starts, then query
/// points, which gives half-open containment: a point at `start` is inside,
/// a point at `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    End,
    Start,
    Point,
}

impl EventKind {
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            EventKind::End => 0,
            EventKind::Start => 1,
            EventKind::Point => 2,
        }
    }
}

/// An "event" in the sweep line:
/// - `pos`: the coordinate (interval start, interval end or query point)
/// - `kind`: what the coordinate is
/// - `idx`: the interval's or query point's index
#[derive(Debug, Clone, Hash)]
pub struct Event {
    pub chr: i64,
    pub pos: i64,
    pub kind: EventKind,
    pub idx: i64,
}

/// One line of the reference exon table: both boundaries of an exon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExonBoundary {
    pub chrom: String,
    pub left: i64,
    pub right: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// A single fusion breakpoint, `chrom:coordinate[:strand]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointDescriptor {
    pub chrom: String,
    pub coordinate: i64,
    pub strand: Option<Strand>,
}

/// The two breakpoints of a fusion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionBreakpoints {
    pub left: BreakpointDescriptor,
    pub right: BreakpointDescriptor,
}

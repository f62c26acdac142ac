use anyhow::Result;
use serde::{Deserialize, Serialize};

use features::{TrackID, TrackName};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    pub x: f64,
    pub y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Pt2D, pct: f64) -> Pt2D {
        Pt2D::new(
            self.x + (other.x - self.x) * pct,
            self.y + (other.y - self.y) * pct,
        )
    }

    /// Radians, counter-clockwise from the positive x axis. None if the points are the same,
    /// since there's no meaningful direction then.
    pub fn heading_to(self, other: Pt2D) -> Option<f64> {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(dy.atan2(dx))
    }

    pub fn dist_to(self, other: Pt2D) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: Pt2D,
    /// Progress, in the model's canonical unit
    pub t: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self {
            pos: Pt2D::new(x, y),
            t,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeExtent {
    pub start: f64,
    pub end: f64,
}

impl TimeExtent {
    pub fn contains(&self, progress: f64) -> bool {
        self.start <= progress && progress <= self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn union(self, other: TimeExtent) -> TimeExtent {
        TimeExtent {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Where a marker belongs at some moment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub pos: Pt2D,
    /// None when there's no direction to report. Callers should keep whatever heading they
    /// showed before.
    pub heading: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackID,
    pub name: TrackName,
    // Sorted by time, never empty, never modified after construction
    vertices: Vec<Vertex>,
    extent: TimeExtent,
}

impl Track {
    /// Sorts the vertices by time. Ties keep their input order.
    pub fn new(id: TrackID, name: TrackName, mut vertices: Vec<Vertex>) -> Result<Self> {
        if vertices.is_empty() {
            bail!("Track {name} has no vertices");
        }
        vertices.sort_by(|a, b| a.t.total_cmp(&b.t));
        let extent = TimeExtent {
            start: vertices[0].t,
            end: vertices[vertices.len() - 1].t,
        };
        Ok(Self {
            id,
            name,
            vertices,
            extent,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn time_extent(&self) -> TimeExtent {
        self.extent
    }

    pub fn is_within_time_extent(&self, progress: f64) -> bool {
        self.extent.contains(progress)
    }

    pub fn position_at(&self, progress: f64) -> Placement {
        let first = self.vertices[0];
        // Also catches NaN
        if self.vertices.len() == 1 || !(progress > self.extent.start) {
            return Placement {
                pos: first.pos,
                heading: None,
            };
        }
        if progress >= self.extent.end {
            return Placement {
                pos: self.vertices[self.vertices.len() - 1].pos,
                heading: self.final_heading(),
            };
        }

        // start < progress < end, so the split lands strictly inside the list
        let idx = self.vertices.partition_point(|v| v.t <= progress);
        let v0 = self.vertices[idx - 1];
        let v1 = self.vertices[idx];
        let dt = v1.t - v0.t;
        if dt <= 0.0 {
            return Placement {
                pos: v0.pos,
                heading: None,
            };
        }
        let pct = ((progress - v0.t) / dt).clamp(0.0, 1.0);
        Placement {
            pos: v0.pos.lerp(v1.pos, pct),
            heading: v0.pos.heading_to(v1.pos),
        }
    }

    // The direction of the last segment that actually goes somewhere
    fn final_heading(&self) -> Option<f64> {
        self.vertices
            .windows(2)
            .rev()
            .find_map(|pair| pair[0].pos.heading_to(pair[1].pos))
    }

    /// Total distance along every segment, in map units.
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|pair| pair[0].pos.dist_to(pair[1].pos))
            .sum()
    }
}

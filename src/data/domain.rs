//! Index domains that attribute arrays are bound to.

use std::fmt;

/// One of the three index spaces of a spatial graph.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Domain {
    /// Graph nodes.
    Vertex,
    /// Edge records (connectivity, point counts).
    Edge,
    /// Polyline samples belonging to edges.
    Point,
}

static_assertions::assert_impl_all!(Domain: Copy, Send, Sync);

impl Domain {
    /// All domains in declaration order.
    pub const ALL: [Domain; 3] = [Domain::Vertex, Domain::Edge, Domain::Point];

    /// Stable upper-case label, matching the definition names of the
    /// external mesh-description format.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Vertex => "VERTEX",
            Domain::Edge => "EDGE",
            Domain::Point => "POINT",
        }
    }

    /// Parse a domain from its label (case-insensitive).
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "VERTEX" => Some(Domain::Vertex),
            "EDGE" => Some(Domain::Edge),
            "POINT" | "POINTS" => Some(Domain::Point),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Domain::Vertex => 0,
            Domain::Edge => 1,
            Domain::Point => 2,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sizes of all three domains.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DomainSizes {
    /// Node count.
    pub vertex: usize,
    /// Edge count.
    pub edge: usize,
    /// Polyline sample count over all edges.
    pub point: usize,
}

impl DomainSizes {
    /// Sizes in VERTEX, EDGE, POINT order.
    pub fn new(vertex: usize, edge: usize, point: usize) -> Self {
        Self {
            vertex,
            edge,
            point,
        }
    }

    /// Size of `domain`.
    pub fn get(&self, domain: Domain) -> usize {
        match domain {
            Domain::Vertex => self.vertex,
            Domain::Edge => self.edge,
            Domain::Point => self.point,
        }
    }

    /// Overwrite the size of `domain`.
    pub fn set(&mut self, domain: Domain, n: usize) {
        match domain {
            Domain::Vertex => self.vertex = n,
            Domain::Edge => self.edge = n,
            Domain::Point => self.point = n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_labels() {
        for d in Domain::ALL {
            assert_eq!(Domain::parse(d.as_str()), Some(d));
        }
        assert_eq!(Domain::parse("points"), Some(Domain::Point));
        assert_eq!(Domain::parse("cell"), None);
    }

    #[test]
    fn sizes_get_set() {
        let mut s = DomainSizes::default();
        s.set(Domain::Edge, 4);
        assert_eq!(s.get(Domain::Edge), 4);
        assert_eq!(s.get(Domain::Vertex), 0);
    }
}

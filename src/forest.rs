//! Disjoint-set forest over grid cells, with per-segment statistics.
//!
//! Nodes live in an arena indexed by cell id. A root carries the statistics of
//! its whole segment; a child only knows its parent. Roots are their own
//! representatives, so the id returned by [`SegmentForest::find`] is the cell
//! that identifies the segment.

use image::Rgb;
use std::cmp::Ordering;

use crate::color::ColorSource;
use crate::error::SegmentError;

#[derive(Debug, Copy, Clone, PartialEq)]
struct Segment {
    size: usize,
    rank: u32,
    threshold: f32,
    color: Option<Rgb<u8>>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Node {
    Root(Segment),
    Child(usize),
}

#[derive(Debug, Clone)]
pub struct SegmentForest {
    nodes: Vec<Node>,
}

impl SegmentForest {
    /// One singleton segment per cell, each with a zero threshold.
    pub fn new(len: usize) -> SegmentForest {
        let singleton = Node::Root(Segment {
            size: 1,
            rank: 0,
            threshold: 0.0,
            color: None,
        });
        SegmentForest {
            nodes: vec![singleton; len],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn try_find(&mut self, cell: usize) -> Result<usize, SegmentError> {
        self.check(cell)?;

        let mut root = cell;
        while let Node::Child(parent) = self.nodes[root] {
            root = parent;
        }

        /* compress: point every node on the path straight at the root */
        let mut current = cell;
        while let Node::Child(parent) = self.nodes[current] {
            self.nodes[current] = Node::Child(root);
            current = parent;
        }

        Ok(root)
    }

    /// Representative of `cell`'s segment.
    ///
    /// # Panics
    ///
    /// If `cell` was never registered in the forest.
    pub fn find(&mut self, cell: usize) -> usize {
        match self.try_find(cell) {
            Ok(root) => root,
            Err(err) => panic!("{}", err),
        }
    }

    /// Merges the segments rooted at `a` and `b` and returns the retained
    /// root, whose threshold becomes `threshold`.
    ///
    /// Both arguments must already be distinct roots. On equal ranks `a` is
    /// retained and its rank grows by one.
    pub fn union(&mut self, a: usize, b: usize, threshold: f32) -> usize {
        debug_assert_ne!(a, b);
        let rank_a = self.segment(a).rank;
        let rank_b = self.segment(b).rank;

        let (root, child) = match rank_a.cmp(&rank_b) {
            Ordering::Less => (b, a),
            Ordering::Equal | Ordering::Greater => (a, b),
        };
        let child_size = self.segment(child).size;
        self.nodes[child] = Node::Child(root);

        let merged = self.segment_mut(root);
        if rank_a == rank_b {
            merged.rank += 1;
        }
        merged.size += child_size;
        merged.threshold = threshold;
        root
    }

    pub fn segment_size(&mut self, cell: usize) -> usize {
        let root = self.find(cell);
        self.segment(root).size
    }

    pub fn segment_threshold(&mut self, cell: usize) -> f32 {
        let root = self.find(cell);
        self.segment(root).threshold
    }

    /// Direct parent of `cell`, which is `cell` itself for a root.
    pub fn parent(&self, cell: usize) -> usize {
        match *self.node(cell) {
            Node::Root(_) => cell,
            Node::Child(parent) => parent,
        }
    }

    pub fn is_root(&self, cell: usize) -> bool {
        self.parent(cell) == cell
    }

    pub fn segment_count(&self) -> usize {
        (0..self.nodes.len()).filter(|&cell| self.is_root(cell)).count()
    }

    /// Root of every cell, in cell order.
    pub fn labels(&mut self) -> Vec<usize> {
        (0..self.nodes.len()).map(|cell| self.find(cell)).collect()
    }

    /// Gives every cell the color of its segment. Each root draws exactly one
    /// color from `colors`, the first time one of its cells is visited, and
    /// keeps it for later calls.
    pub fn finalize<C: ColorSource + ?Sized>(&mut self, colors: &mut C) -> Vec<Rgb<u8>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for cell in 0..self.nodes.len() {
            let root = self.find(cell);
            let segment = self.segment_mut(root);
            let color = match segment.color {
                Some(color) => color,
                None => {
                    let color = colors.next_color();
                    segment.color = Some(color);
                    color
                }
            };
            out.push(color);
        }
        out
    }

    /// Size of the segment rooted at `root`, without compressing any path.
    pub(crate) fn root_size(&self, root: usize) -> usize {
        self.segment(root).size
    }

    /// Threshold of the segment rooted at `root`, without compressing any path.
    pub(crate) fn root_threshold(&self, root: usize) -> f32 {
        self.segment(root).threshold
    }

    fn check(&self, cell: usize) -> Result<(), SegmentError> {
        if cell < self.nodes.len() {
            Ok(())
        } else {
            Err(SegmentError::UnknownCell {
                cell,
                len: self.nodes.len(),
            })
        }
    }

    fn node(&self, cell: usize) -> &Node {
        if let Err(err) = self.check(cell) {
            panic!("{}", err);
        }
        &self.nodes[cell]
    }

    fn segment(&self, root: usize) -> &Segment {
        match self.node(root) {
            Node::Root(segment) => segment,
            Node::Child(_) => panic!("cell {} is not a segment root", root),
        }
    }

    fn segment_mut(&mut self, root: usize) -> &mut Segment {
        if let Err(err) = self.check(root) {
            panic!("{}", err);
        }
        match &mut self.nodes[root] {
            Node::Root(segment) => segment,
            Node::Child(_) => panic!("cell {} is not a segment root", root),
        }
    }
}

//! Rectangle splitter for shared texture canvases
//!
//! Binary space partition over a fixed 2D canvas. Each allocation walks the
//! tree for the first free leaf large enough, then splits that leaf along the
//! axis with the larger leftover so the request ends up in an exact-fit leaf.
//! Freeing a rectangle merges sibling leaves back together when both are free.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifies an allocated rectangle inside a [`TextureSplitter`]
    pub struct SplitNode;
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<SplitNode>,
    children: Option<[SplitNode; 2]>,
    pos: [u32; 2],
    size: [u32; 2],
    occupied: bool,
}

impl Node {
    fn leaf(parent: Option<SplitNode>, pos: [u32; 2], size: [u32; 2]) -> Self {
        Self {
            parent,
            children: None,
            pos,
            size,
            occupied: false,
        }
    }

    fn is_free_leaf(&self) -> bool {
        self.children.is_none() && !self.occupied
    }
}

/// Rectangle allocator over a `width x height` canvas
#[derive(Debug, Clone)]
pub struct TextureSplitter {
    nodes: SlotMap<SplitNode, Node>,
    root: SplitNode,
    size: [u32; 2],
}

impl TextureSplitter {
    /// Create an empty splitter
    pub fn new(width: u32, height: u32) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::leaf(None, [0, 0], [width, height]));
        Self {
            nodes,
            root,
            size: [width, height],
        }
    }

    /// Canvas dimensions
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Number of live allocations
    pub fn allocated_count(&self) -> usize {
        self.nodes.values().filter(|n| n.occupied).count()
    }

    /// Reserve a `size` rectangle; returns its node and top-left position
    ///
    /// A failed request leaves the tree untouched.
    pub fn allocate(&mut self, size: [u32; 2]) -> Option<(SplitNode, [u32; 2])> {
        if size[0] == 0 || size[1] == 0 {
            return None;
        }

        let mut id = self.find_free(self.root, size)?;
        loop {
            let node = &self.nodes[id];
            let (pos, avail) = (node.pos, node.size);
            if avail == size {
                self.nodes[id].occupied = true;
                return Some((id, pos));
            }

            let dw = avail[0] - size[0];
            let dh = avail[1] - size[1];
            let (first, second) = if dw > dh {
                (
                    Node::leaf(Some(id), pos, [size[0], avail[1]]),
                    Node::leaf(Some(id), [pos[0] + size[0], pos[1]], [dw, avail[1]]),
                )
            } else {
                (
                    Node::leaf(Some(id), pos, [avail[0], size[1]]),
                    Node::leaf(Some(id), [pos[0], pos[1] + size[1]], [avail[0], dh]),
                )
            };
            let a = self.nodes.insert(first);
            let b = self.nodes.insert(second);
            self.nodes[id].children = Some([a, b]);
            id = a;
        }
    }

    fn find_free(&self, id: SplitNode, size: [u32; 2]) -> Option<SplitNode> {
        let node = &self.nodes[id];
        if let Some([a, b]) = node.children {
            return self
                .find_free(a, size)
                .or_else(|| self.find_free(b, size));
        }
        let fits = node.size[0] >= size[0] && node.size[1] >= size[1];
        (!node.occupied && fits).then_some(id)
    }

    /// Position and size of a live allocation
    pub fn rect(&self, id: SplitNode) -> Option<([u32; 2], [u32; 2])> {
        self.nodes
            .get(id)
            .filter(|n| n.occupied)
            .map(|n| (n.pos, n.size))
    }

    /// Release an allocation; returns false for unknown or stale nodes
    pub fn free(&mut self, id: SplitNode) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if node.occupied => node.occupied = false,
            _ => return false,
        }

        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            let Some([a, b]) = self.nodes[parent].children else {
                break;
            };
            if !(self.nodes[a].is_free_leaf() && self.nodes[b].is_free_leaf()) {
                break;
            }
            self.nodes.remove(a);
            self.nodes.remove(b);
            self.nodes[parent].children = None;
            current = parent;
        }
        true
    }

    /// Drop every allocation
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self
            .nodes
            .insert(Node::leaf(None, [0, 0], self.size));
    }
}

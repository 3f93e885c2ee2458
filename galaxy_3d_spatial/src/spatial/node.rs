/// Quad tree nodes stored in a [`NodePool`](crate::utils::NodePool).

use glam::Vec2;
use crate::shapes::Bounds;
use crate::utils::Poolable;
use super::ShapeKey;

/// Stable index of a node in the tree's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw pool index
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Child slot order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    BottomLeft = 0,
    BottomRight = 1,
    TopRight = 2,
    TopLeft = 3,
}

impl Quadrant {
    /// All quadrants in child slot order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
        Quadrant::TopRight,
        Quadrant::TopLeft,
    ];

    /// Sub-rectangle of `parent` covered by this quadrant.
    pub fn bounds(self, parent: &Bounds<Vec2>) -> Bounds<Vec2> {
        let c = parent.center();
        let (min, max) = (parent.min, parent.max);
        match self {
            Quadrant::BottomLeft => Bounds::new(min, c),
            Quadrant::BottomRight => Bounds::new(Vec2::new(c.x, min.y), Vec2::new(max.x, c.y)),
            Quadrant::TopRight => Bounds::new(c, max),
            Quadrant::TopLeft => Bounds::new(Vec2::new(min.x, c.y), Vec2::new(c.x, max.y)),
        }
    }
}

/// A node: either a leaf holding items, or an internal node with four children.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) bounds: Bounds<Vec2>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<[NodeId; 4]>,
    pub(crate) items: Vec<ShapeKey>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(Vec2::ZERO, Vec2::ZERO),
            parent: None,
            children: None,
            items: Vec::new(),
        }
    }
}

impl Poolable for Node {
    fn reset(&mut self) {
        self.bounds = Bounds::new(Vec2::ZERO, Vec2::ZERO);
        self.parent = None;
        self.children = None;
        self.items.clear();
    }
}

impl Node {
    /// Node rectangle on the XZ plane
    pub fn bounds(&self) -> &Bounds<Vec2> {
        &self.bounds
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in [`Quadrant`] order, `None` for a leaf
    pub fn children(&self) -> Option<&[NodeId; 4]> {
        self.children.as_ref()
    }

    /// Child in one quadrant
    pub fn child(&self, quadrant: Quadrant) -> Option<NodeId> {
        self.children.map(|c| c[quadrant as usize])
    }

    /// True iff the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Items resident at this node
    pub fn items(&self) -> &[ShapeKey] {
        &self.items
    }
}

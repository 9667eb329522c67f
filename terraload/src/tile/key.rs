//! Quadtree tile coordinates.

use std::fmt;

/// Position of a tile in the quadtree.
///
/// `y == 0` is the northernmost row of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub const fn new(x: u32, y: u32, level: u32) -> Self {
        Self { level, x, y }
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    /// The tile one level up, or `None` for a root.
    pub fn parent(&self) -> Option<TileKey> {
        if self.is_root() {
            return None;
        }
        Some(Self::new(self.x / 2, self.y / 2, self.level - 1))
    }

    /// The four children in northwest, northeast, southwest, southeast order.
    pub fn children(&self) -> [TileKey; 4] {
        let level = self.level + 1;
        let x = self.x * 2;
        let y = self.y * 2;
        [
            Self::new(x, y, level),
            Self::new(x + 1, y, level),
            Self::new(x, y + 1, level),
            Self::new(x + 1, y + 1, level),
        ]
    }

    pub fn southwest_child(&self) -> TileKey {
        self.children()[2]
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_order() {
        let children = TileKey::new(1, 0, 1).children();
        assert_eq!(children[0], TileKey::new(2, 0, 2));
        assert_eq!(children[1], TileKey::new(3, 0, 2));
        assert_eq!(children[2], TileKey::new(2, 1, 2));
        assert_eq!(children[3], TileKey::new(3, 1, 2));
    }

    #[test]
    fn test_parent_of_each_child() {
        let key = TileKey::new(5, 3, 4);
        for child in key.children() {
            assert_eq!(child.parent(), Some(key));
        }
        assert_eq!(TileKey::new(1, 0, 0).parent(), None);
    }

    #[test]
    fn test_southwest_child_of_root() {
        assert_eq!(TileKey::new(0, 0, 0).southwest_child(), TileKey::new(0, 1, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(TileKey::new(3, 1, 2).to_string(), "2/3/1");
    }
}

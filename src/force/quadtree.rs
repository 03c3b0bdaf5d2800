//! Quadtree over node positions for the Barnes-Hut charge approximation.
//!
//! Each cell records its square bounds, the centroid of the nodes it
//! contains and their count. Leaves hold one node, or several when the
//! nodes coincide or the depth limit is reached.

use crate::graph::Point;

/// Deeper cells would fall below f32 resolution for typical layouts.
const MAX_DEPTH: u32 = 24;

pub(crate) enum CellKind {
    Leaf(Vec<usize>),
    Branch([Option<usize>; 4]),
}

pub(crate) struct Cell {
    pub x0: f32,
    pub y0: f32,
    pub size: f32,
    pub centroid: Point,
    pub count: u32,
    pub kind: CellKind,
}

impl Cell {
    /// True when `p` lies inside the cell's square.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x0 + self.size && p.y >= self.y0 && p.y <= self.y0 + self.size
    }
}

pub(crate) struct QuadTree {
    cells: Vec<Cell>,
}

impl QuadTree {
    /// Build a tree over `(slot, position)` pairs.
    pub fn build(points: Vec<(usize, Point)>) -> Self {
        let mut tree = Self {
            cells: Vec::with_capacity(points.len() * 2),
        };
        if points.is_empty() {
            return tree;
        }

        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for (_, p) in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let size = (max_x - min_x).max(max_y - min_y).max(f32::EPSILON);

        tree.build_cell(points, min_x, min_y, size, 0);
        tree
    }

    /// Root cell index; the root is always the first cell built.
    pub fn root(&self) -> Option<usize> {
        if self.cells.is_empty() { None } else { Some(0) }
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    fn build_cell(&mut self, points: Vec<(usize, Point)>, x0: f32, y0: f32, size: f32, depth: u32) -> usize {
        let count = points.len();
        let (sum_x, sum_y) = points
            .iter()
            .fold((0.0_f32, 0.0_f32), |(sx, sy), (_, p)| (sx + p.x, sy + p.y));
        let centroid = Point::new(sum_x / count as f32, sum_y / count as f32);

        let index = self.cells.len();
        let coincident = points.iter().all(|(_, p)| *p == points[0].1);
        if count == 1 || coincident || depth >= MAX_DEPTH {
            self.cells.push(Cell {
                x0,
                y0,
                size,
                centroid,
                count: count as u32,
                kind: CellKind::Leaf(points.into_iter().map(|(slot, _)| slot).collect()),
            });
            return index;
        }

        self.cells.push(Cell {
            x0,
            y0,
            size,
            centroid,
            count: count as u32,
            kind: CellKind::Branch([None; 4]),
        });

        let half = size / 2.0;
        let mid_x = x0 + half;
        let mid_y = y0 + half;
        let mut quadrants: [Vec<(usize, Point)>; 4] = Default::default();
        for (slot, p) in points {
            let q = usize::from(p.x >= mid_x) | (usize::from(p.y >= mid_y) << 1);
            quadrants[q].push((slot, p));
        }

        let mut children = [None; 4];
        for (q, quadrant) in quadrants.into_iter().enumerate() {
            if quadrant.is_empty() {
                continue;
            }
            let cx = if q & 1 == 1 { mid_x } else { x0 };
            let cy = if q & 2 == 2 { mid_y } else { y0 };
            children[q] = Some(self.build_cell(quadrant, cx, cy, half, depth + 1));
        }
        self.cells[index].kind = CellKind::Branch(children);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(tree: &QuadTree, index: usize, out: &mut Vec<usize>) {
        match &tree.cell(index).kind {
            CellKind::Leaf(slots) => out.extend(slots),
            CellKind::Branch(children) => {
                for &child in children.iter().flatten() {
                    leaves(tree, child, out);
                }
            }
        }
    }

    #[test]
    fn test_empty_tree() {
        let tree = QuadTree::build(Vec::new());
        assert!(tree.root().is_none());
    }

    #[test]
    fn test_every_point_lands_in_one_leaf() {
        let points: Vec<_> = (0..50)
            .map(|i| (i, Point::new((i * 7 % 13) as f32, (i * 3 % 11) as f32)))
            .collect();
        let tree = QuadTree::build(points);

        let root = tree.root().unwrap();
        assert_eq!(tree.cell(root).count, 50);

        let mut slots = Vec::new();
        leaves(&tree, root, &mut slots);
        slots.sort_unstable();
        assert_eq!(slots, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_centroid_is_mean() {
        let tree = QuadTree::build(vec![
            (0, Point::new(0.0, 0.0)),
            (1, Point::new(10.0, 0.0)),
            (2, Point::new(10.0, 10.0)),
            (3, Point::new(0.0, 10.0)),
        ]);
        let root = tree.cell(tree.root().unwrap());
        assert_eq!(root.centroid, Point::new(5.0, 5.0));
        assert!(root.contains(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_coincident_points_share_a_leaf() {
        let tree = QuadTree::build(vec![
            (0, Point::new(1.0, 1.0)),
            (1, Point::new(1.0, 1.0)),
            (2, Point::new(1.0, 1.0)),
        ]);
        match &tree.cell(tree.root().unwrap()).kind {
            CellKind::Leaf(slots) => assert_eq!(slots.len(), 3),
            CellKind::Branch(_) => panic!("coincident points should form one leaf"),
        }
    }
}

use std::collections::HashSet;

use super::geometry::{normalize, parse_pattern, reflect, rotate, signature};
use super::types::{BOARD_SIZE, HAND_SIZE, Point};
use crate::games::SessionRng;
use crate::identifiers::ShapeId;

/// Hand-authored piece before rotation/reflection expansion.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseShape {
    pub name: String,
    pub pattern: String,
    pub weight: f64,
    /// At most one shape of a category is dealt per hand.
    pub category: Option<String>,
}

impl BaseShape {
    pub fn new(name: &str, pattern: &str, weight: f64, category: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            weight,
            category: category.map(str::to_string),
        }
    }
}

/// One placeable variant.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    pub name: String,
    pub cells: Vec<Point>,
    pub color: u8,
    pub base_index: usize,
}

impl Shape {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn height(&self) -> i32 {
        self.cells.iter().map(|p| p.row + 1).max().unwrap_or(0)
    }

    pub fn width(&self) -> i32 {
        self.cells.iter().map(|p| p.col + 1).max().unwrap_or(0)
    }

    /// True when the shape fills its whole `side`×`side` bounding box.
    pub fn is_solid_square(&self, side: i32) -> bool {
        self.height() == side && self.width() == side && self.cells.len() == (side * side) as usize
    }
}

/// Immutable set of every placeable variant plus the per-base lookup tables
/// hand dealing needs. Built once and shared behind an `Arc`.
#[derive(Debug)]
pub struct ShapeCatalog {
    shapes: Vec<Shape>,
    variant_base: Vec<usize>,
    base_names: Vec<String>,
    base_variant_counts: Vec<usize>,
    base_weights: Vec<f64>,
    base_categories: Vec<Option<String>>,
}

impl ShapeCatalog {
    pub fn new(definitions: &[BaseShape]) -> Result<Self, String> {
        let mut shapes = Vec::new();
        let mut variant_base = Vec::new();
        let mut base_variant_counts = Vec::with_capacity(definitions.len());

        if definitions.len() >= u8::MAX as usize {
            return Err(format!(
                "At most {} base shapes are supported, got {}",
                u8::MAX - 1,
                definitions.len()
            ));
        }

        for (base_index, base) in definitions.iter().enumerate() {
            if !(base.weight.is_finite() && base.weight > 0.0) {
                return Err(format!(
                    "Shape {} must have a positive weight, got {}",
                    base.name, base.weight
                ));
            }

            let original = parse_pattern(&base.pattern);
            if original.is_empty() {
                return Err(format!("Shape {} has no occupied cells", base.name));
            }
            if original
                .iter()
                .any(|p| p.row >= BOARD_SIZE as i32 || p.col >= BOARD_SIZE as i32)
            {
                return Err(format!("Shape {} does not fit on the board", base.name));
            }

            let variants = expand_variants(&original);
            base_variant_counts.push(variants.len());

            for (k, cells) in variants.into_iter().enumerate() {
                let id = u16::try_from(shapes.len())
                    .map_err(|_| "Too many shape variants".to_string())?;
                shapes.push(Shape {
                    id: ShapeId::new(id),
                    name: format!("{}#{}", base.name, k),
                    cells,
                    color: (base_index + 1) as u8,
                    base_index,
                });
                variant_base.push(base_index);
            }
        }

        Ok(Self {
            shapes,
            variant_base,
            base_names: definitions.iter().map(|b| b.name.clone()).collect(),
            base_variant_counts,
            base_weights: definitions.iter().map(|b| b.weight).collect(),
            base_categories: definitions.iter().map(|b| b.category.clone()).collect(),
        })
    }

    /// Catalog built from [`standard_definitions`].
    pub fn standard() -> Self {
        Self::new(&standard_definitions()).expect("built-in shape definitions are valid")
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.index())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.name == name)
    }

    pub fn base_count(&self) -> usize {
        self.base_names.len()
    }

    pub fn base_of(&self, id: ShapeId) -> Option<usize> {
        self.variant_base.get(id.index()).copied()
    }

    pub fn base_name(&self, base_index: usize) -> Option<&str> {
        self.base_names.get(base_index).map(String::as_str)
    }

    pub fn variant_count(&self, base_index: usize) -> usize {
        self.base_variant_counts.get(base_index).copied().unwrap_or(0)
    }

    pub fn base_weight(&self, base_index: usize) -> f64 {
        self.base_weights.get(base_index).copied().unwrap_or(0.0)
    }

    pub fn base_category(&self, base_index: usize) -> Option<&str> {
        self.base_categories.get(base_index).and_then(|c| c.as_deref())
    }

    pub fn max_color(&self) -> u8 {
        self.base_names.len() as u8
    }

    /// Pool entries one variant contributes when dealing:
    /// `max(1, round(10 × weight / variant_count))`.
    pub fn pool_entries(&self, id: ShapeId) -> usize {
        let Some(base) = self.base_of(id) else {
            return 0;
        };
        let count = self.variant_count(base).max(1) as f64;
        let entries = (10.0 * self.base_weight(base) / count).round();
        (entries as usize).max(1)
    }

    /// Deals a full hand. Variants already dealt, and variants whose category
    /// is already in the hand, are excluded from later draws. If the pool
    /// runs dry the remaining slots stay empty.
    pub fn deal_hand(&self, rng: &mut SessionRng) -> [Option<ShapeId>; HAND_SIZE] {
        let mut hand = [None; HAND_SIZE];
        let mut chosen: Vec<ShapeId> = Vec::with_capacity(HAND_SIZE);
        let mut used_categories: HashSet<&str> = HashSet::new();

        for slot in hand.iter_mut() {
            let mut pool: Vec<ShapeId> = Vec::new();
            for shape in &self.shapes {
                if chosen.contains(&shape.id) {
                    continue;
                }
                if let Some(category) = self.base_category(shape.base_index)
                    && used_categories.contains(category)
                {
                    continue;
                }
                let entries = self.pool_entries(shape.id);
                pool.extend(std::iter::repeat_n(shape.id, entries));
            }

            if pool.is_empty() {
                break;
            }

            let picked = pool[rng.index(pool.len())];
            if let Some(category) = self.base_of(picked).and_then(|b| self.base_category(b)) {
                used_categories.insert(category);
            }
            chosen.push(picked);
            *slot = Some(picked);
        }

        hand
    }
}

/// Mirror image then original, each under four quarter turns, keeping the
/// first occurrence of every distinct footprint. The order fixes variant ids.
fn expand_variants(original: &[Point]) -> Vec<Vec<Point>> {
    let mut seen = HashSet::new();
    let mut variants = Vec::new();

    for start in [reflect(original), normalize(original)] {
        let mut current = start;
        for _ in 0..4 {
            if seen.insert(signature(&current)) {
                variants.push(current.clone());
            }
            current = rotate(&current);
        }
    }

    variants
}

pub fn standard_definitions() -> Vec<BaseShape> {
    vec![
        BaseShape::new("mono", "#", 1.0, None),
        BaseShape::new("domino", "##", 1.5, None),
        BaseShape::new("tromino_i", "###", 1.5, None),
        BaseShape::new(
            "tromino_l",
            "
            #.
            ##
            ",
            2.0,
            None,
        ),
        BaseShape::new("tetromino_i", "####", 1.2, None),
        BaseShape::new(
            "tetromino_o",
            "
            ##
            ##
            ",
            1.5,
            None,
        ),
        BaseShape::new(
            "tetromino_t",
            "
            ###
            .#.
            ",
            1.5,
            None,
        ),
        BaseShape::new(
            "tetromino_l",
            "
            #.
            #.
            ##
            ",
            1.5,
            None,
        ),
        BaseShape::new(
            "tetromino_s",
            "
            .##
            ##.
            ",
            1.2,
            None,
        ),
        BaseShape::new("pentomino_i", "#####", 0.8, None),
        BaseShape::new(
            "pentomino_v",
            "
            #..
            #..
            ###
            ",
            0.8,
            None,
        ),
        BaseShape::new(
            "pentomino_t",
            "
            ###
            .#.
            .#.
            ",
            0.6,
            None,
        ),
        BaseShape::new(
            "pentomino_u",
            "
            #.#
            ###
            ",
            0.7,
            None,
        ),
        BaseShape::new(
            "pentomino_x",
            "
            .#.
            ###
            .#.
            ",
            0.5,
            None,
        ),
        BaseShape::new(
            "square_3",
            "
            ###
            ###
            ###
            ",
            0.3,
            None,
        ),
        BaseShape::new(
            "diagonal_2",
            "
            #.
            .#
            ",
            0.8,
            Some("diagonal"),
        ),
        BaseShape::new(
            "diagonal_3",
            "
            #..
            .#.
            ..#
            ",
            0.5,
            Some("diagonal"),
        ),
    ]
}

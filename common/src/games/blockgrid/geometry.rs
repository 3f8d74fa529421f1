use super::types::Point;

const OCCUPIED: char = '#';

/// Reads a glyph pattern such as
///
/// ```text
///     #.
///     ##
/// ```
///
/// Blank lines are skipped and the indentation shared by the remaining lines
/// is stripped, so patterns can be written inline in indented source.
pub fn parse_pattern(pattern: &str) -> Vec<Point> {
    let lines: Vec<&str> = pattern.lines().filter(|l| !l.trim().is_empty()).collect();
    let indent = lines
        .iter()
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut points = Vec::new();
    for (row, line) in lines.iter().enumerate() {
        for (col, ch) in line.chars().skip(indent).enumerate() {
            if ch == OCCUPIED {
                points.push(Point::new(row as i32, col as i32));
            }
        }
    }
    normalize(&points)
}

/// Shifts the points so the minimum row and column are 0 and sorts them.
pub fn normalize(points: &[Point]) -> Vec<Point> {
    let min_row = points.iter().map(|p| p.row).min().unwrap_or(0);
    let min_col = points.iter().map(|p| p.col).min().unwrap_or(0);
    let mut shifted: Vec<Point> = points
        .iter()
        .map(|p| Point::new(p.row - min_row, p.col - min_col))
        .collect();
    shifted.sort();
    shifted
}

/// Quarter turn: `(r, c) -> (c, -r)`, normalized.
pub fn rotate(points: &[Point]) -> Vec<Point> {
    let turned: Vec<Point> = points.iter().map(|p| Point::new(p.col, -p.row)).collect();
    normalize(&turned)
}

/// Mirror: `(r, c) -> (r, -c)`, normalized.
pub fn reflect(points: &[Point]) -> Vec<Point> {
    let mirrored: Vec<Point> = points.iter().map(|p| Point::new(p.row, -p.col)).collect();
    normalize(&mirrored)
}

/// Order-independent identity of a normalized point set.
pub fn signature(points: &[Point]) -> String {
    let mut pairs: Vec<(i32, i32)> = points.iter().map(|p| (p.row, p.col)).collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(r, c)| format!("{},{}", r, c))
        .collect::<Vec<_>>()
        .join(";")
}

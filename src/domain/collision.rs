// Collision detection over grid rectangles
use super::item::{GridRect, Item};

/// Axis-aligned intersection; shared edges do not count.
pub fn overlaps(a: &GridRect, b: &GridRect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// True iff any item other than `ignore_id` overlaps `candidate`.
pub fn collides(candidate: &GridRect, items: &[Item], ignore_id: Option<&str>) -> bool {
    items
        .iter()
        .filter(|it| Some(it.id.as_str()) != ignore_id)
        .any(|it| overlaps(candidate, &it.rect()))
}

/// First free top-left position for a `w`x`h` rect, scanning row by row.
pub fn first_free_slot(items: &[Item], w: u32, h: u32, cols: u32, rows: u32) -> Option<GridRect> {
    let max_x = cols.saturating_sub(w);
    let max_y = rows.saturating_sub(h);
    (0..=max_y)
        .flat_map(|y| (0..=max_x).map(move |x| GridRect::new(x, y, w, h)))
        .find(|candidate| !collides(candidate, items, None))
}

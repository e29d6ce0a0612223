//! Cell geometry for floating panels.
//!
//! Terminal coordinates are measured in cells with the origin at the top-left
//! corner of the screen. Positions are signed so that a panel flipped above
//! an anchor near the top edge can be computed before it is clipped.

use unicode_width::UnicodeWidthChar;

/// An axis-aligned rectangle in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in cells.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Rect {
    /// Creates a rectangle.
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the right-most column.
    pub fn right(&self) -> i32 {
        self.x + i32::from(self.width)
    }

    /// One past the bottom row.
    pub fn bottom(&self) -> i32 {
        self.y + i32::from(self.height)
    }

    /// Whether the cell at `(x, y)` lies inside the rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Which side of the anchor the panel opens towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Panel hangs below the anchor.
    #[default]
    Down,
    /// Panel sits above the anchor.
    Up,
}

/// The anchoring point of a floating panel and the edges it grows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Row of the anchoring edge.
    pub top: i32,
    /// Column of the anchoring edge.
    pub left: i32,
    /// The panel grows upwards from `top` (translateY -100%).
    pub flip_y: bool,
    /// The panel grows leftwards from `left` (translateX -100%).
    pub flip_x: bool,
}

impl Placement {
    /// Computes where a panel attaches to `anchor`.
    ///
    /// Opening down attaches below the anchor; opening up attaches to the
    /// anchor's top edge and flips. Right alignment attaches to the anchor's
    /// right edge and flips horizontally.
    pub fn for_anchor(anchor: Rect, direction: Direction, right_align: bool) -> Self {
        let top = match direction {
            Direction::Up => anchor.y,
            Direction::Down => anchor.bottom(),
        };
        let left = if right_align { anchor.right() } else { anchor.x };
        Self {
            top,
            left,
            flip_y: direction == Direction::Up,
            flip_x: right_align,
        }
    }

    /// The rectangle a panel of `width × height` occupies at this placement.
    pub fn panel_rect(&self, width: u16, height: u16) -> Rect {
        let y = if self.flip_y {
            self.top - i32::from(height)
        } else {
            self.top
        };
        let x = if self.flip_x {
            self.left - i32::from(width)
        } else {
            self.left
        };
        Rect::new(x, y, width, height)
    }
}

/// Display width of a possibly styled string.
pub fn display_width(s: &str) -> usize {
    let plain = strip_ansi_escapes::strip_str(s);
    plain.chars().filter_map(UnicodeWidthChar::width).sum()
}

/// Composites `panel` on top of `frame` with its top-left cell at `(x, y)`.
///
/// Frame lines are treated as plain text; rows and columns outside the frame
/// are clipped. Wide characters that would be split by the panel edge are
/// replaced with spaces.
pub fn overlay(frame: &str, panel: &str, x: i32, y: i32) -> String {
    let mut lines: Vec<String> = frame.split('\n').map(str::to_string).collect();

    for (offset, panel_line) in panel.split('\n').enumerate() {
        let row = y + offset as i32;
        if row < 0 {
            continue;
        }
        let row = row as usize;
        while lines.len() <= row {
            lines.push(String::new());
        }
        lines[row] = splice_line(&lines[row], panel_line, x);
    }

    lines.join("\n")
}

fn splice_line(base: &str, insert: &str, x: i32) -> String {
    let base = strip_ansi_escapes::strip_str(base);
    let mut insert = strip_ansi_escapes::strip_str(insert);
    let mut start = x;
    if start < 0 {
        // Drop the clipped prefix of the insert.
        let mut skipped = 0usize;
        let skip = start.unsigned_abs() as usize;
        let mut rest = String::new();
        for ch in insert.chars() {
            let w = ch.width().unwrap_or(0);
            if skipped >= skip {
                rest.push(ch);
            } else if skipped + w > skip {
                rest.push(' ');
            }
            skipped += w;
        }
        insert = rest;
        start = 0;
    }
    let start = start as usize;
    let insert_width = display_width(&insert);
    let end = start + insert_width;

    let mut out = String::new();
    let mut col = 0usize;
    let mut inserted = false;
    for ch in base.chars() {
        let w = ch.width().unwrap_or(0);
        if col + w <= start {
            out.push(ch);
        } else if col < start {
            // Wide char straddling the left edge.
            out.push_str(&" ".repeat(start - col));
        } else if col >= end {
            if !inserted {
                out.push_str(&insert);
                inserted = true;
            }
            out.push(ch);
        } else if col + w > end {
            // Wide char straddling the right edge.
            if !inserted {
                out.push_str(&insert);
                inserted = true;
            }
            out.push_str(&" ".repeat(col + w - end));
        }
        col += w;
    }
    if !inserted {
        if col < start {
            out.push_str(&" ".repeat(start - col));
        }
        out.push_str(&insert);
    }
    out
}

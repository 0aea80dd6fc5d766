use crate::surface::{RasterSurface, Rgb};

pub const GLYPH_COLS: usize = 5;
pub const GLYPH_ROWS: usize = 7;
const ADVANCE: usize = GLYPH_COLS + 1;

const GLYPHS: &[(char, [&str; GLYPH_ROWS])] = &[
    ('A', [" ### ", "#   #", "#   #", "#####", "#   #", "#   #", "#   #"]),
    ('B', ["#### ", "#   #", "#   #", "#### ", "#   #", "#   #", "#### "]),
    ('C', [" ####", "#    ", "#    ", "#    ", "#    ", "#    ", " ####"]),
    ('D', ["#### ", "#   #", "#   #", "#   #", "#   #", "#   #", "#### "]),
    ('E', ["#####", "#    ", "#    ", "#### ", "#    ", "#    ", "#####"]),
    ('F', ["#####", "#    ", "#    ", "#### ", "#    ", "#    ", "#    "]),
    ('G', [" ####", "#    ", "#    ", "#  ##", "#   #", "#   #", " ### "]),
    ('H', ["#   #", "#   #", "#   #", "#####", "#   #", "#   #", "#   #"]),
    ('I', ["#####", "  #  ", "  #  ", "  #  ", "  #  ", "  #  ", "#####"]),
    ('K', ["#   #", "#  # ", "# #  ", "##   ", "# #  ", "#  # ", "#   #"]),
    ('L', ["#    ", "#    ", "#    ", "#    ", "#    ", "#    ", "#####"]),
    ('M', ["#   #", "## ##", "# # #", "# # #", "#   #", "#   #", "#   #"]),
    ('N', ["#   #", "##  #", "# # #", "#  ##", "#   #", "#   #", "#   #"]),
    ('O', [" ### ", "#   #", "#   #", "#   #", "#   #", "#   #", " ### "]),
    ('P', ["#### ", "#   #", "#   #", "#### ", "#    ", "#    ", "#    "]),
    ('R', ["#### ", "#   #", "#   #", "#### ", "# #  ", "#  # ", "#   #"]),
    ('S', [" ####", "#    ", "#    ", " ### ", "    #", "    #", "#### "]),
    ('T', ["#####", "  #  ", "  #  ", "  #  ", "  #  ", "  #  ", "  #  "]),
    ('U', ["#   #", "#   #", "#   #", "#   #", "#   #", "#   #", " ### "]),
    ('W', ["#   #", "#   #", "#   #", "# # #", "# # #", "## ##", "#   #"]),
    ('Y', ["#   #", "#   #", " # # ", "  #  ", "  #  ", "  #  ", "  #  "]),
    (' ', ["     ", "     ", "     ", "     ", "     ", "     ", "     "]),
];

/// Unknown characters render as a hollow box.
const MISSING: [&str; GLYPH_ROWS] = ["#####", "#   #", "#   #", "#   #", "#   #", "#   #", "#####"];

fn glyph(ch: char) -> &'static [&'static str; GLYPH_ROWS] {
    let up = ch.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(c, _)| *c == up)
        .map(|(_, rows)| rows)
        .unwrap_or(&MISSING)
}

/// Logical width of `text` drawn with cells of `cell` units.
pub fn text_width(text: &str, cell: f32) -> f32 {
    let n = text.chars().count();
    if n == 0 {
        return 0.0;
    }
    (n * ADVANCE - 1) as f32 * cell
}

pub fn text_height(cell: f32) -> f32 {
    GLYPH_ROWS as f32 * cell
}

/// Draws `text` with its top-left corner at `(x, y)` in logical units.
pub fn draw_text(
    surface: &mut RasterSurface,
    text: &str,
    x: f32,
    y: f32,
    cell: f32,
    rgb: Rgb,
    alpha: f32,
) {
    let (surface_w, _) = surface.logical_size();
    let glyph_w = GLYPH_COLS as f32 * cell;
    let mut pen = x;
    for ch in text.chars() {
        if pen > surface_w {
            break;
        }
        if pen + glyph_w >= 0.0 {
            for (row, bits) in glyph(ch).iter().enumerate() {
                for (col, b) in bits.bytes().enumerate() {
                    if b == b'#' {
                        surface.fill_rect(
                            pen + col as f32 * cell,
                            y + row as f32 * cell,
                            cell,
                            cell,
                            rgb,
                            alpha,
                        );
                    }
                }
            }
        }
        pen += ADVANCE as f32 * cell;
    }
}

use crate::shared::frame::Frame;

const BACKGROUND: [u8; 3] = [128, 128, 128];
const INK: u8 = 255;

const GLYPH_WIDTH: usize = 5;
const GLYPH_HEIGHT: usize = 7;
const GLYPH_SPACING: usize = 1;
const LINE_SPACING: usize = 3;
/// Unscaled margin kept free on every side of the text block.
const MARGIN: usize = 1;

const LINES: [&str; 2] = ["NO", "THUMB"];

/// 5x7 glyphs, one byte per row, bit 4 is the leftmost column.
fn glyph(c: char) -> [u8; GLYPH_HEIGHT] {
    match c {
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        _ => [0; GLYPH_HEIGHT],
    }
}

fn text_width(line: &str) -> usize {
    let n = line.chars().count();
    if n == 0 {
        return 0;
    }
    n * GLYPH_WIDTH + (n - 1) * GLYPH_SPACING
}

/// Flat gray raster of exactly `width` x `height` with a centered
/// "NO THUMB" marker. The marker is omitted when it cannot fit.
pub fn placeholder(width: u32, height: u32) -> Frame {
    let mut frame = Frame::filled(width, height, BACKGROUND);
    let (w, h) = (width as usize, height as usize);

    let block_w = LINES.iter().map(|l| text_width(l)).max().unwrap_or(0);
    let block_h = LINES.len() * GLYPH_HEIGHT + (LINES.len() - 1) * LINE_SPACING;
    let scale = (w / (block_w + 2 * MARGIN)).min(h / (block_h + 2 * MARGIN));
    if scale == 0 {
        return frame;
    }

    let mut pixels = frame.as_ndarray_mut();
    let top = (h - block_h * scale) / 2;
    for (row, line) in LINES.iter().enumerate() {
        let y0 = top + row * (GLYPH_HEIGHT + LINE_SPACING) * scale;
        let x0 = (w - text_width(line) * scale) / 2;
        for (i, c) in line.chars().enumerate() {
            let gx = x0 + i * (GLYPH_WIDTH + GLYPH_SPACING) * scale;
            for (gy, bits) in glyph(c).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let y = y0 + gy * scale + dy;
                            let x = gx + col * scale + dx;
                            for ch in 0..3 {
                                pixels[[y, x, ch]] = INK;
                            }
                        }
                    }
                }
            }
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ink_pixels(frame: &Frame) -> usize {
        frame.data().chunks(3).filter(|p| p == &[INK; 3]).count()
    }

    #[rstest]
    #[case(150, 150)]
    #[case(300, 100)]
    #[case(40, 200)]
    #[case(1, 1)]
    fn test_exact_size(#[case] w: u32, #[case] h: u32) {
        assert_eq!(placeholder(w, h).dimensions(), (w, h));
    }

    #[test]
    fn test_marker_drawn_on_gray() {
        let frame = placeholder(150, 150);
        let ink = ink_pixels(&frame);
        assert!(ink > 0);
        assert!(ink < 150 * 150 / 4);
        assert!(frame
            .data()
            .chunks(3)
            .all(|p| p == [INK; 3] || p == BACKGROUND));
        // Corners stay background.
        assert_eq!(&frame.data()[..3], &BACKGROUND);
    }

    #[test]
    fn test_marker_is_horizontally_centered() {
        let frame = placeholder(150, 150);
        let pixels = frame.as_ndarray();
        let columns: Vec<usize> = (0..150)
            .filter(|&x| (0..150).any(|y| pixels[[y, x, 0]] == INK))
            .collect();
        let left = columns[0];
        let right = 149 - columns[columns.len() - 1];
        assert!(left.abs_diff(right) <= 1);
    }

    #[test]
    fn test_too_small_for_marker_is_plain_gray() {
        let frame = placeholder(10, 10);
        assert_eq!(ink_pixels(&frame), 0);
    }

    #[test]
    fn test_marker_scales_with_size() {
        assert!(ink_pixels(&placeholder(300, 300)) > ink_pixels(&placeholder(100, 100)));
    }
}

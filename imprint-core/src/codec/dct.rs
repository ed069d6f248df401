//! Block-wise 8x8 DCT over the luminance plane.
//!
//! The transform is the orthonormal DCT-II (the JPEG transform), applied
//! separably over rows and columns of each 8x8 block. The watermark lives
//! in the luminance channel: the luma delta produced by a modified block is
//! added back to all three RGB channels so dimensions and bit depth are
//! preserved.

use image::RgbImage;

/// Side length of a transform block.
pub const BLOCK_SIZE: usize = 8;

/// One 8x8 block of luma samples or DCT coefficients, row-major.
pub type Block = [f32; BLOCK_SIZE * BLOCK_SIZE];

/// Orthonormal DCT-II basis: `BASIS[u][x] = a(u) * cos((2x+1) * u * pi / 16)`.
fn basis() -> [[f32; BLOCK_SIZE]; BLOCK_SIZE] {
    let mut b = [[0.0f32; BLOCK_SIZE]; BLOCK_SIZE];
    let n = BLOCK_SIZE as f32;
    for (u, row) in b.iter_mut().enumerate() {
        let scale = if u == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        for (x, v) in row.iter_mut().enumerate() {
            let angle = ((2 * x + 1) as f32) * (u as f32) * std::f32::consts::PI / (2.0 * n);
            *v = scale * angle.cos();
        }
    }
    b
}

/// Forward 8x8 DCT of a luma block.
pub fn forward(block: &Block) -> Block {
    let c = basis();
    let mut tmp = [0.0f32; BLOCK_SIZE * BLOCK_SIZE];
    // Rows
    for y in 0..BLOCK_SIZE {
        for u in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for x in 0..BLOCK_SIZE {
                acc += c[u][x] * block[y * BLOCK_SIZE + x];
            }
            tmp[y * BLOCK_SIZE + u] = acc;
        }
    }
    // Columns
    let mut out = [0.0f32; BLOCK_SIZE * BLOCK_SIZE];
    for u in 0..BLOCK_SIZE {
        for v in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for y in 0..BLOCK_SIZE {
                acc += c[v][y] * tmp[y * BLOCK_SIZE + u];
            }
            out[v * BLOCK_SIZE + u] = acc;
        }
    }
    out
}

/// Inverse 8x8 DCT back to luma samples.
pub fn inverse(coeffs: &Block) -> Block {
    let c = basis();
    let mut tmp = [0.0f32; BLOCK_SIZE * BLOCK_SIZE];
    // Columns
    for u in 0..BLOCK_SIZE {
        for y in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for v in 0..BLOCK_SIZE {
                acc += c[v][y] * coeffs[v * BLOCK_SIZE + u];
            }
            tmp[y * BLOCK_SIZE + u] = acc;
        }
    }
    // Rows
    let mut out = [0.0f32; BLOCK_SIZE * BLOCK_SIZE];
    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for u in 0..BLOCK_SIZE {
                acc += c[u][x] * tmp[y * BLOCK_SIZE + u];
            }
            out[y * BLOCK_SIZE + x] = acc;
        }
    }
    out
}

/// BT.601 luma plane of an RGB image.
pub fn luma_plane(img: &RgbImage) -> Vec<f32> {
    img.pixels()
        .map(|p| 0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32)
        .collect()
}

/// Copy one block out of the luma plane at block coordinates `(bx, by)`.
pub fn read_block(plane: &[f32], width: usize, bx: usize, by: usize) -> Block {
    let mut block = [0.0f32; BLOCK_SIZE * BLOCK_SIZE];
    for row in 0..BLOCK_SIZE {
        let src = (by * BLOCK_SIZE + row) * width + bx * BLOCK_SIZE;
        block[row * BLOCK_SIZE..(row + 1) * BLOCK_SIZE]
            .copy_from_slice(&plane[src..src + BLOCK_SIZE]);
    }
    block
}

/// Apply a modified luma block back onto the RGB image as a per-pixel luma
/// delta, clamped to the u8 range.
pub fn apply_block(img: &mut RgbImage, plane: &[f32], block: &Block, bx: usize, by: usize) {
    let width = img.width() as usize;
    for row in 0..BLOCK_SIZE {
        for col in 0..BLOCK_SIZE {
            let x = bx * BLOCK_SIZE + col;
            let y = by * BLOCK_SIZE + row;
            let delta = block[row * BLOCK_SIZE + col] - plane[y * width + x];
            let px = img.get_pixel_mut(x as u32, y as u32);
            for ch in px.0.iter_mut() {
                *ch = (*ch as f32 + delta).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

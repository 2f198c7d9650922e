//! Packed bit raster
//!
//! Each row is stored as `ceil(width / 32)` words. The first pixel of a row
//! lives in the most significant bit of the row's first word, and bits past
//! `width` in the last word of a row are always zero.

/// Number of pixels packed into one storage word
pub const WORD_BITS: usize = 32;

/// Number of words needed to hold one row of `width` pixels
#[inline]
pub(crate) fn words_per_row(width: usize) -> usize {
    width.div_ceil(WORD_BITS)
}

/// Mask of the bits that belong to the pixels of a row's last word
#[inline]
fn tail_mask(width: usize) -> u32 {
    match width % WORD_BITS {
        0 => u32::MAX,
        rem => u32::MAX << (WORD_BITS - rem),
    }
}

/// Mask selecting the bit of column `x` within its word
#[inline]
fn column_bit(x: usize) -> u32 {
    0x8000_0000 >> (x % WORD_BITS)
}

/// Reads the 32 pixels starting `shift` bits into word `index` of `row`
///
/// A shift of zero reads the word as-is. Shifting a `u32` by 32 is not a
/// no-op we can rely on, so the overflow word is only consulted for non-zero
/// shifts.
#[inline]
fn aligned_word(row: &[u32], index: usize, shift: usize) -> u32 {
    if shift == 0 {
        return row[index];
    }
    let high = row[index] << shift;
    let low = row.get(index + 1).map_or(0, |next| next >> (WORD_BITS - shift));
    high | low
}

/// A fixed-size grid of occupancy bits
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitRaster {
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// Words per row
    pub(crate) stride: usize,
    pub(crate) words: Vec<u32>,
}

impl BitRaster {
    /// Create an empty raster
    pub fn new(width: usize, height: usize) -> Self {
        let stride = words_per_row(width);
        Self {
            width,
            height,
            stride,
            words: vec![0; stride * height],
        }
    }

    /// Create a raster with every in-bounds bit set
    pub fn solid_rectangle(width: usize, height: usize) -> Self {
        let mut raster = Self::new(width, height);
        let tail = tail_mask(width);
        for y in 0..height {
            let row = raster.row_mut(y);
            row.fill(u32::MAX);
            if let Some(last) = row.last_mut() {
                *last &= tail;
            }
        }
        raster
    }

    /// Create a raster by evaluating `predicate(x, y)` for every pixel
    pub fn from_fn(width: usize, height: usize, mut predicate: impl FnMut(usize, usize) -> bool) -> Self {
        let mut raster = Self::new(width, height);
        for y in 0..height {
            let row = raster.row_mut(y);
            for x in 0..width {
                if predicate(x, y) {
                    row[x / WORD_BITS] |= column_bit(x);
                }
            }
        }
        raster
    }

    /// Width in pixels
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Check whether the raster covers no pixels at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Words of row `y`
    ///
    /// Panics if `y` is out of range.
    #[inline]
    pub fn row_words(&self, y: usize) -> &[u32] {
        &self.words[y * self.stride..(y + 1) * self.stride]
    }

    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [u32] {
        &mut self.words[y * self.stride..(y + 1) * self.stride]
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Read a single pixel; out-of-range pixels read as empty
    pub fn get(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        self.row_words(y)[x / WORD_BITS] & column_bit(x) != 0
    }

    /// Write a single pixel; out-of-range writes are ignored
    pub fn set(&mut self, x: i32, y: i32, solid: bool) {
        if !self.in_bounds(x, y) {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let word = &mut self.row_mut(y)[x / WORD_BITS];
        if solid {
            *word |= column_bit(x);
        } else {
            *word &= !column_bit(x);
        }
    }

    /// Number of set pixels
    pub fn count_solid(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Test whether `other`, placed at `(dx, dy)` in this raster's
    /// coordinates, overlaps any set bit of this raster
    ///
    /// Collision is symmetric: `a.collides_with(b, dx, dy)` equals
    /// `b.collides_with(a, -dx, -dy)`. Queries entirely outside this raster
    /// return `false`.
    pub fn collides_with(&self, other: &BitRaster, dx: i32, dy: i32) -> bool {
        if dx < 0 {
            return other.collides_with(self, dx.saturating_neg(), dy.saturating_neg());
        }
        if self.is_empty() || other.is_empty() {
            return false;
        }

        // Bounding rectangle rejection
        let dx = dx as usize;
        if dx >= self.width {
            return false;
        }
        let dy = dy as i64;
        let first_row = dy.max(0);
        let end_row = (self.height as i64).min(dy + other.height as i64);
        if first_row >= end_row {
            return false;
        }

        let word_offset = dx / WORD_BITS;
        let shift = dx % WORD_BITS;
        let columns = (self.stride - word_offset).min(other.stride);

        for y in first_row..end_row {
            let row = self.row_words(y as usize);
            let other_row = other.row_words((y - dy) as usize);
            for (k, &other_word) in other_row.iter().enumerate().take(columns) {
                if other_word != 0 && aligned_word(row, word_offset + k, shift) & other_word != 0 {
                    return true;
                }
            }
        }
        false
    }

    /// OR `other`, placed at `(dx, dy)`, into this raster
    ///
    /// Negative offsets are clamped to zero; the parts of `other` that fall
    /// past the right or bottom edge are dropped.
    pub fn add(&mut self, other: &BitRaster, dx: i32, dy: i32) {
        self.apply(other, dx, dy, |word, bits| word | bits);
    }

    /// Clear every bit of this raster covered by `other` placed at `(dx, dy)`
    ///
    /// Offsets are clamped the same way as [`BitRaster::add`].
    pub fn subtract(&mut self, other: &BitRaster, dx: i32, dy: i32) {
        self.apply(other, dx, dy, |word, bits| word & !bits);
    }

    fn apply(&mut self, other: &BitRaster, dx: i32, dy: i32, op: impl Fn(u32, u32) -> u32) {
        // TODO: clip negative offsets like collides_with once no caller relies on the clamp
        let dx = dx.max(0) as usize;
        let dy = dy.max(0) as usize;
        if dx >= self.width || dy >= self.height || other.is_empty() {
            return;
        }

        let word_offset = dx / WORD_BITS;
        let shift = dx % WORD_BITS;
        let tail = tail_mask(self.width);
        let rows = (self.height - dy).min(other.height);

        for other_y in 0..rows {
            let y = dy + other_y;
            let start = y * self.stride;
            let other_row = &other.words[other_y * other.stride..(other_y + 1) * other.stride];
            for (k, &bits) in other_row.iter().enumerate() {
                let index = word_offset + k;
                if index >= self.stride {
                    break;
                }
                self.words[start + index] = op(self.words[start + index], bits >> shift);
                if shift != 0 && index + 1 < self.stride {
                    let spill = bits << (WORD_BITS - shift);
                    self.words[start + index + 1] = op(self.words[start + index + 1], spill);
                }
            }
            let last = start + self.stride - 1;
            self.words[last] &= tail;
        }
    }

    /// Copy the sub-rectangle starting at `(x, y)`
    ///
    /// Pixels outside this raster come out empty, so the copy always has the
    /// requested size.
    pub fn region(&self, x: i32, y: i32, width: usize, height: usize) -> BitRaster {
        BitRaster::from_fn(width, height, |rx, ry| {
            self.get(x + rx as i32, y + ry as i32)
        })
    }
}

//! Raw raster data for snapshots and network sync
//!
//! [`RasterData`] carries the width, height and raw row words of a raster.
//! Converting back never re-derives bits from a source image.

use serde::{Deserialize, Serialize};

use crate::raster::{words_per_row, BitRaster, WORD_BITS};

/// Serializable raw form of a [`BitRaster`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterData {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// One entry per row, each holding `ceil(width / 32)` words
    pub rows: Vec<Vec<u32>>,
}

impl BitRaster {
    /// Export the raster's raw words
    pub fn to_data(&self) -> RasterData {
        RasterData {
            width: self.width,
            height: self.height,
            rows: (0..self.height).map(|y| self.row_words(y).to_vec()).collect(),
        }
    }

    /// Rebuild a raster from raw words
    ///
    /// Fails if the row layout does not match the dimensions or if any bit
    /// past the row width is set.
    pub fn from_data(data: &RasterData) -> Result<Self, RasterError> {
        if data.rows.len() != data.height {
            return Err(RasterError::RowCount {
                expected: data.height,
                found: data.rows.len(),
            });
        }

        let stride = words_per_row(data.width);
        let padding = match data.width % WORD_BITS {
            0 => 0,
            rem => u32::MAX >> rem,
        };

        let mut words = Vec::with_capacity(stride * data.height);
        for (y, row) in data.rows.iter().enumerate() {
            if row.len() != stride {
                return Err(RasterError::RowLength {
                    row: y,
                    expected: stride,
                    found: row.len(),
                });
            }
            if row.last().is_some_and(|last| last & padding != 0) {
                return Err(RasterError::PaddingBits { row: y });
            }
            words.extend_from_slice(row);
        }

        Ok(Self {
            width: data.width,
            height: data.height,
            stride,
            words,
        })
    }
}

/// Error rebuilding a raster from raw data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Number of rows does not match the height
    RowCount { expected: usize, found: usize },
    /// A row has the wrong number of words for the width
    RowLength { row: usize, expected: usize, found: usize },
    /// A row has bits set past the raster width
    PaddingBits { row: usize },
}

impl std::fmt::Display for RasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RasterError::RowCount { expected, found } => {
                write!(f, "Expected {} rows, found {}", expected, found)
            }
            RasterError::RowLength { row, expected, found } => {
                write!(f, "Row {} has {} words, expected {}", row, found, expected)
            }
            RasterError::PaddingBits { row } => {
                write!(f, "Row {} has bits set past the raster width", row)
            }
        }
    }
}

impl std::error::Error for RasterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_round_trip() {
        let raster = BitRaster::from_fn(45, 7, |x, y| (x + y) % 3 == 0);
        let data = raster.to_data();

        assert_eq!(data.width, 45);
        assert_eq!(data.height, 7);
        assert_eq!(data.rows.len(), 7);
        assert!(data.rows.iter().all(|row| row.len() == 2));

        let restored = BitRaster::from_data(&data).unwrap();
        assert_eq!(restored, raster);
    }

    #[test]
    fn test_empty_raster_round_trip() {
        let raster = BitRaster::new(0, 0);
        let restored = BitRaster::from_data(&raster.to_data()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_wrong_row_count() {
        let data = RasterData {
            width: 8,
            height: 2,
            rows: vec![vec![0]],
        };
        assert_eq!(
            BitRaster::from_data(&data),
            Err(RasterError::RowCount { expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_wrong_row_length() {
        let data = RasterData {
            width: 40,
            height: 1,
            rows: vec![vec![0]],
        };
        assert_eq!(
            BitRaster::from_data(&data),
            Err(RasterError::RowLength { row: 0, expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_padding_bits_rejected() {
        let data = RasterData {
            width: 4,
            height: 1,
            rows: vec![vec![0xF800_0000]],
        };
        assert_eq!(
            BitRaster::from_data(&data),
            Err(RasterError::PaddingBits { row: 0 })
        );

        let valid = RasterData {
            width: 4,
            height: 1,
            rows: vec![vec![0xF000_0000]],
        };
        assert_eq!(BitRaster::from_data(&valid).unwrap().count_solid(), 4);
    }

    #[test]
    fn test_error_display() {
        let msg = format!("{}", RasterError::PaddingBits { row: 3 });
        assert!(msg.contains("Row 3"));
    }
}

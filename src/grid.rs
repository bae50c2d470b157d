use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};

use crate::error::SegmentError;

/// A single pixel of the input image.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub color: Rgb<u8>,
}

/// Row-major grid of cells. A cell's index in `cells` is its id everywhere
/// else in the crate (edges, forest, labels).
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: u32, height: u32, colors: Vec<Rgb<u8>>) -> Result<Grid, SegmentError> {
        if width == 0 || height == 0 {
            return Err(SegmentError::dimensions(format!(
                "{}x{} grid has no cells",
                width, height
            )));
        }
        let expected = width as usize * height as usize;
        if colors.len() != expected {
            return Err(SegmentError::dimensions(format!(
                "expected {} colors for a {}x{} grid, got {}",
                expected,
                width,
                height,
                colors.len()
            )));
        }

        let cells = colors
            .into_iter()
            .enumerate()
            .map(|(index, color)| Cell {
                row: index as u32 / width,
                col: index as u32 % width,
                color,
            })
            .collect();

        Ok(Grid {
            width,
            height,
            cells,
        })
    }

    pub fn from_rows(rows: &[Vec<Rgb<u8>>]) -> Result<Grid, SegmentError> {
        let width = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(SegmentError::dimensions("grid has no cells")),
        };
        if let Some((row, ragged)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(SegmentError::dimensions(format!(
                "row {} has {} cells, expected {}",
                row,
                ragged.len(),
                width
            )));
        }

        let colors = rows.iter().flat_map(|row| row.iter().copied()).collect();
        Grid::new(width as u32, rows.len() as u32, colors)
    }

    pub fn from_image(img: &DynamicImage) -> Result<Grid, SegmentError> {
        let rgb = img.to_rgb();
        let (width, height) = rgb.dimensions();
        let mut colors = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                colors.push(*rgb.get_pixel(x, y));
            }
        }
        Grid::new(width, height, colors)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn index(&self, row: u32, col: u32) -> Option<usize> {
        if row < self.height && col < self.width {
            Some((row * self.width + col) as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.index(row, col).map(|index| &self.cells[index])
    }

    /// Splits a per-cell color vector back into rows.
    pub fn to_rows(&self, colors: &[Rgb<u8>]) -> Vec<Vec<Rgb<u8>>> {
        assert_eq!(colors.len(), self.len());
        colors
            .chunks(self.width as usize)
            .map(|row| row.to_vec())
            .collect()
    }

    pub fn to_image(&self, colors: &[Rgb<u8>]) -> RgbImage {
        assert_eq!(colors.len(), self.len());
        let mut res = ImageBuffer::new(self.width, self.height);
        for (cell, color) in self.cells.iter().zip(colors) {
            res.put_pixel(cell.col, cell.row, *color);
        }
        res
    }
}

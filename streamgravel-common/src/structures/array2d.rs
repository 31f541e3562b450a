use std::io::{Error, ErrorKind};
use std::ops::{Index, IndexMut};

/// A simple in-memory 2D grid, used for intermediate per-cell state that
/// does not need the georeferencing carried by a raster. Reads outside of
/// the grid return the nodata value.
#[derive(Clone, Debug)]
pub struct Array2D<T: Copy> {
    pub columns: isize,
    pub rows: isize,
    data: Vec<T>,
    pub nodata: T,
}

impl<T: Copy> Array2D<T> {
    pub fn new(rows: isize, columns: isize, initial_value: T, nodata: T) -> Result<Array2D<T>, Error> {
        if rows < 0 || columns < 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Only non-negative rows and columns values accepted.",
            ));
        }
        Ok(Array2D {
            columns,
            rows,
            data: vec![initial_value; (rows * columns) as usize],
            nodata,
        })
    }

    pub fn get_value(&self, row: isize, column: isize) -> T {
        if column < 0 || row < 0 || column >= self.columns || row >= self.rows {
            return self.nodata;
        }
        self.data[(row * self.columns + column) as usize]
    }

    pub fn set_value(&mut self, row: isize, column: isize, value: T) {
        if column >= 0 && row >= 0 && column < self.columns && row < self.rows {
            self.data[(row * self.columns + column) as usize] = value;
        }
    }
}

impl<T: Copy> Index<(isize, isize)> for Array2D<T> {
    type Output = T;

    fn index(&self, index: (isize, isize)) -> &T {
        let (row, column) = index;
        if column < 0 || row < 0 || column >= self.columns || row >= self.rows {
            return &self.nodata;
        }
        &self.data[(row * self.columns + column) as usize]
    }
}

impl<T: Copy> IndexMut<(isize, isize)> for Array2D<T> {
    fn index_mut(&mut self, index: (isize, isize)) -> &mut T {
        let (row, column) = index;
        if column < 0 || row < 0 || column >= self.columns || row >= self.rows {
            panic!(
                "Array2D index ({}, {}) out of bounds for a {}x{} grid",
                row, column, self.rows, self.columns
            );
        }
        &mut self.data[(row * self.columns + column) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_reads_nodata() {
        let mut a: Array2D<i32> = Array2D::new(2, 3, 0, -1).unwrap();
        a.set_value(1, 2, 7);
        assert_eq!(a.get_value(1, 2), 7);
        assert_eq!(a[(1, 2)], 7);
        assert_eq!(a.get_value(-1, 0), -1);
        assert_eq!(a[(2, 0)], -1);
    }

    #[test]
    fn test_negative_dimensions_rejected() {
        assert!(Array2D::<u8>::new(-1, 2, 0, 0).is_err());
    }
}

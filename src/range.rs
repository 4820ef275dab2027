//! 1-based inclusive row ranges and slicing a table by them.

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};
use crate::table::{Row, Table};

/// Inclusive, 1-based row range. Always satisfies `1 <= start <= end <= row_count`
/// for the table it was validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowRange {
    start: u64,
    end: u64,
}

/// Raw row-range inputs as collected from the user; either may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeInput {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl RowRange {
    /// Validate `start..=end` against a table of `row_count` data rows.
    ///
    /// # Errors
    /// [`ConvertError::InvalidRange`] when `start > end`,
    /// [`ConvertError::RangeOutOfBounds`] when either end falls outside `1..=row_count`.
    pub fn new(start: u64, end: u64, row_count: usize) -> Result<Self> {
        if start > end {
            return Err(ConvertError::InvalidRange { start, end });
        }
        let rows = u64::try_from(row_count).unwrap_or(u64::MAX);
        if start < 1 || end > rows {
            return Err(ConvertError::RangeOutOfBounds {
                start,
                end,
                row_count: rows,
            });
        }
        Ok(Self { start, end })
    }

    /// Apply input-collection rules, then validate.
    ///
    /// Unset start defaults to 1 and unset end to the last row; both are clamped
    /// into `1..=max(1, row_count)`. Only `start > end` (and an empty table) can
    /// still fail.
    ///
    /// # Errors
    /// See [`RowRange::new`].
    pub fn from_inputs(input: RangeInput, row_count: usize) -> Result<Self> {
        let max = i64::try_from(row_count).unwrap_or(i64::MAX).max(1);
        let start = input.start.unwrap_or(1).clamp(1, max);
        let end = input.end.unwrap_or(max).clamp(1, max);
        Self::new(start.unsigned_abs(), end.unsigned_abs(), row_count)
    }

    /// Whole table.
    ///
    /// # Errors
    /// [`ConvertError::RangeOutOfBounds`] when the table has no data rows.
    pub fn full(row_count: usize) -> Result<Self> {
        Self::from_inputs(RangeInput::default(), row_count)
    }

    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of rows covered.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

impl std::fmt::Display for RowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Borrowed view of a contiguous run of rows plus the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSlice<'a> {
    pub columns: &'a [String],
    pub rows: &'a [Row],
}

impl TableSlice<'_> {
    #[must_use]
    pub fn to_table(&self) -> Table {
        Table {
            columns: self.columns.to_vec(),
            rows: self.rows.to_vec(),
        }
    }
}

impl Table {
    /// Rows `range.start()..=range.end()` (1-based).
    ///
    /// # Errors
    /// [`ConvertError::RangeOutOfBounds`] if `range` was validated against a
    /// larger table.
    pub fn select(&self, range: RowRange) -> Result<TableSlice<'_>> {
        let out_of_bounds = || ConvertError::RangeOutOfBounds {
            start: range.start,
            end: range.end,
            row_count: u64::try_from(self.row_count()).unwrap_or(u64::MAX),
        };
        let lo = usize::try_from(range.start - 1).map_err(|_| out_of_bounds())?;
        let hi = usize::try_from(range.end).map_err(|_| out_of_bounds())?;
        let rows = self.rows.get(lo..hi).ok_or_else(out_of_bounds)?;
        Ok(TableSlice {
            columns: &self.columns,
            rows,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn numbered(n: usize) -> Table {
        Table {
            columns: vec!["n".into()],
            rows: (1..=n)
                .map(|i| vec![CellValue::Number(f64::from(u32::try_from(i).unwrap()))])
                .collect(),
        }
    }

    #[test]
    fn test_start_after_end_is_invalid() {
        let err = RowRange::new(5, 3, 10).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRange { start: 5, end: 3 }));
        let err = RowRange::from_inputs(
            RangeInput {
                start: Some(5),
                end: Some(3),
            },
            10,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRange { .. }));
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(matches!(
            RowRange::new(0, 3, 10),
            Err(ConvertError::RangeOutOfBounds { .. })
        ));
        assert!(matches!(
            RowRange::new(1, 11, 10),
            Err(ConvertError::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_inputs_default_and_clamp() {
        let r = RowRange::from_inputs(RangeInput::default(), 10).unwrap();
        assert_eq!((r.start(), r.end()), (1, 10));

        let r = RowRange::from_inputs(
            RangeInput {
                start: Some(-4),
                end: Some(99),
            },
            10,
        )
        .unwrap();
        assert_eq!((r.start(), r.end()), (1, 10));
        assert_eq!(r.row_count(), 10);
    }

    #[test]
    fn test_empty_table_has_no_valid_range() {
        assert!(matches!(
            RowRange::full(0),
            Err(ConvertError::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_select_exact_rows() {
        let table = numbered(10);
        let slice = table.select(RowRange::new(3, 5, 10).unwrap()).unwrap();
        let values: Vec<String> = slice.rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(values, vec!["3", "4", "5"]);
        assert_eq!(slice.columns, &["n".to_string()]);
    }

    #[test]
    fn test_full_range_is_whole_table() {
        let table = numbered(4);
        let slice = table.select(RowRange::full(4).unwrap()).unwrap();
        assert_eq!(slice.to_table(), table);
    }

    #[test]
    fn test_reslicing_is_idempotent() {
        let table = numbered(8);
        let range = RowRange::new(2, 6, 8).unwrap();
        let first = table.select(range).unwrap().to_table();
        let second = table.select(range).unwrap().to_table();
        assert_eq!(first, second);
        assert_eq!(first.row_count(), 5);
    }

    #[test]
    fn test_range_from_larger_table_is_rejected() {
        let range = RowRange::new(1, 9, 9).unwrap();
        assert!(numbered(3).select(range).is_err());
    }
}

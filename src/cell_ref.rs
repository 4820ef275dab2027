//! Utilities for building Excel-style cell references and ranges.

/// Convert a 0-indexed column into its letter form (`0` → `A`, `26` → `AA`).
#[must_use]
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = u64::from(col) + 1; // Convert to 1-based
    while n > 0 {
        n -= 1;
        let offset = u8::try_from(n % 26).unwrap_or(0);
        result.insert(0, char::from(b'A' + offset));
        n /= 26;
    }
    result
}

/// 0-indexed `(row, col)` → `"A1"` form.
#[must_use]
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), u64::from(row) + 1)
}

/// Reference covering `rows × cols` cells from A1, or `"A1"` when empty.
#[must_use]
pub fn dimension_ref(rows: u32, cols: u32) -> String {
    if rows == 0 || cols == 0 {
        return "A1".to_string();
    }
    format!("A1:{}", cell_ref(rows - 1, cols - 1))
}

//! Spreadsheet column naming (0 → A, 25 → Z, 26 → AA, ...)

/// Convert a zero-based column offset to its spreadsheet letter label.
///
/// Bijective base-26: 0→A, 25→Z, 26→AA, 701→ZZ, 702→AAA. Not bounded by
/// any particular spreadsheet's column limit.
pub fn column_label(offset: usize) -> String {
    let mut result = String::new();
    let mut num = offset;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}

/// Inverse of [`column_label`]. Case-insensitive; `None` for empty or
/// non-alphabetic labels.
pub fn column_offset(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }

    let mut value: usize = 0;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }

    Some(value - 1)
}

/// A1-style reference for a zero-based column and a 1-based row.
pub fn cell_reference(offset: usize, row: u32) -> String {
    format!("{}{}", column_label(offset), row)
}

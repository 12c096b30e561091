use std::ops::RangeInclusive;

/// Validates if a given string is not empty.
///
/// # Arguments
///
/// * `value` - The string to validate.
///
/// # Returns
///
/// * `Ok(())` if the string is not empty.
/// * `Err(&'static str)` if the string is empty.
pub fn is_not_empty(value: &str) -> Result<(), &'static str> {
    if !value.is_empty() {
        Ok(())
    } else {
        Err("Value cannot be empty")
    }
}

/// Validates if a given string can be used as a single directory name.
///
/// Path components become one level of the session layout, so they must be
/// non-empty and free of separators and null bytes.
///
/// # Arguments
///
/// * `value` - The string to validate.
///
/// # Returns
///
/// * `Ok(())` if the string is a usable path component.
/// * `Err(&'static str)` if the string is empty or contains a separator.
pub fn is_path_component(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Err("Path component cannot be empty");
    }
    if value == "." || value == ".." {
        return Err("Path component cannot be a relative directory reference");
    }
    if value.chars().any(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err("Path component cannot contain separators or null bytes");
    }
    Ok(())
}

/// Validates if a given string names a supported text encoding.
///
/// Tables are read and written as UTF-8; any other encoding is rejected up
/// front instead of producing garbled output.
///
/// # Arguments
///
/// * `encoding` - The encoding label to validate.
///
/// # Returns
///
/// * `Ok(())` if the encoding is supported.
/// * `Err(&'static str)` if the encoding is unsupported.
pub fn is_supported_encoding(encoding: &str) -> Result<(), &'static str> {
    let label = encoding.trim().to_ascii_lowercase();
    if label == "utf-8" || label == "utf8" {
        Ok(())
    } else {
        Err("Only the utf-8 encoding is supported")
    }
}

/// Validates if a given value is within a specified numeric range.
///
/// # Arguments
///
/// * `value` - The value to validate.
/// * `range` - The inclusive range to validate against.
///
/// # Returns
///
/// * `Ok(())` if the value is within the range.
/// * `Err(&'static str)` if the value is outside the range.
pub fn is_in_range<T: PartialOrd>(value: T, range: RangeInclusive<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("Value is outside the specified range")
    }
}

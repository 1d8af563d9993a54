//! Roman numeral conversion for book, act and scene numbers.

const NUMERALS: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

fn digit_value(c: char) -> Option<u32> {
    match c.to_ascii_uppercase() {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Parse a Roman numeral in any letter case.
///
/// Only canonical numerals in 1..=3999 are accepted: `IIII`, `VX` and `IC`
/// are rejected even though a lenient reader could assign them a value.
pub fn parse_roman(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }

    let mut total = 0u32;
    let mut prev = 0u32;
    for c in s.chars().rev() {
        let value = digit_value(c)?;
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
            prev = value;
        }
    }

    // Additive parsing accepts malformed input; the canonical rendering must
    // reproduce the original spelling.
    match to_roman(total) {
        Some(canonical) if canonical.eq_ignore_ascii_case(s) => Some(total),
        _ => None,
    }
}

/// Render `n` as an upper-case Roman numeral. `None` outside 1..=3999.
pub fn to_roman(mut n: u32) -> Option<String> {
    if n == 0 || n > 3999 {
        return None;
    }

    let mut out = String::new();
    for &(value, symbol) in &NUMERALS {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    Some(out)
}

/// Parse a section number written either in Arabic digits or as a Roman numeral.
pub fn parse_section_number(s: &str) -> Option<u32> {
    if s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse().ok().filter(|&n| n > 0);
    }
    parse_roman(s)
}

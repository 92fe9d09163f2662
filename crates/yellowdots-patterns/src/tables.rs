//! Fixed lookup tables shared by the built-in encodings.

/// Manufacturer code (one-hot indices of four consecutive words) to vendors.
///
/// A code used by several vendors decodes to all of them.
pub const MANUFACTURER_CODES: &[(&str, &[&str])] = &[
    ("3210", &["Okidata"]),
    ("0213", &["Lexmark"]),
    ("0123", &["Xerox", "Dell"]),
    ("3201", &["Epson"]),
    ("2130", &["Konica Minolta"]),
    ("1302", &["Kyocera"]),
];

/// Two 4-bit one-hot words (high word first) to a decimal digit.
///
/// Patterns with equal high and low index are never used, neither are
/// `(3, 1)` and `(3, 2)`.
pub const ONE_HOT_PAIR_DIGITS: &[(&str, char)] = &[
    ("10000100", '0'),
    ("10000010", '1'),
    ("10000001", '2'),
    ("01001000", '3'),
    ("01000010", '4'),
    ("01000001", '5'),
    ("00101000", '6'),
    ("00100100", '7'),
    ("00100001", '8'),
    ("00011000", '9'),
];

/// Digit to letter substitution for alphanumeric serial prefixes.
pub const SERIAL_LETTERS: &[(char, char)] = &[
    ('0', 'A'),
    ('1', 'B'),
    ('2', 'C'),
    ('3', 'D'),
    ('4', 'E'),
    ('5', 'F'),
    ('6', 'G'),
    ('7', 'H'),
    ('8', 'J'),
    ('9', 'K'),
];

/// Vendors registered for `code`.
pub fn manufacturers_for(
    table: &[(&str, &'static [&'static str])],
    code: &str,
) -> Option<&'static [&'static str]> {
    table.iter().find(|(c, _)| *c == code).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn pair_table_is_a_bijection_of_one_hot_pairs() {
        let patterns: HashSet<_> = ONE_HOT_PAIR_DIGITS.iter().map(|(b, _)| *b).collect();
        let digits: HashSet<_> = ONE_HOT_PAIR_DIGITS.iter().map(|(_, d)| *d).collect();
        assert_eq!(patterns.len(), 10);
        assert_eq!(digits.len(), 10);
        for (bits, _) in ONE_HOT_PAIR_DIGITS {
            assert_eq!(bits.len(), 8);
            assert_eq!(bits[..4].matches('1').count(), 1);
            assert_eq!(bits[4..].matches('1').count(), 1);
            assert_ne!(bits[..4].find('1'), bits[4..].find('1'));
        }
    }

    #[test]
    fn manufacturer_codes_are_unique_permutations() {
        let codes: HashSet<_> = MANUFACTURER_CODES.iter().map(|(c, _)| *c).collect();
        assert_eq!(codes.len(), MANUFACTURER_CODES.len());
        for (code, vendors) in MANUFACTURER_CODES {
            let mut digits: Vec<char> = code.chars().collect();
            digits.sort_unstable();
            assert_eq!(digits, vec!['0', '1', '2', '3']);
            assert!(!vendors.is_empty());
        }
        assert_eq!(
            manufacturers_for(MANUFACTURER_CODES, "0123"),
            Some(&["Xerox", "Dell"][..])
        );
        assert_eq!(manufacturers_for(MANUFACTURER_CODES, "0000"), None);
    }

    #[test]
    fn serial_letters_skip_i() {
        assert!(SERIAL_LETTERS.iter().all(|(_, l)| *l != 'I'));
        assert_eq!(SERIAL_LETTERS.len(), 10);
    }
}

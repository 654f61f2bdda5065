/// Normalize a phone number as it arrives from spreadsheet exports.
///
/// Sheets frequently hand over long numbers in scientific notation
/// ("9.87654321E+9"), so numeric-looking values are expanded before the
/// digit filter runs. The expansion is lossy for exotic inputs; it is kept
/// as-is for import compatibility with existing spreadsheets.
pub(crate) fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let expanded = if looks_scientific(trimmed) {
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => format!("{value:.0}"),
            _ => trimmed.to_string(),
        }
    } else {
        trimmed.to_string()
    };

    let digits: String = expanded.chars().filter(|ch| ch.is_ascii_digit()).collect();

    if digits.len() == 10 {
        Some(digits)
    } else {
        None
    }
}

fn looks_scientific(value: &str) -> bool {
    value.contains(['e', 'E']) && value.chars().all(|ch| {
        ch.is_ascii_digit() || matches!(ch, '.' | '+' | '-' | 'e' | 'E')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ten_digit_number_passes() {
        assert_eq!(normalize("9876543210"), Some("9876543210".to_string()));
    }

    #[test]
    fn spacing_and_punctuation_are_stripped() {
        assert_eq!(normalize(" 98765 43210 "), Some("9876543210".to_string()));
        assert_eq!(normalize("98765-43210"), Some("9876543210".to_string()));
    }

    #[test]
    fn scientific_notation_artifact_is_expanded() {
        assert_eq!(normalize("9.87654321E+9"), Some("9876543210".to_string()));
        assert_eq!(normalize("9.87654321e9"), Some("9876543210".to_string()));
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(normalize("12345"), None);
        assert_eq!(normalize("+91 9876543210"), None);
    }

    #[test]
    fn empty_and_garbage_are_rejected() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("not-a-number"), None);
    }
}

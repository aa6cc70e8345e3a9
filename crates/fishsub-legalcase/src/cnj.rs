use fishsub_core::{Error, Result};

/// Maps a CNJ `(justice segment, court code)` pair onto the DataJud court
/// acronym used in its endpoint path. Lets the gateway be queried from a bare
/// CNJ number alone, with no court acronym supplied by the caller.
const COURT_CODE_MAP: &[((&str, &str), &str)] = &[
    (("3", "00"), "stj"),
    (("5", "00"), "tst"),
    (("6", "00"), "tse"),
    (("7", "00"), "stm"),
    (("4", "01"), "trf1"),
    (("4", "02"), "trf2"),
    (("4", "03"), "trf3"),
    (("4", "04"), "trf4"),
    (("4", "05"), "trf5"),
    (("4", "06"), "trf6"),
    (("5", "01"), "trt1"),
    (("5", "02"), "trt2"),
    (("5", "03"), "trt3"),
    (("5", "04"), "trt4"),
    (("5", "05"), "trt5"),
    (("5", "06"), "trt6"),
    (("5", "07"), "trt7"),
    (("5", "08"), "trt8"),
    (("5", "09"), "trt9"),
    (("5", "10"), "trt10"),
    (("5", "11"), "trt11"),
    (("5", "12"), "trt12"),
    (("5", "13"), "trt13"),
    (("5", "14"), "trt14"),
    (("5", "15"), "trt15"),
    (("5", "16"), "trt16"),
    (("5", "17"), "trt17"),
    (("5", "18"), "trt18"),
    (("5", "19"), "trt19"),
    (("5", "20"), "trt20"),
    (("5", "21"), "trt21"),
    (("5", "22"), "trt22"),
    (("5", "23"), "trt23"),
    (("5", "24"), "trt24"),
    (("8", "01"), "tjac"),
    (("8", "02"), "tjal"),
    (("8", "03"), "tjap"),
    (("8", "04"), "tjam"),
    (("8", "05"), "tjba"),
    (("8", "06"), "tjce"),
    (("8", "07"), "tjdft"),
    (("8", "08"), "tjes"),
    (("8", "09"), "tjgo"),
    (("8", "10"), "tjma"),
    (("8", "11"), "tjmt"),
    (("8", "12"), "tjms"),
    (("8", "13"), "tjmg"),
    (("8", "14"), "tjpa"),
    (("8", "15"), "tjpb"),
    (("8", "16"), "tjpr"),
    (("8", "17"), "tjpe"),
    (("8", "18"), "tjpi"),
    (("8", "19"), "tjrj"),
    (("8", "20"), "tjrn"),
    (("8", "21"), "tjrs"),
    (("8", "22"), "tjro"),
    (("8", "23"), "tjrr"),
    (("8", "24"), "tjsc"),
    (("8", "25"), "tjsp"),
    (("8", "26"), "tjse"),
    (("8", "27"), "tjto"),
];

/// Resolves the DataJud court acronym from the justice-segment and
/// court-code digits embedded in a CNJ number, so a first-time lookup needs
/// nothing beyond the case number itself.
pub fn resolve_court_acronym(raw: &str) -> Result<Option<&'static str>> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 20 {
        return Err(Error::InvalidInput(format!(
            "CNJ number must contain 20 digits, got {}",
            digits.len()
        )));
    }
    let justice_segment = &digits[13..14];
    let court_code = &digits[14..16];
    Ok(COURT_CODE_MAP
        .iter()
        .find(|((j, c), _)| *j == justice_segment && *c == court_code)
        .map(|(_, acronym)| *acronym))
}

/// Canonicalises a CNJ process number to `NNNNNNN-DD.AAAA.J.TR.OOOO`
/// (7+2+4+1+2+4 digits, spec §6). Accepts either the dotted/dashed form or a
/// bare 20-digit string; rejects anything else (spec §8 boundary: length != 20
/// or non-digit content after stripping separators).
pub fn canonicalize(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 20 {
        return Err(Error::InvalidInput(format!(
            "CNJ number must contain 20 digits, got {}",
            digits.len()
        )));
    }

    Ok(format!(
        "{}-{}.{}.{}.{}.{}",
        &digits[0..7],
        &digits[7..9],
        &digits[9..13],
        &digits[13..14],
        &digits[14..16],
        &digits[16..20],
    ))
}

/// Strips formatting, leaving the raw 20-digit string the provider expects
/// in its query (matches the original gateway's `CNJNumber.clean_number`).
pub fn clean_digits(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 20 {
        return Err(Error::InvalidInput(format!(
            "CNJ number must contain 20 digits, got {}",
            digits.len()
        )));
    }
    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonicalizes_bare_digits() {
        assert_eq!(
            canonicalize("07108025520188020001").unwrap(),
            "0710802-55.2018.8.02.0001"
        );
    }

    #[test]
    fn canonicalize_is_idempotent_on_already_formatted_input() {
        assert_eq!(
            canonicalize("0710802-55.2018.8.02.0001").unwrap(),
            "0710802-55.2018.8.02.0001"
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(canonicalize("123").is_err());
        assert!(canonicalize("071080255201880200011").is_err());
    }

    #[test]
    fn rejects_non_digit_payload() {
        let err = canonicalize("not-a-case-number-at-all").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn resolves_court_acronym_from_justice_segment_and_court_code() {
        assert_eq!(
            resolve_court_acronym("07108025520188020001").unwrap(),
            Some("tjal")
        );
        assert_eq!(
            resolve_court_acronym("00001234520234010000").unwrap(),
            Some("trf1")
        );
    }

    #[test]
    fn resolve_court_acronym_returns_none_for_unmapped_combination() {
        assert_eq!(
            resolve_court_acronym("00001234520239990000").unwrap(),
            None
        );
    }
}

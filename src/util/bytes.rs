/// Determines if `needle` appears contiguously anywhere in `haystack`.
pub fn is_sub<T: PartialEq>(
    haystack: &[T],
    needle: &[T],
) -> bool {
    if needle.is_empty() {
        return true;
    }

    if needle.len() > haystack.len() {
        return false;
    }

    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

/// Returns true if all bytes of `input` show up *in order* in `output` -- "fuzzy" containment.
/// Device terminals wrap long inputs with weird control/whitespace interleaving, so exact echo
/// matching is too strict.
pub fn roughly_contains(
    output: &[u8],
    input: &[u8],
) -> bool {
    if is_sub(output, input) {
        return true;
    }

    if output.len() < input.len() {
        return false;
    }

    let mut remaining = output;

    for input_byte in input {
        match remaining.iter().position(|output_byte| output_byte == input_byte) {
            Some(idx) => remaining = &remaining[idx + 1..],
            None => return false,
        }
    }

    true
}

fn in_cutset(
    b: u8,
    cutset: &[u8],
) -> bool {
    cutset.contains(&b)
}

/// Trim all bytes in the cutset from the *right* side of `b`.
#[must_use]
pub fn trim_cutset_right<'a>(
    b: &'a [u8],
    cutset: &[u8],
) -> &'a [u8] {
    match b.iter().rposition(|byte| !in_cutset(*byte, cutset)) {
        Some(to) => &b[..=to],
        None => &[],
    }
}

/// Trim all bytes in the cutset from both sides of `b`.
#[must_use]
pub fn trim_cutset<'a>(
    b: &'a [u8],
    cutset: &[u8],
) -> &'a [u8] {
    let Some(from) = b.iter().position(|byte| !in_cutset(*byte, cutset)) else {
        return &[];
    };

    let to = b
        .iter()
        .rposition(|byte| !in_cutset(*byte, cutset))
        .unwrap_or(from);

    &b[from..=to]
}

#[cfg(test)]
mod tests {
    use super::{
        is_sub,
        roughly_contains,
        trim_cutset,
        trim_cutset_right,
    };

    #[test]
    fn is_sub_finds_contained_slices() {
        assert!(is_sub(b"show version", b"version"));
        assert!(is_sub(b"show version", b""));
        assert!(!is_sub(b"show ver", b"show version"));
        assert!(!is_sub(b"show version", b"vrsion"));
    }

    #[test]
    fn roughly_contains_tolerates_interleaving() {
        // terminal wrapped the echo with a newline in the middle
        assert!(roughly_contains(b"show runn\ning-config", b"show running-config"));
        assert!(!roughly_contains(b"show run", b"show running-config"));
    }

    #[test]
    fn trim_cutset_trims_both_sides() {
        assert_eq!(trim_cutset(b"\n\nfoo\n", b"\n"), b"foo");
        assert_eq!(trim_cutset(b"\n\n", b"\n"), b"");
        assert_eq!(trim_cutset_right(b"foo\r\n", b"\r\n"), b"foo");
        assert_eq!(trim_cutset_right(b"\r\n", b"\r\n"), b"");
    }
}

use std::cmp::Ordering;

/// Comparaison "naturelle" : les suites de chiffres sont comparées par valeur.
///
/// `"2" < "10"`, `"image_100_9" < "image_100_10"`. Ties on numeric value
/// (leading zeros) fall back to the shorter digit run, then plain byte order,
/// so the order is total.
///
/// # Example
/// ```
/// use bc_core::natsort::natural_cmp;
/// use std::cmp::Ordering;
/// assert_eq!(natural_cmp("2", "10"), Ordering::Less);
/// assert_eq!(natural_cmp("a10", "a9"), Ordering::Greater);
/// ```
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = a.as_bytes();
    let mut ys = b.as_bytes();

    loop {
        match (xs.first(), ys.first()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let (dx, rest_x) = split_digits(xs);
                let (dy, rest_y) = split_digits(ys);
                let ord = cmp_digit_runs(dx, dy);
                if ord != Ordering::Equal {
                    return ord;
                }
                xs = rest_x;
                ys = rest_y;
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(y);
                }
                xs = &xs[1..];
                ys = &ys[1..];
            }
        }
    }
}

/// Trie en place des chaînes (ou tout `AsRef<str>`) dans l'ordre naturel.
pub fn natural_sort<T: AsRef<str>>(items: &mut [T]) {
    items.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let n = s.iter().take_while(|c| c.is_ascii_digit()).count();
    s.split_at(n)
}

fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
    let (ta, tb) = (&a[trim(a)..], &b[trim(b)..]);
    ta.len()
        .cmp(&tb.len())
        .then_with(|| ta.cmp(tb))
        .then_with(|| a.len().cmp(&b.len()))
}

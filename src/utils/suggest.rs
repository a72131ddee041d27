fn normalize(value: &str) -> Vec<char> {
    value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Candidates within a length-scaled edit distance of `input`, closest first.
pub fn suggest(input: &str, candidates: &[String], limit: usize) -> Vec<String> {
    let needle = normalize(input);
    if needle.is_empty() {
        return Vec::new();
    }
    let allowed = (needle.len() / 3).max(2);

    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .filter_map(|candidate| {
            let hay = normalize(candidate);
            let contains = hay.windows(needle.len()).any(|w| w == needle.as_slice())
                || needle.windows(hay.len().max(1)).any(|w| w == hay.as_slice());
            let score = if contains { 1 } else { edit_distance(&needle, &hay) };
            (score <= allowed).then_some((score, candidate))
        })
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(limit.max(1))
        .map(|(_, name)| name.clone())
        .collect()
}

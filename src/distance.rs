///Compute the levenshtein distance between two character sequences
///Insertions, deletions and substitutions all cost 1; transpositions are not special
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a == b {
        return 0;
    }

    let length_a = a.len();
    let length_b = b.len();

    if length_a == 0 {
        return length_b;
    }
    if length_b == 0 {
        return length_a;
    }

    //single row of the DP matrix, cache[i] holds the distance for a[..=i]
    let mut cache: Vec<usize> = (1..).take(length_a).collect();
    let mut distance_a;
    let mut distance_b;
    let mut result = 0;

    for (index_b, elem_b) in b.iter().enumerate() {
        result = index_b;
        distance_a = index_b;

        for (index_a, elem_a) in a.iter().enumerate() {
            distance_b = if elem_a == elem_b {
                distance_a
            } else {
                distance_a + 1
            };

            distance_a = cache[index_a];

            result = if distance_a > result {
                if distance_b > result {
                    result + 1
                } else {
                    distance_b
                }
            } else if distance_b > distance_a {
                distance_a + 1
            } else {
                distance_b
            };

            cache[index_a] = result;
        }
    }

    result
}

///Normalised levenshtein similarity in [0,1]; two empty strings are identical (1.0)
///Lengths are measured in unicode scalar values, comparison is case-sensitive
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_length = a.len().max(b.len());
    if max_length == 0 {
        return 1.0;
    }
    let distance = levenshtein(&a, &b);
    (max_length - distance) as f64 / max_length as f64
}

///Find the candidate most similar to the target, provided it meets the threshold.
///Only a strictly better score replaces an earlier candidate, so ties go to the first one.
pub fn best_match<'a, I>(target: &str, candidates: I, threshold: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = target.to_lowercase();
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = similarity(&target, &candidate.to_lowercase());
        let best_score = best.map(|(_, s)| s).unwrap_or(0.0);
        if score > best_score && score >= threshold {
            best = Some((candidate, score));
        }
    }
    best
}

///All candidates scoring strictly above the threshold, in candidate order
pub fn similar_candidates<'a, I>(target: &str, candidates: I, threshold: f64) -> Vec<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = target.to_lowercase();
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let score = similarity(&target, &candidate.to_lowercase());
            if score > threshold {
                Some((candidate, score))
            } else {
                None
            }
        })
        .collect()
}

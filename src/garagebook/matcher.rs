//! Fuzzy name matching used by lookups such as `client find`.
//!
//! Repositories never score text themselves; they hand candidates to a
//! [`Matcher`]. [`SimpleMatcher`] ranks in tiers, case-insensitively:
//!
//! | match | score |
//! |---|---|
//! | exact | 1.0 |
//! | prefix | 0.9 |
//! | substring | 0.75 |
//! | subsequence | up to 0.5, scaled by how tightly the letters cluster |

pub trait Matcher {
    /// Similarity of `candidate` to `pattern`, in `0.0..=1.0`.
    fn score(&self, candidate: &str, pattern: &str) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleMatcher;

impl Matcher for SimpleMatcher {
    fn score(&self, candidate: &str, pattern: &str) -> f64 {
        let candidate = candidate.trim().to_lowercase();
        let pattern = pattern.trim().to_lowercase();
        if pattern.is_empty() {
            return 0.0;
        }

        if candidate == pattern {
            1.0
        } else if candidate.starts_with(&pattern) {
            0.9
        } else if candidate.contains(&pattern) {
            0.75
        } else {
            subsequence_score(&candidate, &pattern)
        }
    }
}

fn subsequence_score(candidate: &str, pattern: &str) -> f64 {
    let chars: Vec<char> = candidate.chars().collect();
    let mut first = None;
    let mut last = 0;
    let mut pos = 0;

    for p in pattern.chars() {
        match chars[pos..].iter().position(|&c| c == p) {
            Some(offset) => {
                let at = pos + offset;
                first.get_or_insert(at);
                last = at;
                pos = at + 1;
            }
            None => return 0.0,
        }
    }

    let span = last - first.unwrap_or(0) + 1;
    0.5 * pattern.chars().count() as f64 / span as f64
}

/// Items whose extracted text scores at least `threshold`, best first.
///
/// Ties keep their input order.
pub fn search<'a, T, M, F>(
    items: impl IntoIterator<Item = &'a T>,
    matcher: &M,
    extract: F,
    pattern: &str,
    threshold: f64,
) -> Vec<&'a T>
where
    T: 'a,
    M: Matcher + ?Sized,
    F: Fn(&T) -> String,
{
    let mut scored: Vec<(f64, &T)> = items
        .into_iter()
        .filter_map(|item| {
            let score = matcher.score(&extract(item), pattern);
            (score >= threshold && score > 0.0).then_some((score, item))
        })
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    scored.into_iter().map(|(_, item)| item).collect()
}

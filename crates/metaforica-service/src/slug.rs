use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const WORDS_PER_MINUTE: usize = 200;

/// Builds a URL-friendly slug from a (usually Spanish) title.
pub fn generate_slug(title: &str) -> String {
    let folded: String = title
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect();

    NON_SLUG_CHARS
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Picks `base`, or `base-1`, `base-2`, ... so that no other post owns it.
///
/// `taken` holds `(id, slug)` pairs already stored; entries belonging to
/// `current_id` do not count as conflicts.
pub fn unique_slug(base: &str, taken: &[(i32, String)], current_id: Option<i32>) -> String {
    let is_free = |candidate: &str| {
        !taken
            .iter()
            .any(|(id, slug)| slug == candidate && Some(*id) != current_id)
    };

    if is_free(base) {
        return base.to_string();
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{base}-{counter}");
        if is_free(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Minutes needed to read `content`, counting space separated words.
pub fn estimate_read_time(content: &str) -> i32 {
    let words = content.split(' ').count();
    i32::try_from(words.div_ceil(WORDS_PER_MINUTE)).unwrap_or(i32::MAX)
}

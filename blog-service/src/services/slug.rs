//! Slug derivation for posts, categories, and tags.

/// Turn free text into a URL slug: lowercase, runs of anything outside
/// `[a-z0-9]` collapse to a single hyphen, leading and trailing hyphens
/// are dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_hyphen = true;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Pick a slug that collides with none of `taken`, starting from `base`
/// and appending `-2`, `-3`, ... until one is free.
pub fn pick_unique_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|t| t == base) {
        return base.to_string();
    }
    let mut suffix = 2u32;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !taken.iter().any(|t| t == &candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Slug for a tag, matching how tags have historically been addressed:
/// lowercased with spaces replaced by hyphens.
pub fn tag_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Split a comma-separated tag field into trimmed, non-empty tag names.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

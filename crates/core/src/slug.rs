//! URL slugs for blog posts.

/// Slug used when a title has no usable characters.
pub const FALLBACK_SLUG: &str = "post";

/// Turn a title into a URL-safe slug.
///
/// Keeps ASCII letters, digits, whitespace and hyphens, lowercases the rest,
/// turns whitespace runs into a single hyphen and trims hyphens at both ends.
///
/// ```
/// use babycash_core::slug::slugify;
///
/// assert_eq!(slugify("  Cuidados del Recién Nacido!  "), "cuidados-del-recin-nacido");
/// assert_eq!(slugify("¡¡¡"), "post");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug
    }
}

/// The `n`th candidate for `base`: `base` itself for 0, then `base-1`, `base-2`...
#[must_use]
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_owned()
    } else {
        format!("{base}-{n}")
    }
}

/// First candidate for `base` that `is_taken` rejects.
///
/// Callers with async lookups walk [`candidate`] themselves.
#[must_use]
pub fn unique(base: &str, mut is_taken: impl FnMut(&str) -> bool) -> String {
    let mut n = 0;
    loop {
        let slug = candidate(base, n);
        if !is_taken(&slug) {
            return slug;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Top 10 Juguetes 2025"), "top-10-juguetes-2025");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("a  -- b"), "a-b");
        assert_eq!(slugify("--leading and trailing--"), "leading-and-trailing");
        assert_eq!(slugify("tabs\tand\nnewlines"), "tabs-and-newlines");
    }

    #[test]
    fn test_slugify_drops_punctuation_and_accents() {
        assert_eq!(slugify("¿Qué comprar?"), "qu-comprar");
        assert_eq!(slugify("C++ & Rust"), "c-rust");
        assert_eq!(slugify("Bebé's 1st year"), "bebs-1st-year");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify(""), "post");
        assert_eq!(slugify("   "), "post");
        assert_eq!(slugify("!!!"), "post");
    }

    #[test]
    fn test_unique_appends_counter() {
        let taken = ["guia", "guia-1"];
        assert_eq!(unique("guia", |s| taken.contains(&s)), "guia-2");
        assert_eq!(unique("nuevo", |s| taken.contains(&s)), "nuevo");
    }
}

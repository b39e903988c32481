//! Placeholder substitution for page and listing templates.
//!
//! Values are inserted verbatim. Shortcut data comes from the operator's own
//! configuration, so no HTML escaping is applied.

/// Replaced with the shortcut's target URL.
pub const URL_PLACEHOLDER: &str = "{{url}}";
/// Replaced with the shortcut's title.
pub const TITLE_PLACEHOLDER: &str = "{{title}}";
/// Replaced with the site version.
pub const VERSION_PLACEHOLDER: &str = "{{ver}}";
/// Replaced with the formatted shortcut list (listing template only).
pub const SHORTCUTS_PLACEHOLDER: &str = "{{shortcuts}}";

/// Values substituted into the page template for one shortcut.
#[derive(Debug, Clone, Copy)]
pub struct PageValues<'a> {
    /// Redirect destination.
    pub url: &'a str,
    /// Display title.
    pub title: &'a str,
    /// Site version.
    pub version: &'a str,
}

/// Replace every occurrence of each `(token, value)` pair in `template`.
///
/// Pairs are applied in order, each over the whole text produced so far, so
/// a later token inside an earlier value is substituted too. Unknown `{{…}}`
/// sequences are left verbatim.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter()
        .fold(template.to_owned(), |text, &(token, value)| text.replace(token, value))
}

/// Render the page template for one shortcut.
#[must_use]
pub fn render_page(template: &str, values: &PageValues<'_>) -> String {
    render(
        template,
        &[
            (URL_PLACEHOLDER, values.url),
            (TITLE_PLACEHOLDER, values.title),
            (VERSION_PLACEHOLDER, values.version),
        ],
    )
}

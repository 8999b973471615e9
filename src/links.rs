//! Betting deep-link rewriting.
//!
//! Assistant text may carry compact market references of the shape
//! `[label](2:7667490-186802546-672453170)`, a markdown link whose target is
//! a prefix plus three dash-separated numeric segments. These are rewritten
//! into full sportsbook event URLs before the text reaches the side-channel
//! index or a renderer. Everything else passes through untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::brand::Brand;

/// Matches `[label](<prefix>:<a>-<b>-<c>)` where prefix and segments are
/// numeric. Already-resolved links start with `http` and do not match.
static BETTING_LINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\((\d+):(\d+)-(\d+)-(\d+)\)")
        .expect("Invalid betting link regex pattern")
});

/// Rewrite betting link tokens in `text` into full deep-link URLs for the
/// given brand's sportsbook.
///
/// Pure and total: text without tokens (including malformed near-misses) is
/// returned unchanged, and the function is idempotent: resolved URLs contain
/// a scheme and slashes and can never re-match the token grammar.
pub fn resolve_betting_links(text: &str, brand: Brand) -> String {
    let base = brand.sports_base_url();

    BETTING_LINK_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let label = &caps[1];
            let prefix = &caps[2];
            let event = &caps[3];
            let option = format!("{}:{}-{}-{}", prefix, &caps[3], &caps[4], &caps[5]);
            format!(
                "[{}]({}/en/sports/events/{}:{}?options={})",
                label, base, prefix, event, option
            )
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_single_token() {
        let text = "Check [Palmeiras to win](2:7667490-186802546-672453170) today";
        let out = resolve_betting_links(text, Brand::Sportingbet);
        assert_eq!(
            out,
            "Check [Palmeiras to win](https://www.sportingbet.bet.br/en/sports/events/2:7667490?options=2:7667490-186802546-672453170) today"
        );
    }

    #[test]
    fn test_brand_selects_base_url() {
        let text = "[Bet now](2:1-2-3)";
        let out = resolve_betting_links(text, Brand::Bwin);
        assert!(out.starts_with("[Bet now](https://www.bwin.es/en/sports/events/2:1"));
    }

    #[test]
    fn test_prefix_is_preserved() {
        // The prefix from the token is reused in both the event id and options
        let out = resolve_betting_links("[x](4:10-20-30)", Brand::Bwin);
        assert_eq!(
            out,
            "[x](https://www.bwin.es/en/sports/events/4:10?options=4:10-20-30)"
        );
    }

    #[test]
    fn test_multiple_tokens() {
        let text = "[a](2:1-2-3) and [b](2:4-5-6)";
        let out = resolve_betting_links(text, Brand::Bwin);
        assert_eq!(out.matches("/en/sports/events/").count(), 2);
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "No links here, just odds talk.";
        assert_eq!(resolve_betting_links(text, Brand::Bwin), text);
    }

    #[test]
    fn test_ordinary_markdown_links_untouched() {
        let text = "See [the docs](https://example.com/page) for details";
        assert_eq!(resolve_betting_links(text, Brand::Bwin), text);
    }

    #[test]
    fn test_malformed_tokens_untouched() {
        // Two segments instead of three
        assert_eq!(
            resolve_betting_links("[x](2:1-2)", Brand::Bwin),
            "[x](2:1-2)"
        );
        // Non-numeric prefix
        assert_eq!(
            resolve_betting_links("[x](ab:1-2-3)", Brand::Bwin),
            "[x](ab:1-2-3)"
        );
        // Bare token without the markdown wrapper
        assert_eq!(
            resolve_betting_links("2:1-2-3", Brand::Bwin),
            "2:1-2-3"
        );
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(resolve_betting_links("", Brand::Bwin), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Check [Palmeiras](2:7667490-186802546-672453170) today",
            "plain text",
            "[x](2:1-2)",
            "",
            "[a](2:1-2-3) and [b](9:4-5-6)",
        ];
        for input in inputs {
            let once = resolve_betting_links(input, Brand::Sportingbet);
            let twice = resolve_betting_links(&once, Brand::Sportingbet);
            assert_eq!(once, twice, "resolution must be idempotent for {input:?}");
        }
    }

    #[test]
    fn test_surrounding_text_preserved() {
        let text = "before [x](2:1-2-3) after";
        let out = resolve_betting_links(text, Brand::Bwin);
        assert!(out.starts_with("before ["));
        assert!(out.ends_with(") after"));
    }
}

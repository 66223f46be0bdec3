//! Headline extraction by literal substring search.
//!
//! The page is never parsed as HTML. A scanner walks the text looking for the
//! configured anchor prefix, then reads the `href` value and the text up to the
//! next tag. Entries whose title is too short are skipped and the scan carries
//! on after them, so sparse or broken markup only ever yields fewer stories.

use super::model::Story;
use crate::config::ExtractConfig;

const HREF_OPEN: &str = "href=\"";

/// A link/title pair as it appears in the markup, before any filtering.
#[derive(Debug, PartialEq, Eq)]
struct Candidate<'a> {
    link: &'a str,
    title: &'a str,
}

impl Candidate<'_> {
    // Length in UTF-16 units, so a lone astral character (an emoji) passes.
    fn is_headline(&self) -> bool {
        self.title.encode_utf16().count() > 1
    }
}

struct Anchors<'a> {
    html: &'a str,
    prefix: &'a str,
    cursor: usize,
}

impl<'a> Anchors<'a> {
    fn new(html: &'a str, prefix: &'a str) -> Self {
        Self { html, prefix, cursor: 0 }
    }

    fn find_from(&self, needle: &str, from: usize) -> Option<usize> {
        self.html.get(from..)?.find(needle).map(|i| from + i)
    }
}

impl<'a> Iterator for Anchors<'a> {
    type Item = Candidate<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        // seek anchor
        let at = self.find_from(self.prefix, self.cursor)?;

        // read href
        let link_start = self.find_from(HREF_OPEN, at)? + HREF_OPEN.len();
        let link_end = self.find_from("\"", link_start)?;

        // read text
        let title_start = self.find_from(">", link_end)? + 1;
        let title_end = self.find_from("<", title_start)?;

        self.cursor = link_end + 1;
        Some(Candidate {
            link: &self.html[link_start..link_end],
            title: self.html[title_start..title_end].trim(),
        })
    }
}

pub fn extract_stories(html: &str, rules: &ExtractConfig) -> Vec<Story> {
    Anchors::new(html, &rules.anchor_prefix)
        .filter(Candidate::is_headline)
        .take(rules.max_stories)
        .map(|c| Story::new(c.title, c.link))
        .collect()
}

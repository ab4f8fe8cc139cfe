//! Prompt text for each input site

use super::constants::PLACEHOLDER_PREFIX;
use crate::grammar::{InputSite, OutputStatement};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    pub text: String,
    pub site: InputSite,
    /// `true` when `text` is the generated `"Enter value N"`
    pub placeholder: bool,
}

/// One record per site, in site order.
///
/// The inline prompt wins; otherwise the nearest output statement ending
/// before the site supplies the text if its sole argument is a literal.
pub fn resolve(sites: &[InputSite], outputs: &[OutputStatement]) -> Vec<PromptRecord> {
    sites
        .iter()
        .enumerate()
        .map(|(idx, site)| {
            let preceding = outputs
                .iter()
                .filter(|out| out.span.end <= site.span.start)
                .max_by_key(|out| out.span.end);

            let found = site
                .inline_prompt
                .clone()
                .or_else(|| preceding.and_then(|out| out.literal.clone()))
                .filter(|text| !text.trim().is_empty());

            match found {
                Some(text) => PromptRecord {
                    text,
                    site: site.clone(),
                    placeholder: false,
                },
                None => {
                    debug!(site = idx + 1, "no literal prompt, using placeholder");
                    PromptRecord {
                        text: format!("{} {}", PLACEHOLDER_PREFIX, idx + 1),
                        site: site.clone(),
                        placeholder: true,
                    }
                }
            }
        })
        .collect()
}

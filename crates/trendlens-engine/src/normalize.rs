use std::collections::HashSet;

use crate::types::{Mention, Platform, RawSocialRecord, RawWebRecord, SOCIAL_SOURCE_NAME};

/// Convert raw collaborator records into mentions.
///
/// Records without text are dropped. The first occurrence of a `(platform, id)`
/// pair wins. Social records come first, then web records, each in input order.
#[must_use]
pub fn normalize(raw_social: Vec<RawSocialRecord>, raw_web: Vec<RawWebRecord>) -> Vec<Mention> {
    let mut seen: HashSet<(Platform, String)> = HashSet::new();
    let mut mentions = Vec::with_capacity(raw_social.len() + raw_web.len());

    let social = raw_social.into_iter().filter_map(social_mention);
    let web = raw_web.into_iter().filter_map(web_mention);
    for mention in social.chain(web) {
        if seen.insert((mention.platform, mention.id.clone())) {
            mentions.push(mention);
        } else {
            tracing::debug!(
                platform = %mention.platform,
                id = %mention.id,
                "dropping duplicate record"
            );
        }
    }

    mentions
}

fn social_mention(raw: RawSocialRecord) -> Option<Mention> {
    let Some(text) = raw.text else {
        tracing::debug!(platform = "social", id = %raw.id, "dropping record without text");
        return None;
    };
    let url = raw
        .author
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|author| format!("https://x.com/{author}/status/{}", raw.id));
    Some(Mention {
        id: raw.id,
        platform: Platform::Social,
        source_name: SOCIAL_SOURCE_NAME.to_string(),
        text,
        timestamp: raw.created_at,
        author: raw.author,
        url,
        sentiment: None,
    })
}

fn web_mention(raw: RawWebRecord) -> Option<Mention> {
    let Some(text) = raw.text else {
        tracing::debug!(platform = "web", id = %raw.id, "dropping record without text");
        return None;
    };
    Some(Mention {
        id: raw.id,
        platform: Platform::Web,
        source_name: raw.source_domain,
        text,
        timestamp: raw.published_at,
        author: None,
        url: raw.url,
        sentiment: None,
    })
}

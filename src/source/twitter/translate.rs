// src/source/twitter/translate.rs
//! Provider record -> canonical model. Pure and deterministic.

use crate::source::twitter::wire::{Status, TwitterQuery};
use crate::source::types::{SocialMessage, SocialQuery};

pub const SOURCE_NAME: &str = "Twitter";

/// `None` (the provider sent no `statuses` array) translates to an empty page.
pub fn translate_messages(statuses: Option<&[Status]>) -> Vec<SocialMessage> {
    let Some(statuses) = statuses else {
        return Vec::new();
    };
    statuses.iter().map(translate_status).collect()
}

pub fn translate_status(status: &Status) -> SocialMessage {
    let mut message = SocialMessage::with_timestamp(
        status.text.clone(),
        status.created_at.timestamp_millis(),
    );
    message.id = status.id;
    message.num_of_likes = status.favorite_count;
    message.num_of_shares = status.retweet_count;
    message.source = SOURCE_NAME.to_string();
    message.lang = status.lang.clone();
    message.is_share_or_retweet = status.is_retweet();
    message
}

pub fn translate_query(query: &TwitterQuery) -> SocialQuery {
    SocialQuery {
        query: query.query.clone(),
        lang: query.lang.clone(),
        count: query.count,
        max_id: query.max_id,
    }
}

/// Inverse of [`translate_query`], used by the live source before dispatch.
pub fn to_provider_query(query: &SocialQuery) -> TwitterQuery {
    TwitterQuery {
        query: query.query.clone(),
        lang: query.lang.clone(),
        count: query.count,
        max_id: query.max_id,
    }
}

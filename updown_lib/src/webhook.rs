//! Webhooks: callback URLs notified on check state changes.

use crate::error::DecodeError;
use crate::validator::Validator;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Webhook {
    pub id: String,
    pub url: String,
}

impl Webhook {
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        let v = Validator::new(value)?;
        Ok(Self {
            id: v.string("id")?,
            url: v.string("url")?,
        })
    }
}

/// Body of `POST /webhooks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOptions {
    pub url: String,
}

/// A webhook given either by id or as a previously fetched [`Webhook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookRef<'a> {
    Id(&'a str),
    Webhook(&'a Webhook),
}

impl<'a> WebhookRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            WebhookRef::Id(id) => id,
            WebhookRef::Webhook(w) => &w.id,
        }
    }
}

impl<'a> From<&'a str> for WebhookRef<'a> {
    fn from(id: &'a str) -> Self {
        WebhookRef::Id(id)
    }
}

impl<'a> From<&'a String> for WebhookRef<'a> {
    fn from(id: &'a String) -> Self {
        WebhookRef::Id(id)
    }
}

impl<'a> From<&'a Webhook> for WebhookRef<'a> {
    fn from(webhook: &'a Webhook) -> Self {
        WebhookRef::Webhook(webhook)
    }
}

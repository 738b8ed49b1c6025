//! Banner campaigns and their media.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use scoop_core::{CampaignId, MediaId};

/// A running campaign with its active banners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerCampaign {
    pub id: CampaignId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub banners: Vec<Banner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: MediaId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub image: String,
    pub position: Option<String>,
    pub url: Option<String>,
    pub target: Option<String>,
    pub sort_order: i32,
    pub is_featured: bool,
    pub status: String,
    /// Free-form key/value pairs from `media_meta`.
    pub meta: BTreeMap<String, String>,
}

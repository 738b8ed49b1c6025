//! Banner campaign queries.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use scoop_core::{BranchId, CampaignId, MediaId};

use super::RepositoryError;
use crate::models::banner::{Banner, BannerCampaign};

#[derive(Debug, sqlx::FromRow)]
struct CampaignRow {
    id: CampaignId,
    name: String,
    description: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    id: MediaId,
    campaign_id: CampaignId,
    title: Option<String>,
    description: Option<String>,
    alt_text: Option<String>,
    image: String,
    banner_position: Option<String>,
    banner_url: Option<String>,
    banner_target: Option<String>,
    sort_order: i32,
    is_featured: bool,
    status: String,
}

#[derive(Debug, sqlx::FromRow)]
struct MetaRow {
    media_id: MediaId,
    meta_key: String,
    meta_value: String,
}

/// Repository for banner database operations.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    /// Create a new banner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Campaigns running at `now`, each with its active banners and their meta.
    ///
    /// A campaign runs when it is flagged active and `start <= now <= end`.
    /// With a branch, campaigns bound to another branch are skipped; campaigns
    /// without a branch show everywhere.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn get_active_campaigns(
        &self,
        branch: Option<BranchId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BannerCampaign>, RepositoryError> {
        let campaigns = sqlx::query_as::<_, CampaignRow>(
            r"
            SELECT id, name, description, start_date, end_date, is_active, created_at, updated_at
            FROM shop.banner_campaign
            WHERE is_active
              AND start_date <= $1
              AND end_date >= $1
              AND ($2::int4 IS NULL OR branch_id IS NULL OR branch_id = $2)
            ORDER BY start_date, id
            ",
        )
        .bind(now)
        .bind(branch)
        .fetch_all(self.pool)
        .await?;

        if campaigns.is_empty() {
            return Ok(Vec::new());
        }

        let campaign_ids: Vec<i32> = campaigns.iter().map(|c| c.id.as_i32()).collect();
        let media = sqlx::query_as::<_, MediaRow>(
            r"
            SELECT id, campaign_id, title, description, alt_text, image, banner_position,
                   banner_url, banner_target, sort_order, is_featured, status
            FROM shop.media
            WHERE type = 'banner'
              AND status = 'active'
              AND campaign_id = ANY($1)
            ORDER BY sort_order ASC, is_featured DESC, id
            ",
        )
        .bind(&campaign_ids)
        .fetch_all(self.pool)
        .await?;

        let media_ids: Vec<i32> = media.iter().map(|m| m.id.as_i32()).collect();
        let meta_rows = sqlx::query_as::<_, MetaRow>(
            "SELECT media_id, meta_key, meta_value FROM shop.media_meta WHERE media_id = ANY($1)",
        )
        .bind(&media_ids)
        .fetch_all(self.pool)
        .await?;

        let mut meta: HashMap<MediaId, BTreeMap<String, String>> = HashMap::new();
        for row in meta_rows {
            meta.entry(row.media_id)
                .or_default()
                .insert(row.meta_key, row.meta_value);
        }

        let mut banners: HashMap<CampaignId, Vec<Banner>> = HashMap::new();
        for row in media {
            banners.entry(row.campaign_id).or_default().push(Banner {
                id: row.id,
                title: row.title,
                description: row.description,
                alt_text: row.alt_text,
                image: row.image,
                position: row.banner_position,
                url: row.banner_url,
                target: row.banner_target,
                sort_order: row.sort_order,
                is_featured: row.is_featured,
                status: row.status,
                meta: meta.remove(&row.id).unwrap_or_default(),
            });
        }

        Ok(campaigns
            .into_iter()
            .map(|c| BannerCampaign {
                banners: banners.remove(&c.id).unwrap_or_default(),
                id: c.id,
                name: c.name,
                description: c.description,
                start_date: c.start_date,
                end_date: c.end_date,
                is_active: c.is_active,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
            .collect())
    }
}

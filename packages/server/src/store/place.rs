use std::collections::{HashMap, HashSet};

use chrono::Utc;
use common::{FileStorage, StorageKey};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, warn};

use super::PlaceError;
use crate::config::UploadConfig;
use crate::entity::{place, place_image};
use crate::imaging::{ImageNormalizer, ImagingError, NormalizedImage};
use crate::utils::filename::{generated_filename, validate_image_filename};
use crate::utils::slug::SlugCandidates;

/// Directory prefix for image files in storage.
pub const IMAGE_PREFIX: &str = "places";

/// Insert attempts before a slug race is reported as a conflict.
const MAX_SLUG_ATTEMPTS: usize = 8;

/// Fields of a place about to be created. Already validated.
#[derive(Debug, Clone, Default)]
pub struct NewPlace {
    pub name: String,
    pub location: Option<String>,
    pub rating: Option<i32>,
    pub review: Option<String>,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub dates: String,
    pub user_id: Option<i32>,
    pub username: Option<String>,
}

/// Partial update of a place. `None` leaves the column as is, except
/// `dates`, which is always written.
#[derive(Debug, Clone, Default)]
pub struct PlaceChanges {
    pub name: Option<String>,
    pub location: Option<Option<String>>,
    pub rating: Option<Option<i32>>,
    pub review: Option<Option<String>>,
    pub pros: Option<Option<String>>,
    pub cons: Option<Option<String>>,
    pub dates: String,
}

/// An uploaded file as received.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Record store for places and their images.
///
/// Image binaries live in `files`; rows only hold their storage path. File
/// writes happen before the rows that reference them are committed, and file
/// removal happens after the rows are gone, so a committed row never points
/// at a missing file.
pub struct PlaceStore<'a, C> {
    conn: &'a C,
    files: &'a dyn FileStorage,
    normalizer: ImageNormalizer,
    upload: &'a UploadConfig,
}

impl<'a, C: ConnectionTrait + TransactionTrait> PlaceStore<'a, C> {
    pub fn new(
        conn: &'a C,
        files: &'a dyn FileStorage,
        normalizer: ImageNormalizer,
        upload: &'a UploadConfig,
    ) -> Self {
        Self {
            conn,
            files,
            normalizer,
            upload,
        }
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, PlaceError> {
        let count = place::Entity::find()
            .filter(place::Column::Slug.eq(slug))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn next_free_slug(&self, candidates: &mut SlugCandidates) -> Result<String, PlaceError> {
        for candidate in candidates.by_ref() {
            if !self.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(PlaceError::Internal("slug candidates exhausted".into()))
    }

    /// Insert a place under a fresh slug derived from its name.
    ///
    /// The unique index on `slug` catches concurrent inserts that picked the
    /// same candidate; those move on to the next candidate.
    pub async fn create(&self, fields: NewPlace) -> Result<place::Model, PlaceError> {
        let mut candidates = SlugCandidates::new(&fields.name);

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = self.next_free_slug(&mut candidates).await?;
            let now = Utc::now();
            let model = place::ActiveModel {
                slug: Set(slug.clone()),
                name: Set(fields.name.clone()),
                location: Set(fields.location.clone()),
                rating: Set(fields.rating),
                review: Set(fields.review.clone()),
                pros: Set(fields.pros.clone()),
                cons: Set(fields.cons.clone()),
                dates: Set(fields.dates.clone()),
                user_id: Set(fields.user_id),
                username: Set(fields.username.clone()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            match model.insert(self.conn).await {
                Ok(created) => return Ok(created),
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    warn!(slug = %slug, attempt, "Slug claimed concurrently, trying next candidate");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PlaceError::Conflict(
            "Could not assign a unique slug, please retry".into(),
        ))
    }

    /// Look a place up by slug, then by numeric id if the token is all digits.
    pub async fn find(&self, slug_or_id: &str) -> Result<Option<place::Model>, PlaceError> {
        let by_slug = place::Entity::find()
            .filter(place::Column::Slug.eq(slug_or_id))
            .one(self.conn)
            .await?;
        if by_slug.is_some() {
            return Ok(by_slug);
        }

        if slug_or_id.is_empty() || !slug_or_id.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }
        let Ok(id) = slug_or_id.parse::<i32>() else {
            return Ok(None);
        };
        Ok(place::Entity::find_by_id(id).one(self.conn).await?)
    }

    pub async fn get(&self, slug_or_id: &str) -> Result<place::Model, PlaceError> {
        self.find(slug_or_id)
            .await?
            .ok_or_else(|| PlaceError::NotFound(format!("Place '{slug_or_id}' not found")))
    }

    /// All places, newest first.
    pub async fn list(&self) -> Result<Vec<place::Model>, PlaceError> {
        Ok(place::Entity::find()
            .order_by_desc(place::Column::CreatedAt)
            .order_by_desc(place::Column::Id)
            .all(self.conn)
            .await?)
    }

    /// Images of one place in display order.
    pub async fn images(&self, place_id: i32) -> Result<Vec<place_image::Model>, PlaceError> {
        Ok(place_image::Entity::find()
            .filter(place_image::Column::PlaceId.eq(place_id))
            .order_by_asc(place_image::Column::Order)
            .order_by_asc(place_image::Column::Id)
            .all(self.conn)
            .await?)
    }

    /// Images of several places, grouped by place id, each group in display order.
    pub async fn images_by_place(
        &self,
        place_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<place_image::Model>>, PlaceError> {
        if place_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = place_image::Entity::find()
            .filter(place_image::Column::PlaceId.is_in(place_ids.to_vec()))
            .order_by_asc(place_image::Column::Order)
            .order_by_asc(place_image::Column::Id)
            .all(self.conn)
            .await?;

        let mut grouped: HashMap<i32, Vec<place_image::Model>> = HashMap::new();
        for row in rows {
            grouped.entry(row.place_id).or_default().push(row);
        }
        Ok(grouped)
    }

    /// Delete the listed images, then apply a partial update, in one
    /// transaction. The slug never changes.
    ///
    /// Ids of other places' images are ignored. Files of the deleted images
    /// are removed once the transaction has committed.
    pub async fn update(
        &self,
        existing: place::Model,
        changes: PlaceChanges,
        deleted_image_ids: &[i32],
    ) -> Result<(place::Model, Vec<place_image::Model>), PlaceError> {
        let place_id = existing.id;
        let mut active: place::ActiveModel = existing.into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        if let Some(rating) = changes.rating {
            active.rating = Set(rating);
        }
        if let Some(review) = changes.review {
            active.review = Set(review);
        }
        if let Some(pros) = changes.pros {
            active.pros = Set(pros);
        }
        if let Some(cons) = changes.cons {
            active.cons = Set(cons);
        }
        active.dates = Set(changes.dates);
        active.updated_at = Set(Utc::now());

        let txn = self.conn.begin().await?;
        let deleted = delete_image_rows(&txn, place_id, deleted_image_ids).await?;
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.remove_files(&deleted).await;
        Ok((updated, deleted))
    }

    /// Delete a place, its image rows, and their files.
    ///
    /// Returns how many images went with it.
    pub async fn delete(&self, existing: place::Model) -> Result<usize, PlaceError> {
        let images = self.images(existing.id).await?;

        let txn = self.conn.begin().await?;
        place_image::Entity::delete_many()
            .filter(place_image::Column::PlaceId.eq(existing.id))
            .exec(&txn)
            .await?;
        place::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        self.remove_files(&images).await;
        Ok(images.len())
    }

    /// Validate, normalize and persist a batch of images for a place.
    ///
    /// The batch is all-or-nothing: any invalid file rejects the whole batch
    /// before anything is written, and a failure while persisting removes
    /// whatever was already written. Each image's `order` is its index in
    /// the batch.
    pub async fn add_images(
        &self,
        place_id: i32,
        uploads: Vec<RawImage>,
    ) -> Result<Vec<place_image::Model>, PlaceError> {
        if uploads.is_empty() {
            return Err(PlaceError::Validation("No images provided".into()));
        }
        for upload in &uploads {
            self.check_upload(upload)?;
        }

        let normalized = self.normalize_batch(uploads).await?;

        let mut written: Vec<StorageKey> = Vec::with_capacity(normalized.len());
        for (_, image) in &normalized {
            let key = storage_key_for(image)?;
            if let Err(e) = self.files.put(&key, &image.bytes).await {
                self.discard(&written).await;
                return Err(e.into());
            }
            written.push(key);
        }

        match self.insert_image_rows(place_id, &normalized, &written).await {
            Ok(rows) => Ok(rows),
            Err(e) => {
                self.discard(&written).await;
                Err(e)
            }
        }
    }

    fn check_upload(&self, upload: &RawImage) -> Result<(), PlaceError> {
        let allowed = &self.upload.allowed_extensions;
        validate_image_filename(&upload.filename, allowed)
            .map_err(|e| PlaceError::Validation(e.message(allowed)))?;

        let limit = self.upload.max_file_size;
        if upload.bytes.len() as u64 > limit {
            return Err(PlaceError::Validation(format!(
                "File {} is too large. Maximum size is {} MB",
                upload.filename,
                limit / (1024 * 1024)
            )));
        }
        Ok(())
    }

    async fn normalize_batch(
        &self,
        uploads: Vec<RawImage>,
    ) -> Result<Vec<(String, NormalizedImage)>, PlaceError> {
        let normalizer = self.normalizer;
        tokio::task::spawn_blocking(move || {
            let mut out = Vec::with_capacity(uploads.len());
            for upload in uploads {
                match normalizer.normalize(Some(&upload.bytes), &upload.filename) {
                    Ok(Some(image)) => out.push((upload.filename, image)),
                    Ok(None) => {}
                    Err(ImagingError::Decode(detail)) => {
                        return Err(PlaceError::Validation(format!(
                            "File {} is not a valid image: {detail}",
                            upload.filename
                        )));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| PlaceError::Internal(format!("image worker failed: {e}")))?
    }

    async fn insert_image_rows(
        &self,
        place_id: i32,
        images: &[(String, NormalizedImage)],
        keys: &[StorageKey],
    ) -> Result<Vec<place_image::Model>, PlaceError> {
        let now = Utc::now();
        let txn = self.conn.begin().await?;

        let mut rows = Vec::with_capacity(images.len());
        for (order, ((filename, image), key)) in images.iter().zip(keys).enumerate() {
            let row = place_image::ActiveModel {
                place_id: Set(place_id),
                path: Set(key.to_string()),
                filename: Set(filename.clone()),
                content_type: Set(Some(image.content_type().to_string())),
                size: Set(image.bytes.len() as i64),
                width: Set(image.width as i32),
                height: Set(image.height as i32),
                order: Set(order as i32),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            rows.push(row);
        }

        txn.commit().await?;
        Ok(rows)
    }

    /// Delete one image of a place.
    pub async fn delete_image(
        &self,
        place_id: i32,
        image_id: i32,
    ) -> Result<place_image::Model, PlaceError> {
        let image = delete_image_rows(self.conn, place_id, &[image_id])
            .await?
            .pop()
            .ok_or_else(|| PlaceError::NotFound(format!("Image {image_id} not found")))?;
        self.remove_files(std::slice::from_ref(&image)).await;
        Ok(image)
    }

    /// Set `order` to each id's position in `image_ids`.
    ///
    /// Every id must belong to the place, otherwise nothing changes. Images
    /// not listed take the positions after the listed ones, so orders stay
    /// `0..n`. Returns all of the place's images in their new order.
    pub async fn reorder_images(
        &self,
        place_id: i32,
        image_ids: &[i32],
    ) -> Result<Vec<place_image::Model>, PlaceError> {
        if image_ids.is_empty() {
            return Err(PlaceError::Validation("image_ids must not be empty".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = image_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(PlaceError::Validation(format!(
                "Duplicate image id {dup} in image_ids"
            )));
        }

        let current = self.images(place_id).await?;
        let owned: HashSet<i32> = current.iter().map(|i| i.id).collect();
        let foreign: Vec<String> = image_ids
            .iter()
            .filter(|id| !owned.contains(*id))
            .map(|id| id.to_string())
            .collect();
        if !foreign.is_empty() {
            return Err(PlaceError::Validation(format!(
                "Images do not belong to this place: {}",
                foreign.join(", ")
            )));
        }

        // Unlisted images follow the listed ones, keeping their relative order.
        let listed: HashSet<i32> = image_ids.iter().copied().collect();
        let sequence: Vec<i32> = image_ids
            .iter()
            .copied()
            .chain(current.iter().map(|i| i.id).filter(|id| !listed.contains(id)))
            .collect();

        let txn = self.conn.begin().await?;
        for (position, id) in sequence.iter().enumerate() {
            place_image::Entity::update_many()
                .col_expr(place_image::Column::Order, Expr::value(position as i32))
                .filter(place_image::Column::Id.eq(*id))
                .filter(place_image::Column::PlaceId.eq(place_id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        self.images(place_id).await
    }

    /// Best-effort removal of image files whose rows are already gone.
    async fn remove_files(&self, images: &[place_image::Model]) {
        for image in images {
            match StorageKey::new(image.path.as_str()) {
                Ok(key) => match self.files.delete(&key).await {
                    Ok(true) => debug!(path = %key, "Removed image file"),
                    Ok(false) => warn!(path = %key, "Image file already missing"),
                    Err(e) => warn!(path = %key, error = %e, "Failed to remove image file"),
                },
                Err(e) => warn!(path = %image.path, error = %e, "Image row has invalid path"),
            }
        }
    }

    async fn discard(&self, keys: &[StorageKey]) {
        for key in keys {
            if let Err(e) = self.files.delete(key).await {
                warn!(path = %key, error = %e, "Failed to remove file of aborted upload");
            }
        }
    }
}

/// Delete the rows of the listed images that belong to `place_id` and return
/// them. Other ids are ignored.
async fn delete_image_rows<T: ConnectionTrait>(
    conn: &T,
    place_id: i32,
    image_ids: &[i32],
) -> Result<Vec<place_image::Model>, PlaceError> {
    if image_ids.is_empty() {
        return Ok(Vec::new());
    }

    let owned = place_image::Entity::find()
        .filter(place_image::Column::PlaceId.eq(place_id))
        .filter(place_image::Column::Id.is_in(image_ids.to_vec()))
        .all(conn)
        .await?;
    if owned.is_empty() {
        return Ok(owned);
    }

    place_image::Entity::delete_many()
        .filter(place_image::Column::Id.is_in(owned.iter().map(|i| i.id)))
        .exec(conn)
        .await?;
    Ok(owned)
}

fn storage_key_for(image: &NormalizedImage) -> Result<StorageKey, PlaceError> {
    let ext = image
        .format
        .extensions_str()
        .first()
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    StorageKey::join(IMAGE_PREFIX, &generated_filename(&ext)).map_err(Into::into)
}

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::observer::PlaceObserver;
use crate::config::StorageConfig;
use crate::entity::{place, place_image};
use crate::imaging::ImageNormalizer;
use crate::models::place::{
    CreatePlaceRequest, IdList, PlaceImageResponse, PlaceResponse, ReorderImagesRequest,
    UpdatePlaceRequest,
};
use crate::models::shared::non_blank;
use crate::state::AppState;
use crate::store::{NewPlace, PlaceChanges, PlaceError, PlaceStore, RawImage};
use crate::utils::dates::{DateLocale, format_date_range};

/// Name given to places created without one.
pub const DEFAULT_NAME: &str = "Untitled";

/// Orchestrates place operations over the record store and renders the
/// outward-facing views.
pub struct PlaceService<'a, C> {
    store: PlaceStore<'a, C>,
    observer: &'a dyn PlaceObserver,
    media: &'a StorageConfig,
    locale: DateLocale,
}

impl<'a> PlaceService<'a, DatabaseConnection> {
    pub fn from_state(state: &'a AppState) -> Self {
        let store = PlaceStore::new(
            &state.db,
            state.storage.as_ref(),
            ImageNormalizer::new(state.config.imaging.into()),
            &state.config.upload,
        );
        Self::new(
            store,
            state.observer.as_ref(),
            &state.config.storage,
            state.config.display.date_locale,
        )
    }
}

impl<'a, C: ConnectionTrait + TransactionTrait> PlaceService<'a, C> {
    pub fn new(
        store: PlaceStore<'a, C>,
        observer: &'a dyn PlaceObserver,
        media: &'a StorageConfig,
        locale: DateLocale,
    ) -> Self {
        Self {
            store,
            observer,
            media,
            locale,
        }
    }

    /// Report unexpected failures to the observer; bad input is the caller's problem.
    fn observe<T>(
        &self,
        operation: &'static str,
        result: Result<T, PlaceError>,
    ) -> Result<T, PlaceError> {
        if let Err(e) = &result
            && !e.is_client_error()
        {
            self.observer.operation_failed(operation, e);
        }
        result
    }

    pub async fn list_places(&self) -> Result<Vec<PlaceResponse>, PlaceError> {
        let result = async {
            let places = self.store.list().await?;
            let ids: Vec<i32> = places.iter().map(|p| p.id).collect();
            let mut images = self.store.images_by_place(&ids).await?;

            Ok::<_, PlaceError>(
                places
                    .into_iter()
                    .map(|p| {
                        let own = images.remove(&p.id).unwrap_or_default();
                        self.present(p, own)
                    })
                    .collect(),
            )
        }
        .await;
        self.observe("list_places", result)
    }

    pub async fn get_place(&self, slug_or_id: &str) -> Result<PlaceResponse, PlaceError> {
        let result = async {
            let place = self.store.get(slug_or_id).await?;
            let images = self.store.images(place.id).await?;
            Ok::<_, PlaceError>(self.present(place, images))
        }
        .await;
        self.observe("get_place", result)
    }

    /// Create a place. A blank name becomes [`DEFAULT_NAME`], a blank
    /// location and a zero rating become absent.
    pub async fn create_place(&self, payload: CreatePlaceRequest) -> Result<PlaceResponse, PlaceError> {
        let result = async {
            let created = self.store.create(new_place(payload)).await?;
            self.observer.place_created(&created);
            Ok::<_, PlaceError>(self.present(created, Vec::new()))
        }
        .await;
        self.observe("create_place", result)
    }

    /// Delete the requested images and apply the field changes, atomically.
    ///
    /// `deleted_image_ids` is resolved before anything changes, so a malformed
    /// list leaves the place untouched.
    pub async fn update_place(
        &self,
        slug_or_id: &str,
        payload: UpdatePlaceRequest,
    ) -> Result<PlaceResponse, PlaceError> {
        let result = async {
            let existing = self.store.get(slug_or_id).await?;

            let deleted_ids = match &payload.deleted_image_ids {
                Some(list) => resolve_ids(list, "deleted_image_ids")?,
                None => Vec::new(),
            };
            let (updated, deleted) = self
                .store
                .update(existing, changes(payload), &deleted_ids)
                .await?;
            self.observer.place_updated(&updated, &deleted);

            let images = self.store.images(updated.id).await?;
            Ok::<_, PlaceError>(self.present(updated, images))
        }
        .await;
        self.observe("update_place", result)
    }

    pub async fn delete_place(&self, slug_or_id: &str) -> Result<(), PlaceError> {
        let result = async {
            let existing = self.store.get(slug_or_id).await?;
            let image_count = self.store.delete(existing.clone()).await?;
            self.observer.place_deleted(&existing, image_count);
            Ok::<_, PlaceError>(())
        }
        .await;
        self.observe("delete_place", result)
    }

    pub async fn upload_images(
        &self,
        slug_or_id: &str,
        uploads: Vec<RawImage>,
    ) -> Result<Vec<PlaceImageResponse>, PlaceError> {
        let result = async {
            let existing = self.store.get(slug_or_id).await?;
            let images = self.store.add_images(existing.id, uploads).await?;
            self.observer.images_uploaded(&existing, &images);
            Ok::<_, PlaceError>(images.iter().map(|i| self.present_image(i)).collect())
        }
        .await;
        self.observe("upload_images", result)
    }

    pub async fn reorder_images(
        &self,
        slug_or_id: &str,
        payload: &ReorderImagesRequest,
    ) -> Result<Vec<PlaceImageResponse>, PlaceError> {
        let result = async {
            let existing = self.store.get(slug_or_id).await?;
            let ids = resolve_ids(&payload.image_ids, "image_ids")?;
            let images = self.store.reorder_images(existing.id, &ids).await?;
            self.observer.images_reordered(&existing, &ids);
            Ok::<_, PlaceError>(images.iter().map(|i| self.present_image(i)).collect())
        }
        .await;
        self.observe("reorder_images", result)
    }

    pub async fn delete_image(&self, slug_or_id: &str, image_id: i32) -> Result<(), PlaceError> {
        let result = async {
            let existing = self.store.get(slug_or_id).await?;
            let image = self.store.delete_image(existing.id, image_id).await?;
            self.observer.image_deleted(&existing, &image);
            Ok::<_, PlaceError>(())
        }
        .await;
        self.observe("delete_image", result)
    }

    /// Outward view of a place. `dates` is formatted for display; the stored
    /// value is left alone.
    pub fn present(&self, place: place::Model, images: Vec<place_image::Model>) -> PlaceResponse {
        PlaceResponse {
            id: place.id,
            slug: place.slug,
            user_id: place.user_id,
            username: place.username,
            name: place.name,
            location: place.location,
            rating: place.rating,
            review: place.review,
            pros: place.pros,
            cons: place.cons,
            dates: format_date_range(&place.dates, self.locale),
            images: images.iter().map(|i| self.present_image(i)).collect(),
            created_at: place.created_at,
            updated_at: place.updated_at,
        }
    }

    pub fn present_image(&self, image: &place_image::Model) -> PlaceImageResponse {
        PlaceImageResponse {
            id: image.id,
            order: image.order,
            image_url: self.media.url_for(&image.path),
            width: image.width,
            height: image.height,
            created_at: image.created_at,
        }
    }
}

fn resolve_ids(list: &IdList, field: &str) -> Result<Vec<i32>, PlaceError> {
    list.resolve()
        .ok_or_else(|| PlaceError::Validation(format!("{field} must be a list of integer ids")))
}

fn new_place(payload: CreatePlaceRequest) -> NewPlace {
    NewPlace {
        name: non_blank(payload.name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
        location: non_blank(payload.location),
        rating: payload.rating.filter(|r| *r != 0),
        review: payload.review,
        pros: payload.pros,
        cons: payload.cons,
        dates: payload.dates.unwrap_or_default(),
        user_id: payload.user_id,
        username: non_blank(payload.username),
    }
}

fn changes(payload: UpdatePlaceRequest) -> PlaceChanges {
    PlaceChanges {
        name: payload
            .name
            .map(|n| non_blank(Some(n)).unwrap_or_else(|| DEFAULT_NAME.to_string())),
        location: payload.location.map(non_blank),
        rating: payload.rating.map(|r| r.filter(|r| *r != 0)),
        review: payload.review,
        pros: payload.pros,
        cons: payload.cons,
        dates: payload.dates.unwrap_or_default(),
    }
}

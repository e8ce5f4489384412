use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::shared::{double_option, validate_max_chars, validate_rating};

/// Maximum length of `name` and `location`.
pub const MAX_NAME_LEN: usize = 255;

/// Request body for creating a place.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CreatePlaceRequest {
    /// Display title. Blank or absent becomes "Untitled".
    #[schema(example = "Тестовое место")]
    pub name: Option<String>,
    #[schema(example = "Tbilisi, Georgia")]
    pub location: Option<String>,
    /// 1-5. `0` or absent means no rating.
    #[schema(example = 5)]
    pub rating: Option<i32>,
    pub review: Option<String>,
    pub pros: Option<String>,
    pub cons: Option<String>,
    /// Free text, conventionally `DD.MM.YYYY – DD.MM.YYYY`.
    #[schema(example = "01.06.2024 – 05.06.2024")]
    pub dates: Option<String>,
    /// Owner attribution supplied by the caller.
    pub user_id: Option<i32>,
    pub username: Option<String>,
}

pub fn validate_create_place(payload: &CreatePlaceRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_max_chars(name, "Name", MAX_NAME_LEN)?;
    }
    if let Some(location) = &payload.location {
        validate_max_chars(location, "Location", MAX_NAME_LEN)?;
    }
    validate_rating(payload.rating)
}

/// Request body for `PUT`/`PATCH` on a place. Absent fields are left as they
/// are, except `dates`, which is reset to empty when absent.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdatePlaceRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub rating: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub review: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub pros: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cons: Option<Option<String>>,
    pub dates: Option<String>,
    /// Images of this place to delete before applying the update. Ids of
    /// other places' images are ignored.
    pub deleted_image_ids: Option<IdList>,
}

pub fn validate_update_place(payload: &UpdatePlaceRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_max_chars(name, "Name", MAX_NAME_LEN)?;
    }
    if let Some(Some(location)) = &payload.location {
        validate_max_chars(location, "Location", MAX_NAME_LEN)?;
    }
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }
    Ok(())
}

/// One id as it may arrive from a client: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

/// A list of ids in any of the accepted wire shapes.
///
/// * `[1, 2, 3]` or `["1", "2"]`
/// * `"[1, 2, 3]"` (a JSON array inside a string, as multipart forms send it)
/// * `"1,2,3"`
///
/// [`IdList::resolve`] turns every shape into a plain `Vec<i32>`.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum IdList {
    List(Vec<IdValue>),
    Text(String),
}

impl IdList {
    /// The ids in order, or `None` if any entry is not a positive integer.
    pub fn resolve(&self) -> Option<Vec<i32>> {
        match self {
            IdList::List(values) => values.iter().map(parse_id_value).collect(),
            IdList::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Some(Vec::new());
                }
                if let Ok(values) = serde_json::from_str::<Vec<IdValue>>(text) {
                    return IdList::List(values).resolve();
                }
                text.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(parse_id)
                    .collect()
            }
        }
    }
}

fn parse_id_value(value: &IdValue) -> Option<i32> {
    match value {
        IdValue::Number(n) => i32::try_from(*n).ok().filter(|n| *n > 0),
        IdValue::Text(s) => parse_id(s.trim()),
    }
}

fn parse_id(s: &str) -> Option<i32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i32>().ok().filter(|n| *n > 0)
}

/// Request body for reordering a place's images.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReorderImagesRequest {
    /// Image ids in their new display order.
    #[schema(value_type = Vec<i32>, example = json!([12, 10, 11]))]
    pub image_ids: IdList,
}

/// Response DTO for a single image of a place.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlaceImageResponse {
    #[schema(example = 10)]
    pub id: i32,
    /// 0-based display position.
    #[schema(example = 0)]
    pub order: i32,
    /// Absolute or media-relative URL of the normalized image.
    #[schema(example = "/media/places/0190a7c2e1b87c31a4f2d1d0c8e9b7a6.jpg")]
    pub image_url: String,
    #[schema(example = 1200)]
    pub width: i32,
    #[schema(example = 800)]
    pub height: i32,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for a place.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlaceResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "testovoe-mesto")]
    pub slug: String,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    #[schema(example = "Тестовое место")]
    pub name: String,
    pub location: Option<String>,
    pub rating: Option<i32>,
    pub review: Option<String>,
    pub pros: Option<String>,
    pub cons: Option<String>,
    /// Display form of the stored range; unparseable values are returned as stored.
    #[schema(example = "1–5 Jun 2024")]
    pub dates: String,
    /// Images in display order.
    pub images: Vec<PlaceImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(json: &str) -> Option<Vec<i32>> {
        serde_json::from_str::<IdList>(json).unwrap().resolve()
    }

    #[test]
    fn resolves_every_wire_shape() {
        assert_eq!(ids("[1, 2, 3]").unwrap(), vec![1, 2, 3]);
        assert_eq!(ids(r#"["1", "2", 3]"#).unwrap(), vec![1, 2, 3]);
        assert_eq!(ids(r#""[4,5]""#).unwrap(), vec![4, 5]);
        assert_eq!(ids(r#""1,2,3""#).unwrap(), vec![1, 2, 3]);
        assert_eq!(ids(r#"" 7 , 8 ,""#).unwrap(), vec![7, 8]);
        assert_eq!(ids(r#""42""#).unwrap(), vec![42]);
    }

    #[test]
    fn empty_forms_resolve_to_nothing() {
        assert!(ids("[]").unwrap().is_empty());
        assert!(ids(r#""""#).unwrap().is_empty());
        assert!(ids(r#""  ""#).unwrap().is_empty());
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        assert_eq!(ids(r#""1,abc""#), None);
        assert_eq!(ids(r#""-1""#), None);
        assert_eq!(ids(r#"["x"]"#), None);
        assert_eq!(ids("[0]"), None);
        assert_eq!(ids("[99999999999]"), None);
    }

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let req: UpdatePlaceRequest =
            serde_json::from_str(r#"{"location": null, "deleted_image_ids": "1,2"}"#).unwrap();
        assert_eq!(req.location, Some(None));
        assert_eq!(req.rating, None);
        assert_eq!(req.dates, None);
        assert_eq!(
            req.deleted_image_ids.unwrap().resolve().unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn reorder_request_accepts_list_or_string() {
        let req: ReorderImagesRequest = serde_json::from_str(r#"{"image_ids": [3, 1, 2]}"#).unwrap();
        assert_eq!(req.image_ids.resolve().unwrap(), vec![3, 1, 2]);

        let req: ReorderImagesRequest = serde_json::from_str(r#"{"image_ids": "3,1"}"#).unwrap();
        assert_eq!(req.image_ids.resolve().unwrap(), vec![3, 1]);
    }

    #[test]
    fn create_validation() {
        let ok = CreatePlaceRequest {
            name: Some("Hotel".into()),
            rating: Some(0),
            ..Default::default()
        };
        assert!(validate_create_place(&ok).is_ok());

        let long = CreatePlaceRequest {
            name: Some("x".repeat(256)),
            ..Default::default()
        };
        assert!(validate_create_place(&long).is_err());

        let bad_rating = CreatePlaceRequest {
            rating: Some(7),
            ..Default::default()
        };
        assert!(validate_create_place(&bad_rating).is_err());
    }
}

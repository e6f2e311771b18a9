//! Typed view of the multipart event submission.
//!
//! Every expected field is named here and required; unknown fields are
//! rejected. The whole form is validated at this one boundary before any
//! side effect, so a malformed submission can never reach the asset host
//! or the datastore.

use axum::extract::Multipart;

use crate::assets::ImageUpload;
use crate::models::EventMode;
use crate::utils::error::AppError;

#[derive(Debug)]
pub struct CreateEventForm {
    pub title: String,
    pub description: String,
    pub overview: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub location: String,
    pub mode: EventMode,
    pub audience: String,
    pub organizer: String,
    pub tags: Vec<String>,
    pub agenda: Vec<String>,
    pub image: ImageUpload,
}

#[derive(Default)]
struct RawForm {
    title: Option<String>,
    description: Option<String>,
    overview: Option<String>,
    date: Option<String>,
    time: Option<String>,
    venue: Option<String>,
    location: Option<String>,
    mode: Option<String>,
    audience: Option<String>,
    organizer: Option<String>,
    tags: Option<String>,
    agenda: Option<String>,
    image: Option<ImageUpload>,
}

impl CreateEventForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut raw = RawForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => raw.title = Some(field.text().await?),
                "description" => raw.description = Some(field.text().await?),
                "overview" => raw.overview = Some(field.text().await?),
                "date" => raw.date = Some(field.text().await?),
                "time" => raw.time = Some(field.text().await?),
                "venue" => raw.venue = Some(field.text().await?),
                "location" => raw.location = Some(field.text().await?),
                "mode" => raw.mode = Some(field.text().await?),
                "audience" => raw.audience = Some(field.text().await?),
                "organizer" => raw.organizer = Some(field.text().await?),
                "tags" => raw.tags = Some(field.text().await?),
                "agenda" => raw.agenda = Some(field.text().await?),
                "image" => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?.to_vec();
                    raw.image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes,
                    });
                }
                other => {
                    return Err(AppError::Validation(format!(
                        "Unexpected field '{other}'"
                    )))
                }
            }
        }

        // The image is checked first, before the record takes shape.
        let image = raw
            .image
            .ok_or_else(|| AppError::Validation("Image file is required".to_string()))?;

        let mode_raw = required(raw.mode, "mode")?;
        let mode = EventMode::parse(&mode_raw).ok_or_else(|| {
            AppError::Validation("Field 'mode' must be one of online, offline, hybrid".to_string())
        })?;

        Ok(Self {
            title: required(raw.title, "title")?,
            description: required(raw.description, "description")?,
            overview: required(raw.overview, "overview")?,
            date: required(raw.date, "date")?,
            time: required(raw.time, "time")?,
            venue: required(raw.venue, "venue")?,
            location: required(raw.location, "location")?,
            mode,
            audience: required(raw.audience, "audience")?,
            organizer: required(raw.organizer, "organizer")?,
            tags: string_array(raw.tags, "tags")?,
            agenda: string_array(raw.agenda, "agenda")?,
            image,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    let value = value
        .ok_or_else(|| AppError::Validation(format!("Missing required field '{name}'")))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!(
            "Field '{name}' must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn string_array(raw: Option<String>, name: &str) -> Result<Vec<String>, AppError> {
    let raw = raw.ok_or_else(|| AppError::Validation(format!("Missing required field '{name}'")))?;
    serde_json::from_str(&raw).map_err(|_| {
        AppError::Validation(format!("Field '{name}' must be a JSON array of strings"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required(Some("  Rust Meetup ".into()), "title").unwrap(), "Rust Meetup");
        assert!(required(Some("   ".into()), "title").is_err());
        assert!(required(None, "title").is_err());
    }

    #[test]
    fn string_array_parses_json_arrays_only() {
        assert_eq!(
            string_array(Some(r#"["rust","axum"]"#.into()), "tags").unwrap(),
            vec!["rust".to_string(), "axum".to_string()]
        );

        let err = string_array(Some("rust,axum".into()), "tags").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = string_array(Some(r#"{"a":1}"#.into()), "tags").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

use std::{borrow::Cow, collections::HashMap};

use axum::extract::Multipart;
use validator::{ValidationError, ValidationErrors};

use crate::{AppResult, media::Upload, res::escape};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Trims a submitted value; blank means absent.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub fn add_error(errors: &mut ValidationErrors, field: &'static str, message: &'static str) {
    let mut error = ValidationError::new("invalid");
    error.message = Some(Cow::Borrowed(message));
    errors.add(field, error);
}

pub fn messages(errors: &ValidationErrors, field: &str) -> Vec<String> {
    errors
        .field_errors()
        .get(field)
        .map(|errors| {
            errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The field's messages as an HTML list, or nothing.
pub fn error_list(errors: Option<&ValidationErrors>, field: &str) -> String {
    let Some(errors) = errors else {
        return String::new();
    };
    let items: String = messages(errors, field)
        .iter()
        .map(|message| format!("<li>{}</li>", escape(message)))
        .collect();
    if items.is_empty() {
        return items;
    }
    format!("<ul class=\"errors\">{items}</ul>")
}

/// Text fields and file parts of a `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Drains the body. A file input left empty by the browser does not
    /// count as an upload.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_owned) {
                let bytes = field.bytes().await?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.insert(name, Upload { file_name, bytes: bytes.to_vec() });
            } else {
                form.fields.insert(name, field.text().await?);
            }
        }

        Ok(form)
    }

    pub fn text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    pub fn file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

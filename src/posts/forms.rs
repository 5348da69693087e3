use serde::Deserialize;
use sqlx::SqliteExecutor;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    AppResult, db,
    forms::{INVALID_CHOICE, INVALID_IMAGE, MultipartForm, add_error, clean, error_list},
    include_res,
    media::{ImageUpload, Upload},
    res::escape,
};

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct CommentForm {
    #[validate(required(message = "This field is required."))]
    pub(crate) text: Option<String>,
}

impl CommentForm {
    pub(crate) fn cleaned(self) -> Self {
        Self { text: clean(self.text) }
    }
}

/// Text, group and image of a post as submitted.
#[derive(Debug, Default, Validate)]
pub(crate) struct PostForm {
    #[validate(required(message = "This field is required."))]
    pub(crate) text: Option<String>,
    pub(crate) group: Option<String>,
    pub(crate) image: Option<Upload>,
}

/// A post submission that passed every check.
pub(crate) struct CleanPost {
    pub(crate) text: String,
    pub(crate) group_id: Option<Uuid>,
    pub(crate) image: Option<ImageUpload>,
}

impl PostForm {
    pub(crate) fn from_multipart(mut form: MultipartForm) -> Self {
        Self {
            text: clean(form.text("text")),
            group: clean(form.text("group")),
            image: form.file("image"),
        }
    }

    /// Field rules plus the checks that need data: the group must exist and
    /// the image must decode.
    pub(crate) async fn check<'e, E: SqliteExecutor<'e>>(
        &self,
        db: E,
    ) -> AppResult<Result<CleanPost, ValidationErrors>> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        let group_id = match self.group.as_deref() {
            None => None,
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(group_id) if db::groups::get(db, group_id).await?.is_some() => Some(group_id),
                _ => {
                    add_error(&mut errors, "group", INVALID_CHOICE);
                    None
                }
            },
        };

        let image = match self.image.clone().map(Upload::into_image) {
            None => None,
            Some(Ok(image)) => Some(image),
            Some(Err(err)) => {
                tracing::debug!(%err, "rejected post image");
                add_error(&mut errors, "image", INVALID_IMAGE);
                None
            }
        };

        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        Ok(Ok(CleanPost {
            text: self.text.clone().unwrap_or_default(),
            group_id,
            image,
        }))
    }
}

/// What the create/edit page shows around the form.
pub(crate) struct PostFormPage<'a> {
    pub(crate) heading: &'a str,
    pub(crate) action: &'a str,
    pub(crate) button: &'a str,
}

pub(crate) fn render_post_form(
    page: &PostFormPage<'_>,
    text: &str,
    selected_group: Option<&str>,
    groups: &[db::Group],
    errors: Option<&ValidationErrors>,
) -> String {
    let group_options: String = groups
        .iter()
        .map(|group| {
            let id = group.id.to_string();
            let selected = if selected_group == Some(id.as_str()) { " selected" } else { "" };
            format!("<option value=\"{id}\"{selected}>{}</option>", escape(&group.title))
        })
        .collect();

    include_res!(str, "/pages/posts/create_post.html")
        .replace("{heading}", page.heading)
        .replace("{action}", page.action)
        .replace("{button}", page.button)
        .replace("{text_errors}", &error_list(errors, "text"))
        .replace("{group_errors}", &error_list(errors, "group"))
        .replace("{image_errors}", &error_list(errors, "image"))
        .replace("{group_options}", &group_options)
        .replace("{text}", &escape(text))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct GroupForm {
    #[validate(
        required(message = "This field is required."),
        length(max = 200, message = "Ensure this value has at most 200 characters.")
    )]
    pub(crate) title: Option<String>,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub(crate) slug: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub(crate) description: Option<String>,
}

impl GroupForm {
    pub(crate) fn cleaned(self) -> Self {
        Self {
            title: clean(self.title),
            slug: clean(self.slug),
            description: clean(self.description),
        }
    }

    pub(crate) fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        if let Some(slug) = &self.slug {
            let url_safe = slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
            if !url_safe {
                add_error(
                    &mut errors,
                    "slug",
                    "Enter a valid slug of lowercase letters, numbers, underscores or hyphens.",
                );
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

pub(crate) fn render_group_form(form: &GroupForm, errors: Option<&ValidationErrors>) -> String {
    include_res!(str, "/pages/posts/group_new.html")
        .replace("{title_errors}", &error_list(errors, "title"))
        .replace("{slug_errors}", &error_list(errors, "slug"))
        .replace("{description_errors}", &error_list(errors, "description"))
        .replace("{title}", &escape(form.title.as_deref().unwrap_or_default()))
        .replace("{slug}", &escape(form.slug.as_deref().unwrap_or_default()))
        .replace("{description}", &escape(form.description.as_deref().unwrap_or_default()))
}

/// Avatar upload; an empty submission is allowed and keeps what is stored.
#[derive(Debug, Default)]
pub(crate) struct ProfileForm {
    pub(crate) avatar: Option<Upload>,
}

impl ProfileForm {
    pub(crate) fn from_multipart(mut form: MultipartForm) -> Self {
        Self { avatar: form.file("avatar") }
    }

    pub(crate) fn check(self) -> Result<Option<ImageUpload>, ValidationErrors> {
        match self.avatar.map(Upload::into_image) {
            None => Ok(None),
            Some(Ok(image)) => Ok(Some(image)),
            Some(Err(err)) => {
                tracing::debug!(%err, "rejected avatar");
                let mut errors = ValidationErrors::new();
                add_error(&mut errors, "avatar", INVALID_IMAGE);
                Err(errors)
            }
        }
    }
}

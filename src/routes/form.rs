use axum::extract::{
    Multipart,
    multipart::{Field, MultipartError},
};

use crate::{
    dto::{items::ItemForm, profile::ProfileForm},
    error::{AppError, AppResult},
    media::Upload,
};

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(bad_multipart)
}

/// A file input submitted without choosing a file arrives with an empty name; treat it as absent.
async fn upload(field: Field<'_>) -> AppResult<Option<Upload>> {
    let file_name = match field.file_name().filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => return Ok(None),
    };
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(bad_multipart)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(Upload {
        file_name,
        content_type,
        bytes,
    }))
}

pub fn parse_flag(raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" => Ok(false),
        other => Err(AppError::BadRequest(format!("Invalid flag value {other:?}"))),
    }
}

pub async fn read_item_form(mut multipart: Multipart) -> AppResult<ItemForm> {
    let mut form = ItemForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = Some(text(field).await?),
            "description" => form.description = Some(text(field).await?),
            "price" => form.price = Some(text(field).await?),
            "condition" => form.condition = Some(text(field).await?),
            "payment_options" => {
                let option = text(field).await?;
                let options = form.payment_options.get_or_insert_with(Vec::new);
                let option = option.trim();
                if !option.is_empty() && !options.iter().any(|o| o == option) {
                    options.push(option.to_string());
                }
            }
            "live_on_market" => form.live_on_market = Some(parse_flag(&text(field).await?)?),
            "image_file" => form.image = upload(field).await?,
            _ => {}
        }
    }
    Ok(form)
}

pub async fn read_profile_form(mut multipart: Multipart) -> AppResult<ProfileForm> {
    let mut form = ProfileForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "profile_description" => form.profile_description = Some(text(field).await?),
            "avatar" => form.avatar = upload(field).await?,
            _ => {}
        }
    }
    Ok(form)
}

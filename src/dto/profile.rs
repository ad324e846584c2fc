use utoipa::ToSchema;

use crate::media::Upload;

#[derive(Debug, Default)]
pub struct ProfileForm {
    pub profile_description: Option<String>,
    pub avatar: Option<Upload>,
}

/// Multipart layout of [`ProfileForm`] for the API docs.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ProfileMultipart {
    pub profile_description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub avatar: Option<Vec<u8>>,
}

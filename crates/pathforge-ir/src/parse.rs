use crate::types::ClassInfo;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("class metadata has no class name")]
    MissingClassName,
}

/// Decode the static-analysis `ClassInfo` record handed to the search core.
pub fn parse_class_info(json: &str) -> Result<ClassInfo, ParseError> {
    let info: ClassInfo = serde_json::from_str(json)?;
    if info.class_name.trim().is_empty() {
        return Err(ParseError::MissingClassName);
    }
    Ok(info)
}

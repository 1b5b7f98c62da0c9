use std::str;

use rust_embed::RustEmbed;

use crate::error::{ConfigResult, ErrorExt};

#[derive(RustEmbed)]
#[folder = "fixtures/"]
pub struct Fixtures;

pub const REFERENCE_DOCUMENT: &str = "config.yaml";

/// The reference machine configuration shipped with the crate.
pub fn reference_document() -> ConfigResult<String> {
    let data = Fixtures::get(REFERENCE_DOCUMENT)
        .ok_or_else(|| String::from("Could not load reference config."))?;
    str::from_utf8(&data)
        .map(|text| text.to_owned())
        .prefix("Reference config is not UTF-8")
}

//! Image metadata. Pixels are decoded only to validate the file; no
//! content analysis is attempted.

use image::ColorType;

use super::{ImageInsight, ImagePayload};
use crate::config::ParsingConfig;
use crate::error::ParseError;

const DESCRIPTION: &str = "Image content analysis not available; metadata only";

pub fn parse(bytes: &[u8], config: &ParsingConfig) -> Result<ImagePayload, ParseError> {
    let format = image::guess_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;
    let (width, height) = (img.width(), img.height());

    Ok(ImagePayload {
        width,
        height,
        color_mode: color_mode(img.color()),
        format: Some(format!("{:?}", format).to_uppercase()),
        possibly_chart: width > config.chart_min_dimension && height > config.chart_min_dimension,
        insights: ImageInsight {
            description: DESCRIPTION.to_string(),
        },
    })
}

fn color_mode(color: ColorType) -> String {
    match color {
        ColorType::L8 | ColorType::L16 => "L".to_string(),
        ColorType::La8 | ColorType::La16 => "LA".to_string(),
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB".to_string(),
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA".to_string(),
        other => format!("{:?}", other),
    }
}

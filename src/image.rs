use ::image::{ImageError, ImageFormat};

/// An upload whose bytes decoded as a raster image.
#[derive(Clone, Debug)]
pub struct ValidImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub extension: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ImageCheckError {
    NotAnImage,
    Corrupted,
}

/// Accepts `data` only if the whole file decodes as an image with non-zero dimensions.
/// A readable header over a truncated or garbage body is rejected.
pub fn check_image(data: Vec<u8>) -> Result<ValidImage, ImageCheckError> {
    let format = ::image::guess_format(&data).map_err(map_error)?;
    let extension = extension_for(format).ok_or(ImageCheckError::NotAnImage)?;
    let decoded = ::image::load_from_memory_with_format(&data, format).map_err(map_error)?;

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(ImageCheckError::Corrupted);
    }

    Ok(ValidImage {
        width: decoded.width(),
        height: decoded.height(),
        data,
        extension,
    })
}

fn map_error(err: ImageError) -> ImageCheckError {
    match err {
        ImageError::Unsupported(_) => ImageCheckError::NotAnImage,
        _ => ImageCheckError::Corrupted,
    }
}

fn extension_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Bmp => Some("bmp"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::Ico => Some("ico"),
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::Tiff => Some("tiff"),
        ImageFormat::WebP => Some("webp"),
        _ => None,
    }
}

use std::{collections::HashMap, io::Cursor, sync::Arc};

use image::{
    imageops::FilterType, DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader,
};
use log::{debug, warn};

use crate::{
    asset::texture::{
        SamplerAsset, TextureAsset, TextureAssetFormat, TextureMagFilter, TextureMinFilter,
        TextureMipmapFilter, TextureWrappingMode,
    },
    loader::ParseOptions,
};

use super::{
    buffer::{buffer_view_bytes, ImageSource},
    document::{self, Document},
};

/// Whether `n` has exactly one bit set.
pub fn is_power_of_2(n: u32) -> bool {
    n.is_power_of_two()
}

/// The power of two closest to `n` on a logarithmic scale.
pub fn nearest_pow2(n: u32) -> u32 {
    if n == 0 {
        return 1;
    }
    let exponent = (n as f64).log2().round().min(31.0);
    1 << exponent as u32
}

fn wrapping_mode(code: Option<u32>) -> TextureWrappingMode {
    match code {
        Some(33071) => TextureWrappingMode::ClampToEdge,
        Some(33648) => TextureWrappingMode::MirroredRepeat,
        Some(10497) | None => TextureWrappingMode::Repeat,
        Some(code) => {
            warn!("Unknown texture wrapping mode {}", code);
            TextureWrappingMode::Repeat
        }
    }
}

pub(crate) fn load_sampler(sampler: Option<&document::Sampler>) -> SamplerAsset {
    let Some(sampler) = sampler else {
        return SamplerAsset::default();
    };
    let mag_filter = match sampler.mag_filter {
        Some(9728) => TextureMagFilter::Nearest,
        _ => TextureMagFilter::Linear,
    };
    let (min_filter, mipmap_filter) = match sampler.min_filter {
        Some(9728) => (TextureMinFilter::Nearest, None),
        Some(9984) => (TextureMinFilter::Nearest, Some(TextureMipmapFilter::Nearest)),
        Some(9985) => (TextureMinFilter::Linear, Some(TextureMipmapFilter::Nearest)),
        Some(9986) => (TextureMinFilter::Nearest, Some(TextureMipmapFilter::Linear)),
        Some(9987) => (TextureMinFilter::Linear, Some(TextureMipmapFilter::Linear)),
        _ => (TextureMinFilter::Linear, None),
    };
    SamplerAsset {
        mag_filter,
        min_filter,
        mipmap_filter,
        wrap_x: wrapping_mode(sampler.wrap_s),
        wrap_y: wrapping_mode(sampler.wrap_t),
    }
}

fn decode_image(data: &[u8], mime: Option<&str>) -> Result<DynamicImage, ImageError> {
    let mut reader = ImageReader::new(Cursor::new(data));
    match mime.and_then(ImageFormat::from_mime_type) {
        Some(format) => reader.set_format(format),
        None => reader = reader.with_guessed_format()?,
    }
    reader.decode()
}

fn to_le_bytes(data: Vec<u16>) -> Vec<u8> {
    data.into_iter().flat_map(u16::to_le_bytes).collect()
}

fn image_data(image: DynamicImage) -> ((u32, u32), TextureAssetFormat, Vec<u8>) {
    let dimensions = image.dimensions();
    let (format, data) = match image {
        DynamicImage::ImageLuma8(image) => (TextureAssetFormat::Ru8, image.into_vec()),
        DynamicImage::ImageLumaA8(image) => (TextureAssetFormat::Rgu8, image.into_vec()),
        DynamicImage::ImageRgb8(image) => (TextureAssetFormat::Rgbu8, image.into_vec()),
        DynamicImage::ImageRgba8(image) => (TextureAssetFormat::Rgbau8, image.into_vec()),
        DynamicImage::ImageLuma16(image) => (TextureAssetFormat::Ru16, to_le_bytes(image.into_vec())),
        DynamicImage::ImageLumaA16(image) => {
            (TextureAssetFormat::Rgu16, to_le_bytes(image.into_vec()))
        }
        DynamicImage::ImageRgb16(image) => {
            (TextureAssetFormat::Rgbu16, to_le_bytes(image.into_vec()))
        }
        DynamicImage::ImageRgba16(image) => {
            (TextureAssetFormat::Rgbau16, to_le_bytes(image.into_vec()))
        }
        image => (TextureAssetFormat::Rgbau8, image.into_rgba8().into_vec()),
    };
    (dimensions, format, data)
}

/// Decodes the images of a document and pairs them with samplers.
pub(crate) struct TextureTranslator<'a> {
    document: &'a Document,
    buffers: &'a [Vec<u8>],
    images: &'a [ImageSource],
    options: &'a ParseOptions,
    image_cache: HashMap<usize, Option<DynamicImage>>,
}

impl<'a> TextureTranslator<'a> {
    pub(crate) fn new(
        document: &'a Document,
        buffers: &'a [Vec<u8>],
        images: &'a [ImageSource],
        options: &'a ParseOptions,
    ) -> Self {
        Self {
            document,
            buffers,
            images,
            options,
            image_cache: HashMap::new(),
        }
    }

    fn load_image(&self, index: usize) -> Option<DynamicImage> {
        let (data, mime) = match self.images.get(index)? {
            ImageSource::Bytes { data, mime } => (data.as_slice(), mime.as_deref()),
            ImageSource::View { view, mime } => {
                let Some(data) = buffer_view_bytes(self.document, self.buffers, *view) else {
                    warn!("Buffer view #{} of image #{} is out of bounds", view, index);
                    return None;
                };
                (data, mime.as_deref())
            }
            ImageSource::Missing => return None,
        };
        match decode_image(data, mime) {
            Ok(image) => Some(image),
            Err(error) => {
                warn!("Failed to decode image #{}: {}", index, error);
                None
            }
        }
    }

    fn image(&mut self, index: usize) -> Option<DynamicImage> {
        if !self.image_cache.contains_key(&index) {
            let image = self.load_image(index);
            self.image_cache.insert(index, image);
        }
        self.image_cache.get(&index).cloned().flatten()
    }

    /// Texture `index`, `None` when its image is missing or undecodable.
    pub(crate) fn load_texture(&mut self, index: usize) -> Option<Arc<TextureAsset>> {
        let texture = self.document.textures.get(index)?;
        let Some(source) = texture.source else {
            warn!("Texture #{} has no image source", index);
            return None;
        };
        let sampler = load_sampler(
            texture
                .sampler
                .and_then(|sampler| self.document.samplers.get(sampler)),
        );
        let mut image = self.image(source)?;

        let (width, height) = image.dimensions();
        if self.options.resize_npot_textures
            && sampler.requires_power_of_2()
            && !(is_power_of_2(width) && is_power_of_2(height))
        {
            let (new_width, new_height) = (nearest_pow2(width), nearest_pow2(height));
            debug!(
                "Resizing texture #{} from {}x{} to {}x{}",
                index, width, height, new_width, new_height
            );
            image = image.resize_exact(new_width, new_height, FilterType::Triangle);
        }

        let (size, format, data) = image_data(image);
        Some(Arc::new(TextureAsset {
            index,
            name: texture.name.clone(),
            size,
            format,
            data,
            sampler,
        }))
    }

    pub(crate) fn load_textures(&mut self) -> Vec<Option<Arc<TextureAsset>>> {
        (0..self.document.textures.len())
            .map(|index| self.load_texture(index))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use image::{ImageBuffer, Rgb};
    use serde_json::json;

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = ImageBuffer::from_pixel(width, height, Rgb([255u8, 0, 0]));
        let mut data = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
            .unwrap();
        data
    }

    #[test]
    fn test_power_of_2() {
        assert!(is_power_of_2(1));
        assert!(is_power_of_2(64));
        assert!(!is_power_of_2(0));
        assert!(!is_power_of_2(30));
        assert_eq!(nearest_pow2(30), 32);
        assert_eq!(nearest_pow2(64), 64);
        assert_eq!(nearest_pow2(40), 32);
        assert_eq!(nearest_pow2(0), 1);
        assert!(is_power_of_2(nearest_pow2(1000)));
    }

    #[test]
    fn test_sampler() {
        let sampler: document::Sampler = serde_json::from_value(json!({
            "magFilter": 9728,
            "minFilter": 9987,
            "wrapS": 33071,
            "wrapT": 33648
        }))
        .unwrap();
        let sampler = load_sampler(Some(&sampler));
        assert_eq!(sampler.mag_filter, TextureMagFilter::Nearest);
        assert_eq!(sampler.min_filter, TextureMinFilter::Linear);
        assert_eq!(sampler.mipmap_filter, Some(TextureMipmapFilter::Linear));
        assert_eq!(sampler.wrap_x, TextureWrappingMode::ClampToEdge);
        assert_eq!(sampler.wrap_y, TextureWrappingMode::MirroredRepeat);
        assert_eq!(load_sampler(None), SamplerAsset::default());
    }

    #[test]
    fn test_load_textures() {
        let document: Document = serde_json::from_value(json!({
            "images": [{"mimeType": "image/png"}, {}],
            "samplers": [{"wrapS": 33071, "wrapT": 33071}],
            "textures": [
                {"source": 0},
                {"source": 0, "sampler": 0},
                {"source": 1},
                {}
            ]
        }))
        .unwrap();
        let images = vec![
            ImageSource::Bytes {
                data: png(3, 5),
                mime: Some("image/png".to_string()),
            },
            ImageSource::Bytes {
                data: vec![1, 2, 3],
                mime: None,
            },
        ];
        let options = ParseOptions {
            resize_npot_textures: true,
            ..Default::default()
        };
        let textures = TextureTranslator::new(&document, &[], &images, &options).load_textures();
        assert_eq!(textures.len(), 4);

        // Repeat wrapping needs power of two sizes
        let resized = textures[0].as_ref().unwrap();
        assert_eq!(resized.size, (4, 4));
        assert_eq!(resized.format, TextureAssetFormat::Rgbu8);
        assert_eq!(resized.data.len(), 4 * 4 * 3);

        let clamped = textures[1].as_ref().unwrap();
        assert_eq!(clamped.size, (3, 5));
        assert!(textures[2].is_none());
        assert!(textures[3].is_none());
    }
}

use std::error::Error;

use futures::future::join_all;
use log::{debug, warn};

use crate::loader::{source::ResourceFetcher, BufferPolicy};

use super::{
    document::{Buffer, Document, Image},
    error::ParseError,
    scheme::Scheme,
};

/// Encoded image bytes, or where to find them once buffers are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ImageSource {
    Bytes { data: Vec<u8>, mime: Option<String> },
    View { view: usize, mime: Option<String> },
    Missing,
}

async fn resolve_buffer<F: ResourceFetcher>(
    index: usize,
    buffer: &Buffer,
    bin: Option<&[u8]>,
    fetcher: &F,
) -> Result<Vec<u8>, ParseError> {
    let Some(uri) = &buffer.uri else {
        // Only the first buffer may point at the GLB binary chunk
        return match bin {
            Some(bin) if index == 0 => Ok(bin.to_vec()),
            _ => Err(ParseError::Fetch {
                index,
                uri: String::new(),
                source: "buffer has no URI and no GLB binary chunk".into(),
            }),
        };
    };
    let scheme =
        Scheme::try_from(uri.as_str()).map_err(|source| ParseError::Scheme { index, source })?;
    match scheme {
        Scheme::Data(_, data) => Ok(data),
        Scheme::Relative(path) | Scheme::Absolute(path) => {
            fetcher
                .fetch(&path)
                .await
                .map_err(|source| ParseError::Fetch {
                    index,
                    uri: uri.clone(),
                    source: Box::new(source) as Box<dyn Error + Send + Sync>,
                })
        }
    }
}

/// Resolve every buffer of `document` concurrently.
///
/// Under [`BufferPolicy::Lenient`] a buffer that cannot be resolved becomes
/// empty, so accessors into it decode to nothing.
pub(crate) async fn resolve_buffers<F: ResourceFetcher>(
    document: &Document,
    bin: Option<&[u8]>,
    fetcher: &F,
    policy: BufferPolicy,
) -> Result<Vec<Vec<u8>>, ParseError> {
    let results = join_all(
        document
            .buffers
            .iter()
            .enumerate()
            .map(|(index, buffer)| resolve_buffer(index, buffer, bin, fetcher)),
    )
    .await;

    let mut buffers = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        let data = match result {
            Ok(data) => data,
            Err(error) if policy == BufferPolicy::Lenient => {
                warn!("Skipping buffer #{}: {}", index, error);
                Vec::new()
            }
            Err(error) => return Err(error),
        };
        let declared = document.buffers[index].byte_length;
        if data.len() < declared {
            warn!(
                "Buffer #{} has {} bytes, but {} are declared",
                index,
                data.len(),
                declared
            );
        }
        debug!("Resolved buffer #{} ({} bytes)", index, data.len());
        buffers.push(data);
    }
    Ok(buffers)
}

async fn resolve_image<F: ResourceFetcher>(index: usize, image: &Image, fetcher: &F) -> ImageSource {
    let mime = image.mime_type.clone();
    if let Some(uri) = &image.uri {
        let scheme = match Scheme::try_from(uri.as_str()) {
            Ok(scheme) => scheme,
            Err(error) => {
                warn!("Bad URI of image #{}: {}", index, error);
                return ImageSource::Missing;
            }
        };
        match scheme {
            Scheme::Data(data_mime, data) => ImageSource::Bytes {
                data,
                mime: data_mime.map(str::to_string).or(mime),
            },
            Scheme::Relative(path) | Scheme::Absolute(path) => match fetcher.fetch(&path).await {
                Ok(data) => ImageSource::Bytes { data, mime },
                Err(error) => {
                    warn!("Failed to fetch image #{} from {}: {}", index, uri, error);
                    ImageSource::Missing
                }
            },
        }
    } else if let Some(view) = image.buffer_view {
        ImageSource::View { view, mime }
    } else {
        warn!("Image #{} has neither a URI nor a buffer view", index);
        ImageSource::Missing
    }
}

/// Fetch external images concurrently. Embedded images are only located;
/// their bytes are read after buffers are resolved.
pub(crate) async fn resolve_images<F: ResourceFetcher>(
    document: &Document,
    fetcher: &F,
) -> Vec<ImageSource> {
    join_all(
        document
            .images
            .iter()
            .enumerate()
            .map(|(index, image)| resolve_image(index, image, fetcher)),
    )
    .await
}

/// Bytes of buffer view `view`, `None` when it is out of bounds.
pub(crate) fn buffer_view_bytes<'a>(
    document: &Document,
    buffers: &'a [Vec<u8>],
    view: usize,
) -> Option<&'a [u8]> {
    let view = document.buffer_views.get(view)?;
    let buffer = buffers.get(view.buffer)?;
    let end = view.byte_offset.checked_add(view.byte_length)?;
    buffer.get(view.byte_offset..end)
}

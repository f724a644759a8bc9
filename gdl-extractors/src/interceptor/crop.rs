//! On-the-fly cropping of sprite images.
//!
//! Index thumbnails are often served as one sprite sheet per page. A request for a single
//! thumbnail carries the rectangle it wants in the URL fragment (`...sprite.jpg#left,top,right,bottom`);
//! the fragment never reaches the server, and this interceptor cuts the rectangle out of the
//! returned sheet.
use super::Interceptor;
use crate::{error::ExtractorError, transport::RawResponse};
use image::error::{LimitError, LimitErrorKind};
use image::{DynamicImage, GenericImage, GenericImageView};
use log::{debug, warn};
use std::fmt::Display;
use std::io::Cursor;
use std::str::FromStr;
use url::Url;

/// How much bigger than its source a cropped image may get.
const MAX_GROWTH: u64 = 4;

/// Pixel rectangle with `(0, 0)` at the top-left corner of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRegion {
    #[must_use]
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right - self.left
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Reads the region from a locator's fragment, if it carries a well-formed one.
    pub fn from_locator(url: &Url) -> Option<Self> {
        url.fragment().and_then(|f| f.parse().ok())
    }

    /// Returns `url` with this region as its fragment.
    #[must_use]
    pub fn locator(&self, url: &Url) -> Url {
        let mut out = url.clone();
        out.set_fragment(Some(&self.to_string()));
        out
    }
}

impl FromStr for CropRegion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut values = [0u32; 4];
        let mut parts = s.split(',');

        for slot in &mut values {
            *slot = parts.next().ok_or(())?.trim().parse().map_err(|_| ())?;
        }

        if parts.next().is_some() {
            return Err(());
        }

        let [left, top, right, bottom] = values;
        if left >= right || top >= bottom {
            return Err(());
        }

        Ok(Self::new(left, top, right, bottom))
    }
}

impl Display for CropRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

/// Cuts `region` out of an encoded image and re-encodes it in the source format.
///
/// The output is always `width() x height()`. Parts of the region that fall outside the source
/// are left blank.
pub fn crop_image(data: &[u8], region: CropRegion) -> Result<Vec<u8>, image::ImageError> {
    let format = image::guess_format(data)?;
    let source = image::load_from_memory_with_format(data, format)?;

    // The region comes from the URL, so bound the allocation by what the source could fill
    let bpp = u64::from(source.color().bytes_per_pixel());
    let requested = u64::from(region.width())
        .checked_mul(u64::from(region.height()))
        .and_then(|px| px.checked_mul(bpp));
    let budget = u64::from(source.width())
        .saturating_mul(u64::from(source.height()))
        .saturating_mul(bpp)
        .saturating_mul(MAX_GROWTH);

    if requested.map_or(true, |bytes| bytes > budget) {
        return Err(image::ImageError::Limits(LimitError::from_kind(
            LimitErrorKind::InsufficientMemory,
        )));
    }

    let visible = source.crop_imm(region.left, region.top, region.width(), region.height());
    let mut cropped = DynamicImage::new(region.width(), region.height(), source.color());
    cropped.copy_from(&visible, 0, 0)?;

    debug!(
        "Cropped {}x{} image to {}x{}",
        source.width(),
        source.height(),
        cropped.width(),
        cropped.height()
    );

    let mut out = Cursor::new(Vec::with_capacity(data.len()));
    cropped.write_to(&mut out, format)?;
    Ok(out.into_inner())
}

/// Replaces image bodies with the region requested in the locator fragment.
///
/// Best effort: anything that goes wrong leaves the response as it was.
#[derive(Debug, Clone, Copy, Default)]
pub struct CropInterceptor;

impl Interceptor for CropInterceptor {
    fn intercept(&self, request: &Url, response: RawResponse) -> Result<RawResponse, ExtractorError> {
        let Some(fragment) = request.fragment() else {
            return Ok(response);
        };

        let Ok(region) = fragment.parse::<CropRegion>() else {
            debug!("Ignoring malformed crop fragment {fragment:?}");
            return Ok(response);
        };

        if !response.status.is_success() {
            return Ok(response);
        }

        match crop_image(&response.body, region) {
            Ok(bytes) => Ok(RawResponse {
                body: bytes.into(),
                ..response
            }),
            Err(e) => {
                warn!("Failed to crop {request}: {e}");
                Ok(response)
            }
        }
    }
}

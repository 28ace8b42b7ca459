// ProductImageDataset — manifest-driven labeled image dataset
//
// Decoding is lazy: nothing touches the disk until `get`. Each fetch opens
// `<id><suffix>` from the image directory, resizes the shorter side,
// center-crops, converts to planar CHW floats in [0, 1], and normalizes
// per channel.

use image::imageops::FilterType;
use image::GenericImageView;

use crate::dataset::{Dataset, Sample};
use crate::error::{DataError, Result};
use crate::labels::LabelCodec;
use crate::manifest::{Manifest, ManifestEntry};
use crate::transform::ChannelNormalize;

/// Side length used by the catalog preprocessing.
pub const DEFAULT_IMAGE_SIZE: u32 = 64;
/// ImageNet channel means, the normalization the upstream weights expect.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Builder for [`ProductImageDataset`].
pub struct ProductImageDatasetBuilder {
    manifest: Manifest,
    resize_shorter: u32,
    crop: u32,
    normalize: Option<ChannelNormalize>,
}

impl ProductImageDatasetBuilder {
    fn new(manifest: Manifest) -> Self {
        ProductImageDatasetBuilder {
            manifest,
            resize_shorter: DEFAULT_IMAGE_SIZE,
            crop: DEFAULT_IMAGE_SIZE,
            normalize: Some(ChannelNormalize::new(IMAGENET_MEAN, IMAGENET_STD)),
        }
    }

    /// Resize the shorter image side to `size` pixels, keeping aspect.
    pub fn resize_shorter(mut self, size: u32) -> Self {
        self.resize_shorter = size;
        self
    }

    /// Center-crop to `size` x `size` after resizing.
    pub fn center_crop(mut self, size: u32) -> Self {
        self.crop = size;
        self
    }

    /// Override the per-channel normalization, or disable it with `None`.
    pub fn normalize(mut self, normalize: Option<ChannelNormalize>) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn build(self) -> Result<ProductImageDataset> {
        if self.resize_shorter == 0 || self.crop == 0 {
            return Err(DataError::msg("image sizes must be positive"));
        }
        if self.crop > self.resize_shorter {
            return Err(DataError::msg(format!(
                "center crop {} larger than resized shorter side {}",
                self.crop, self.resize_shorter
            )));
        }
        let codec = LabelCodec::from_labels(self.manifest.labels());
        Ok(ProductImageDataset {
            manifest: self.manifest,
            codec,
            resize_shorter: self.resize_shorter,
            crop: self.crop,
            normalize: self.normalize,
        })
    }
}

/// Labeled product images, decoded from disk per fetch.
#[derive(Debug)]
pub struct ProductImageDataset {
    manifest: Manifest,
    codec: LabelCodec,
    resize_shorter: u32,
    crop: u32,
    normalize: Option<ChannelNormalize>,
}

impl ProductImageDataset {
    /// Start building a dataset over `manifest`.
    pub fn builder(manifest: Manifest) -> ProductImageDatasetBuilder {
        ProductImageDatasetBuilder::new(manifest)
    }

    /// The label codec built from the manifest.
    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    /// Class names in id order.
    pub fn class_names(&self) -> &[String] {
        self.codec.class_names()
    }

    pub fn num_classes(&self) -> usize {
        self.codec.num_classes()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Shape of every sample, `[channels, height, width]`.
    pub fn sample_shape(&self) -> [usize; 3] {
        [3, self.crop as usize, self.crop as usize]
    }

    fn load_pixels(&self, index: usize, entry: &ManifestEntry) -> Result<Vec<f32>> {
        let load_err = |detail: String| DataError::ImageLoad {
            index,
            path: entry.image_path.clone(),
            detail,
        };
        let img = image::open(&entry.image_path).map_err(|e| load_err(e.to_string()))?;

        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Err(load_err("zero-sized image".to_string()));
        }

        // Shorter side to `resize_shorter`, aspect preserved, then crop the
        // center `crop` square.
        let size = self.resize_shorter;
        let (nw, nh) = if w <= h {
            (size, (((h as f64 * size as f64) / w as f64).round() as u32).max(size))
        } else {
            ((((w as f64 * size as f64) / h as f64).round() as u32).max(size), size)
        };
        let img = img.resize_exact(nw, nh, FilterType::Lanczos3);
        let crop = self.crop;
        let img = img.crop_imm((nw - crop) / 2, (nh - crop) / 2, crop, crop);

        let rgb = img.to_rgb8();
        let npix = (crop as usize) * (crop as usize);
        let raw = rgb.into_raw();
        // Interleaved HWC bytes to planar CHW floats in [0, 1].
        let mut pixels = vec![0.0f32; 3 * npix];
        for i in 0..npix {
            pixels[i] = raw[i * 3] as f32 / 255.0;
            pixels[npix + i] = raw[i * 3 + 1] as f32 / 255.0;
            pixels[2 * npix + i] = raw[i * 3 + 2] as f32 / 255.0;
        }
        if let Some(norm) = &self.normalize {
            norm.apply_chw(&mut pixels, self.sample_shape());
        }
        Ok(pixels)
    }
}

impl Dataset for ProductImageDataset {
    fn len(&self) -> usize {
        self.manifest.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let entry =
            self.manifest
                .entries()
                .get(index)
                .ok_or(DataError::IndexOutOfBounds {
                    index,
                    len: self.manifest.len(),
                })?;
        let pixels = self.load_pixels(index, entry)?;
        // The codec was built from this manifest, so the lookup holds.
        let label = self.codec.encode(&entry.label)?;
        Ok(Sample {
            pixels,
            shape: self.sample_shape(),
            label,
        })
    }

    fn name(&self) -> &str {
        "products"
    }
}

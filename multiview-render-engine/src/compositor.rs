//! Render-output graph: one pass fans out to colour, depth and coverage images

use crate::error::{RenderError, Result};
use crate::scene::{RenderTargets, RenderedFiles};
use constants::layout::{DEPTH_EXTENSION, MASK_EXTENSION, view_stem};
use constants::render_settings::{JPEG_QUALITY, RENDER_FRAME};
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Rgb, RgbImage};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Jpeg { quality: u8 },
    Png,
}

impl Encoding {
    pub fn extension(&self) -> &'static str {
        match self {
            Encoding::Jpeg { .. } => "jpg",
            Encoding::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Rgb,
    Bw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOutput {
    pub encoding: Encoding,
    pub channels: Channels,
    pub sixteen_bit: bool,
}

/// Output wiring shared by every view of one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGraph {
    /// Directory the file-output slots write into.
    pub base_dir: PathBuf,
    /// Frame number the slots append to their file names.
    pub frame: u32,
    pub color: ImageOutput,
    pub depth: ImageOutput,
    pub mask: ImageOutput,
}

impl OutputGraph {
    /// Colour and mask as JPEG, depth as 16-bit grayscale PNG.
    pub fn dataset(views_dir: &Path) -> Self {
        Self {
            base_dir: views_dir.to_path_buf(),
            frame: RENDER_FRAME,
            color: ImageOutput {
                encoding: Encoding::Jpeg {
                    quality: JPEG_QUALITY,
                },
                channels: Channels::Rgb,
                sixteen_bit: false,
            },
            depth: ImageOutput {
                encoding: Encoding::Png,
                channels: Channels::Bw,
                sixteen_bit: true,
            },
            mask: ImageOutput {
                encoding: Encoding::Jpeg {
                    quality: JPEG_QUALITY,
                },
                channels: Channels::Bw,
                sixteen_bit: false,
            },
        }
    }

    /// Targets for one view: canonical rgb path plus `{view:03}_depth`/`_mask` slots.
    pub fn targets(&self, view_id: usize) -> RenderTargets {
        RenderTargets {
            rgb_path: self.base_dir.join(format!(
                "{}.{}",
                view_stem(view_id, "rgb"),
                self.color.encoding.extension()
            )),
            depth_slot: view_stem(view_id, "depth"),
            mask_slot: view_stem(view_id, "mask"),
        }
    }

    /// Path a file-output slot writes for this graph's frame.
    pub fn slot_path(&self, slot: &str, output: &ImageOutput) -> PathBuf {
        slot_path(&self.base_dir, slot, self.frame, output.encoding.extension())
    }

    /// Encodes one rendered frame through all three outputs.
    pub fn write_outputs(
        &self,
        buffers: &FrameBuffers,
        targets: &RenderTargets,
    ) -> Result<RenderedFiles> {
        fs::create_dir_all(&self.base_dir).map_err(|e| RenderError::io(&self.base_dir, e))?;

        let rgb = targets.rgb_path.clone();
        let depth = self.slot_path(&targets.depth_slot, &self.depth);
        let mask = self.slot_path(&targets.mask_slot, &self.mask);

        let (width, height) = (buffers.width, buffers.height);

        let color_image: RgbImage = RgbImage::from_fn(width, height, |x, y| {
            let idx = buffers.index(x, y);
            let [r, g, b] = buffers.color[idx];
            let a = buffers.alpha[idx];
            Rgb([to_u8(r * a), to_u8(g * a), to_u8(b * a)])
        });
        write_rgb(&rgb, &color_image, &self.color)?;

        let normalized = buffers.normalized_depth();
        if self.depth.sixteen_bit {
            let depth_image: ImageBuffer<Luma<u16>, Vec<u16>> =
                ImageBuffer::from_fn(width, height, |x, y| {
                    Luma([(normalized[buffers.index(x, y)] * u16::MAX as f32).round() as u16])
                });
            depth_image
                .save_with_format(&depth, image_format(&self.depth.encoding))
                .map_err(|e| RenderError::image(&depth, e))?;
        } else {
            let depth_image: GrayImage = GrayImage::from_fn(width, height, |x, y| {
                Luma([to_u8(normalized[buffers.index(x, y)])])
            });
            write_gray(&depth, &depth_image, &self.depth)?;
        }

        let mask_image: GrayImage = GrayImage::from_fn(width, height, |x, y| {
            Luma([to_u8(buffers.alpha[buffers.index(x, y)])])
        });
        write_gray(&mask, &mask_image, &self.mask)?;

        Ok(RenderedFiles { rgb, depth, mask })
    }
}

/// `{base}/{slot}{frame:04}.{ext}`, the naming a file-output slot produces.
pub fn slot_path(base_dir: &Path, slot: &str, frame: u32, extension: &str) -> PathBuf {
    base_dir.join(format!("{}{:04}.{}", slot, frame, extension))
}

/// Renames a frame-suffixed slot file to its canonical name, if it is not already there.
pub fn normalize_frame_suffix(actual: &Path, canonical: &Path) -> Result<PathBuf> {
    if actual == canonical {
        return Ok(canonical.to_path_buf());
    }
    if actual.exists() {
        fs::rename(actual, canonical).map_err(|e| RenderError::io(actual, e))?;
        log::trace!("Renamed {} -> {}", actual.display(), canonical.display());
    }
    Ok(canonical.to_path_buf())
}

/// Canonical per-view names for the depth and mask slots.
pub fn canonical_slot_paths(views_dir: &Path, view_id: usize) -> (PathBuf, PathBuf) {
    (
        views_dir.join(format!("{}.{}", view_stem(view_id, "depth"), DEPTH_EXTENSION)),
        views_dir.join(format!("{}.{}", view_stem(view_id, "mask"), MASK_EXTENSION)),
    )
}

/// Raw render passes of one frame, row-major from the top-left pixel.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    pub width: u32,
    pub height: u32,
    /// Linear colour in [0, 1], not premultiplied.
    pub color: Vec<[f32; 3]>,
    /// Camera-space depth; `f32::INFINITY` where nothing was hit.
    pub depth: Vec<f32>,
    /// Coverage in [0, 1].
    pub alpha: Vec<f32>,
}

impl FrameBuffers {
    /// Transparent film: black, uncovered, infinitely far.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![[0.0; 3]; len],
            depth: vec![f32::INFINITY; len],
            alpha: vec![0.0; len],
        }
    }

    pub fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Depth mapped to [0, 1] over covered pixels. Uncovered pixels are 1.0,
    /// and a flat depth range maps every covered pixel to 0.0.
    pub fn normalized_depth(&self) -> Vec<f32> {
        let (min, max) = self
            .depth
            .iter()
            .filter(|d| d.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| {
                (lo.min(d), hi.max(d))
            });
        let range = max - min;

        self.depth
            .iter()
            .map(|&d| {
                if !d.is_finite() {
                    1.0
                } else if range > f32::EPSILON {
                    ((d - min) / range).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            })
            .collect()
    }
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn image_format(encoding: &Encoding) -> ImageFormat {
    match encoding {
        Encoding::Jpeg { .. } => ImageFormat::Jpeg,
        Encoding::Png => ImageFormat::Png,
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| RenderError::io(path, e))
}

fn write_rgb(path: &Path, img: &RgbImage, output: &ImageOutput) -> Result<()> {
    match output.encoding {
        Encoding::Jpeg { quality } => JpegEncoder::new_with_quality(create(path)?, quality)
            .encode_image(img)
            .map_err(|e| RenderError::image(path, e)),
        Encoding::Png => img
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| RenderError::image(path, e)),
    }
}

fn write_gray(path: &Path, img: &GrayImage, output: &ImageOutput) -> Result<()> {
    match output.encoding {
        Encoding::Jpeg { quality } => JpegEncoder::new_with_quality(create(path)?, quality)
            .encode_image(img)
            .map_err(|e| RenderError::image(path, e)),
        Encoding::Png => img
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| RenderError::image(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn half_covered(width: u32, height: u32) -> FrameBuffers {
        let mut buffers = FrameBuffers::new(width, height);
        for y in 0..height {
            for x in 0..width / 2 {
                let idx = buffers.index(x, y);
                buffers.color[idx] = [1.0, 0.5, 0.0];
                buffers.alpha[idx] = 1.0;
                buffers.depth[idx] = 2.0 + x as f32;
            }
        }
        buffers
    }

    #[test]
    fn depth_normalizes_over_covered_pixels() {
        let buffers = half_covered(4, 1);
        let depth = buffers.normalized_depth();

        assert_relative_eq!(depth[0], 0.0);
        assert_relative_eq!(depth[1], 1.0);
        assert_relative_eq!(depth[2], 1.0);
        assert_relative_eq!(depth[3], 1.0);
    }

    #[test]
    fn flat_depth_maps_to_zero() {
        let mut buffers = FrameBuffers::new(2, 1);
        buffers.depth[0] = 3.0;
        buffers.alpha[0] = 1.0;

        assert_eq!(buffers.normalized_depth(), [0.0, 1.0]);
        assert!(FrameBuffers::new(2, 2).normalized_depth().iter().all(|&d| d == 1.0));
    }

    #[test]
    fn slots_append_frame_number() {
        let graph = OutputGraph::dataset(Path::new("out/views"));
        let targets = graph.targets(3);

        assert_eq!(targets.rgb_path, Path::new("out/views/003_rgb.jpg"));
        assert_eq!(
            graph.slot_path(&targets.depth_slot, &graph.depth),
            Path::new("out/views/003_depth0001.png")
        );
        assert_eq!(
            graph.slot_path(&targets.mask_slot, &graph.mask),
            Path::new("out/views/003_mask0001.jpg")
        );
    }

    #[test]
    fn outputs_are_written_with_expected_formats() {
        let dir = tempdir().unwrap();
        let graph = OutputGraph::dataset(dir.path());
        let targets = graph.targets(0);

        let files = graph.write_outputs(&half_covered(8, 8), &targets).unwrap();

        let rgb = image::open(&files.rgb).unwrap();
        assert_eq!((rgb.width(), rgb.height()), (8, 8));
        assert!(matches!(rgb, image::DynamicImage::ImageRgb8(_)));

        let depth = image::open(&files.depth).unwrap();
        let depth = depth.as_luma16().expect("16-bit depth");
        assert_eq!(depth.get_pixel(0, 0).0[0], 0);
        assert_eq!(depth.get_pixel(7, 0).0[0], u16::MAX);

        let mask = image::open(&files.mask).unwrap().to_luma8();
        assert!(mask.get_pixel(1, 4).0[0] > 200);
        assert!(mask.get_pixel(6, 4).0[0] < 50);
    }

    #[test]
    fn frame_suffix_is_renamed_away() {
        let dir = tempdir().unwrap();
        let actual = dir.path().join("000_depth0001.png");
        let canonical = dir.path().join("000_depth.png");
        fs::write(&actual, b"png").unwrap();

        let renamed = normalize_frame_suffix(&actual, &canonical).unwrap();

        assert_eq!(renamed, canonical);
        assert!(canonical.exists());
        assert!(!actual.exists());
        assert_eq!(
            canonical_slot_paths(dir.path(), 0),
            (canonical, dir.path().join("000_mask.jpg"))
        );
    }
}

use image::imageops::FilterType;
use ndarray::{s, Array2, ArrayView3, ArrayViewMut3};

use crate::shared::bounding_box::PixelRect;

const CHANNELS: usize = 3;

/// A decoded image: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// works with this type for cropping, scoring and thumbnail synthesis.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// Solid-color frame.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = rgb.iter().copied().cycle().take(pixels * CHANNELS).collect();
        Self::new(data, width, height)
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `rect`, which must lie within the frame.
    pub fn crop(&self, rect: &PixelRect) -> Frame {
        debug_assert!(rect.x2 <= self.width && rect.y2 <= self.height);
        let view = self.as_ndarray();
        let region = view.slice(s![
            rect.y1 as usize..rect.y2 as usize,
            rect.x1 as usize..rect.x2 as usize,
            ..
        ]);
        let data: Vec<u8> = region.iter().copied().collect();
        Frame::new(data, rect.width(), rect.height())
    }

    /// Direct resize to exactly `width` x `height`; aspect ratio is not kept.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        let Some(img) = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
        else {
            return Frame::filled(width, height, [0, 0, 0]);
        };
        let resized = image::imageops::resize(&img, width, height, FilterType::Triangle);
        Frame::from_rgb_image(resized)
    }

    /// Luma plane using ITU-R BT.601 weights, shape `(height, width)`.
    pub fn to_grayscale(&self) -> Array2<f64> {
        let rgb = self.as_ndarray();
        Array2::from_shape_fn((self.height as usize, self.width as usize), |(y, x)| {
            0.299 * rgb[[y, x, 0]] as f64
                + 0.587 * rgb[[y, x, 1]] as f64
                + 0.114 * rgb[[y, x, 2]] as f64
        })
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}

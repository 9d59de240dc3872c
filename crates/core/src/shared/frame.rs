use crate::shared::stream_info::{PixelFormat, StreamInfo};

/// An owned copy of one stream's pixels: contiguous bytes in row-major
/// order with no row padding.
///
/// The grab path works on the shared reusable buffer; a `Frame` is only
/// materialized at boundaries where a copy is implied anyway (recording,
/// snapshots, handing pixels to another thread).
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    index: i64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, index: i64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * format.bytes_per_pixel(),
            "data length must equal width * height * bytes_per_pixel"
        );
        Self {
            data,
            width,
            height,
            format,
            index,
        }
    }

    /// Copies one stream out of the shared grab buffer, stripping any
    /// row padding.
    pub fn from_stream(info: &StreamInfo, buffer: &[u8], index: i64) -> Self {
        let src = info.view(buffer);
        let row_bytes = info.width as usize * info.format.bytes_per_pixel();
        let mut data = Vec::with_capacity(row_bytes * info.height as usize);
        for row in 0..info.height as usize {
            let start = row * info.pitch;
            data.extend_from_slice(&src[start..start + row_bytes]);
        }
        Self::new(data, info.width, info.height, info.format, index)
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

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    /// Expands the pixels to tightly-packed RGBA, the layout windowing
    /// toolkits want for texture upload.
    pub fn to_rgba(&self) -> Vec<u8> {
        let pixels = (self.width as usize) * (self.height as usize);
        let mut rgba = Vec::with_capacity(pixels * 4);
        match self.format {
            PixelFormat::Rgb24 => {
                for px in self.data.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
            }
            PixelFormat::Gray8 => {
                for &v in &self.data {
                    rgba.extend_from_slice(&[v, v, v, 255]);
                }
            }
        }
        rgba
    }
}

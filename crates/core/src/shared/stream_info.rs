/// Pixel layout of a single stream within the shared grab buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }

    pub fn channels(self) -> u8 {
        self.bytes_per_pixel() as u8
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Rgb24 => write!(f, "RGB24"),
            PixelFormat::Gray8 => write!(f, "GRAY8"),
        }
    }
}

/// Describes one stream of a bound frame source: dimensions, pixel
/// format and where its bytes land inside the shared grab buffer.
///
/// Read-only from the controller's point of view once a source is open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Bytes per row, including any padding.
    pub pitch: usize,
    /// Byte offset of this stream within the grab buffer.
    pub offset: usize,
}

impl StreamInfo {
    pub fn size_bytes(&self) -> usize {
        self.pitch * self.height as usize
    }

    /// The slice of `buffer` holding this stream's pixels.
    pub fn view<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.offset..self.offset + self.size_bytes()]
    }

    /// The mutable slice of `buffer` holding this stream's pixels.
    pub fn view_mut<'a>(&self, buffer: &'a mut [u8]) -> &'a mut [u8] {
        &mut buffer[self.offset..self.offset + self.size_bytes()]
    }
}

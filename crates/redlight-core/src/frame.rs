use crate::error::FrameError;

/// Bytes per pixel (RGBA).
pub const CHANNELS: usize = 4;

/// An owned RGBA8 pixel buffer, row-major, top-left origin.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

impl Frame {
    /// Wrap an existing buffer. Its length must be exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = buffer_len(width, height);
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(buffer_len(width, height));
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_dimensions(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * CHANNELS)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[i..i + CHANNELS]);
        Some(px)
    }

    /// Set one pixel. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + CHANNELS].copy_from_slice(&rgba);
        }
    }

    /// Paint a rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgba: [u8; 4]) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for py in y.min(self.height)..y_end {
            for px in x.min(self.width)..x_end {
                self.put_pixel(px, py, rgba);
            }
        }
    }

    /// Copy out a sub-rectangle. The rectangle is clipped to the frame, so the
    /// result may be smaller than requested (or empty).
    pub fn region(&self, x: u32, y: u32, w: u32, h: u32) -> Frame {
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        let out_w = x1 - x0;
        let out_h = y1 - y0;

        let row_bytes = out_w as usize * CHANNELS;
        let mut data = Vec::with_capacity(row_bytes * out_h as usize);
        for row in y0..y1 {
            let start = (row as usize * self.width as usize + x0 as usize) * CHANNELS;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Frame {
            width: out_w,
            height: out_h,
            data,
        }
    }

    /// Horizontally flipped copy, as shown by a user-facing camera preview.
    pub fn mirrored(&self) -> Frame {
        let mut data = Vec::with_capacity(self.data.len());
        let row_bytes = self.width as usize * CHANNELS;
        if row_bytes > 0 {
            for row in self.data.chunks_exact(row_bytes) {
                for px in row.chunks_exact(CHANNELS).rev() {
                    data.extend_from_slice(px);
                }
            }
        }
        Frame {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    #[test]
    fn new_checks_buffer_length() {
        assert!(Frame::new(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            Frame::new(2, 2, vec![0; 15]),
            Err(FrameError::BufferSize {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn filled_sets_every_pixel() {
        let f = Frame::filled(3, 2, RED);
        assert_eq!(f.data().len(), 24);
        assert_eq!(f.pixel(2, 1), Some(RED));
        assert_eq!(f.pixel(3, 0), None);
    }

    #[test]
    fn region_copies_sub_rectangle() {
        let mut f = Frame::filled(4, 4, RED);
        f.put_pixel(2, 1, BLUE);
        let r = f.region(2, 1, 2, 2);
        assert_eq!((r.width(), r.height()), (2, 2));
        assert_eq!(r.pixel(0, 0), Some(BLUE));
        assert_eq!(r.pixel(1, 1), Some(RED));
    }

    #[test]
    fn region_is_clipped_to_frame() {
        let f = Frame::filled(4, 3, RED);
        let r = f.region(3, 0, 10, 10);
        assert_eq!((r.width(), r.height()), (1, 3));

        let outside = f.region(9, 9, 2, 2);
        assert!(outside.is_empty());
        assert_eq!((outside.width(), outside.height()), (0, 0));
    }

    #[test]
    fn mirrored_flips_columns() {
        let mut f = Frame::filled(3, 1, RED);
        f.put_pixel(0, 0, BLUE);
        let m = f.mirrored();
        assert_eq!(m.pixel(2, 0), Some(BLUE));
        assert_eq!(m.pixel(0, 0), Some(RED));
        assert_eq!(m.mirrored(), f);
    }

    #[test]
    fn fill_rect_clips() {
        let mut f = Frame::filled(4, 4, RED);
        f.fill_rect(2, 2, 10, 10, BLUE);
        assert_eq!(f.pixel(3, 3), Some(BLUE));
        assert_eq!(f.pixel(1, 1), Some(RED));
    }

    #[test]
    fn debug_does_not_dump_pixels() {
        let f = Frame::filled(64, 64, RED);
        let dbg = format!("{f:?}");
        assert!(dbg.contains("width: 64"));
        assert!(dbg.len() < 64);
    }
}

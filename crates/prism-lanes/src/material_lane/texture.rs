// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use prism_core::ImportError;
use std::path::Path;

/// An image decoded to tightly packed RGBA8.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// `width * height * 4` bytes, row-major.
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Decodes an encoded image (PNG, JPEG, ...) held in memory.
///
/// `path` only labels the error.
pub fn decode_image(bytes: &[u8], path: &Path) -> Result<DecodedImage, ImportError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImportError::Image {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Keep the sRGB bytes as stored; the sampler view decides the colour space.
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Reads and decodes an image file.
pub fn load_texture(path: &Path) -> Result<DecodedImage, ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = decode_image(&bytes, path)?;
    log::debug!(
        "Decoded texture '{}' ({}x{})",
        path.display(),
        decoded.width,
        decoded.height
    );
    Ok(decoded)
}

use super::DecalError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::rc::Rc;

/// Content address of an uploaded image: `sha256:<hex>`.
pub fn content_key(bytes: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(bytes))
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decoded textures keyed by content, so decals made from the same upload
/// share one texture.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<String, Rc<Texture>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached texture for these bytes, decoding on first sight.
    pub fn load(&mut self, file_name: &str, bytes: &[u8]) -> Result<Rc<Texture>, DecalError> {
        let key = content_key(bytes);
        if let Some(cached) = self.entries.get(&key) {
            log::debug!("Texture cache hit for {} ({})", file_name, key);
            return Ok(Rc::clone(cached));
        }
        let decoded = image::load_from_memory(bytes)
            .map_err(|source| DecalError::TextureDecode {
                file_name: file_name.to_string(),
                source,
            })?
            .to_rgba8();
        let texture = Rc::new(Texture {
            key: key.clone(),
            width: decoded.width(),
            height: decoded.height(),
            pixels: decoded.into_raw(),
        });
        log::info!(
            "Decoded texture {} ({}x{}) as {}",
            file_name,
            texture.width,
            texture.height,
            key
        );
        self.entries.insert(key, Rc::clone(&texture));
        Ok(texture)
    }

    pub fn get(&self, key: &str) -> Option<Rc<Texture>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops textures nobody outside the cache holds and that no key in
    /// `keep` refers to. Returns how many were dropped.
    pub fn prune<'a>(&mut self, keep: impl IntoIterator<Item = &'a str>) -> usize {
        let keep: Vec<&str> = keep.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|key, texture| {
            Rc::strong_count(texture) > 1 || keep.contains(&key.as_str())
        });
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
pub(crate) fn tiny_png(rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_key_is_sha256_hex() {
        let key = content_key(b"abc");
        assert_eq!(
            key,
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn same_bytes_share_one_texture() {
        let mut cache = TextureCache::new();
        let png = tiny_png([255, 0, 0, 255]);
        let first = cache.load("a.png", &png).unwrap();
        let second = cache.load("copy-of-a.png", &png).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!((first.width, first.height), (2, 2));
        assert_eq!(&first.pixels[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn undecodable_bytes_are_reported() {
        let mut cache = TextureCache::new();
        let err = cache.load("notes.txt", b"definitely not an image").unwrap_err();
        assert!(err.to_string().contains("notes.txt"));
        assert!(cache.is_empty());
    }

    #[test]
    fn prune_keeps_held_and_referenced_textures() {
        let mut cache = TextureCache::new();
        let red = cache.load("red.png", &tiny_png([255, 0, 0, 255])).unwrap();
        let blue_key = cache.load("blue.png", &tiny_png([0, 0, 255, 255])).unwrap().key.clone();
        let green_key = cache.load("green.png", &tiny_png([0, 255, 0, 255])).unwrap().key.clone();

        let dropped = cache.prune([blue_key.as_str()]);
        assert_eq!(dropped, 1);
        assert!(cache.contains(&red.key));
        assert!(cache.contains(&blue_key));
        assert!(!cache.contains(&green_key));
    }
}

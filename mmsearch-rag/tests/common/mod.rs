//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use mmsearch_rag::{Catalog, EmbeddingProvider, MmSearchError, Result};

pub const DIMS: usize = 64;
const HALF: usize = DIMS / 2;

/// Deterministic embeddings with no network access.
///
/// Texts become bag-of-words vectors over the first half of the space (one
/// hashed bucket per lowercase token), so texts sharing words are similar.
/// Images become pseudo-random vectors over the second half, seeded by a hash
/// of their bytes, so identical images match exactly and never resemble text.
#[derive(Default)]
pub struct KeywordEmbeddingProvider {
    text_calls: AtomicUsize,
    image_calls: AtomicUsize,
}

impl KeywordEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.text_calls() + self.image_calls()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |acc, &b| {
        (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        let mut emb = vec![0.0f32; DIMS];
        for token in text.split(|c: char| !c.is_ascii_alphanumeric()).filter(|t| !t.is_empty()) {
            let bucket = (fnv1a(token.to_ascii_lowercase().as_bytes()) % HALF as u64) as usize;
            emb[bucket] += 1.0;
        }
        Ok(emb)
    }

    async fn embed_image(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let seed = fnv1a(bytes);
        let mut emb = vec![0.0f32; DIMS];
        for (k, v) in emb[HALF..].iter_mut().enumerate() {
            let bits = splitmix64(seed.wrapping_add(k as u64)) >> 40;
            *v = bits as f32 / (1u64 << 24) as f32 * 2.0 - 1.0;
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Wraps [`KeywordEmbeddingProvider`] and fails the `fail_on`-th call
/// (1-based, text and image calls counted together) and every call after it.
pub struct FailingEmbeddingProvider {
    inner: KeywordEmbeddingProvider,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingEmbeddingProvider {
    pub fn new(fail_on: usize) -> Self {
        Self { inner: KeywordEmbeddingProvider::new(), fail_on, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.fail_on {
            return Err(MmSearchError::Embedding {
                provider: "failing".into(),
                message: format!("quota exhausted on call {call}"),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.check()?;
        self.inner.embed_text(text).await
    }

    async fn embed_image(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        self.check()?;
        self.inner.embed_image(bytes).await
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Distinct, non-trivial bytes for the `i`-th test image.
pub fn image_bytes(i: usize) -> Vec<u8> {
    (0..256usize).map(|j| ((j * (i + 3)) ^ (i * 31)) as u8).collect()
}

pub const IMAGE_NAMES: [&str; 6] =
    ["cat.jpg", "dog.jpg", "horse.jpg", "parrot.jpg", "goldfish.jpg", "owl.jpg"];

/// Write the six test images under `root/images` and return a catalog of
/// those images plus the three built-in texts.
pub fn write_catalog(root: &Path) -> Catalog {
    let dir = root.join("images");
    std::fs::create_dir_all(&dir).unwrap();
    let images: Vec<PathBuf> = IMAGE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let path = dir.join(name);
            std::fs::write(&path, image_bytes(i)).unwrap();
            path
        })
        .collect();
    Catalog::new(images, Catalog::builtin().texts)
}

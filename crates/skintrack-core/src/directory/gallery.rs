//! Per-patient image gallery.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AssetResolver;
use crate::models::{asset_path, AssetKind};

/// One resolved gallery image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    pub kind: AssetKind,
    pub url: String,
}

/// Storage paths for a patient's gallery, in the order given.
pub fn gallery_paths(display_name: &str, kinds: &[AssetKind]) -> Vec<(AssetKind, String)> {
    kinds
        .iter()
        .map(|kind| (*kind, asset_path(display_name, *kind)))
        .collect()
}

/// Resolve every region image concurrently.
///
/// Failed lookups are logged and left out; the rest keep the order of
/// `kinds`.
pub async fn resolve_gallery(
    resolver: &dyn AssetResolver,
    display_name: &str,
    kinds: &[AssetKind],
) -> Vec<GalleryImage> {
    let lookups = gallery_paths(display_name, kinds)
        .into_iter()
        .map(|(kind, path)| async move {
            match resolver.resolve(&path).await {
                Ok(url) => Some(GalleryImage { kind, url }),
                Err(e) => {
                    warn!(path = %path, error = %e, "gallery image unavailable");
                    None
                }
            }
        });

    join_all(lookups).await.into_iter().flatten().collect()
}

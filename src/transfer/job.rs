//! Transfer job descriptions.

use ash::vk;

use crate::resources::{DatHandle, TexHandle};

/// What kind of transfer a [`TransferJob`] performs. Buffer jobs move bytes
/// through a `Dat`; texture jobs move bytes through a `Tex` and additionally
/// carry the shape needed to address a sub-region of the image.
#[derive(Debug, Clone)]
pub enum TransferJobKind {
    /// Host bytes -> a Dat's buffer region.
    BufferUpload { dat: DatHandle, data: Vec<u8> },
    /// A Dat's buffer region -> host bytes, delivered via `callback`.
    BufferDownload { dat: DatHandle },
    /// One Dat's region -> another Dat's region, same engine.
    BufferCopy { src: DatHandle, dst: DatHandle },
    /// Host bytes -> a sub-region of a Tex.
    TextureUpload {
        tex: TexHandle,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
        data: Vec<u8>,
    },
    /// A sub-region of a Tex -> host bytes, delivered via `callback`.
    TextureDownload {
        tex: TexHandle,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
    },
    /// One Tex's sub-region -> another Tex's sub-region.
    TextureCopy {
        src: TexHandle,
        src_offset: vk::Offset3D,
        dst: TexHandle,
        dst_offset: vk::Offset3D,
        extent: vk::Extent3D,
    },
}

/// One unit of work for the transfer engine: a kind plus the swapchain
/// image index it targets (used by dup-Dat uploads to pick the slice) and
/// an optional completion callback for downloads.
pub struct TransferJob {
    pub kind: TransferJobKind,
    pub target_image: usize,
    pub callback: Option<Box<dyn FnOnce(Vec<u8>) + Send>>,
}

impl TransferJob {
    /// Wrap a kind with no completion callback (uploads, copies).
    pub fn new(kind: TransferJobKind, target_image: usize) -> Self {
        Self {
            kind,
            target_image,
            callback: None,
        }
    }

    /// Wrap a download with a completion callback invoked once the bytes
    /// are available.
    pub fn with_callback(
        kind: TransferJobKind,
        target_image: usize,
        callback: impl FnOnce(Vec<u8>) + Send + 'static,
    ) -> Self {
        Self {
            kind,
            target_image,
            callback: Some(Box::new(callback)),
        }
    }
}

impl std::fmt::Debug for TransferJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferJob")
            .field("kind", &self.kind)
            .field("target_image", &self.target_image)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

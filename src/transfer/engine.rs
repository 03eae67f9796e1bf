//! Transfer engine: three ordered FIFOs (upload/download/copy) and the
//! dup-Dat upfill pass that keeps replicated uniforms consistent.

use std::sync::Mutex;

use thiserror::Error;

use ash::vk;

use crate::foundation::collections::Fifo;
use crate::resources::{DatHandle, ResourceError, ResourceManager, TexHandle};
use crate::vk::VulkanContext;

use super::job::{TransferJob, TransferJobKind};

/// Errors raised by the transfer engine.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The staging buffer could not grow to accommodate the request.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The requested region lies outside its destination.
    #[error("overflow: {0}")]
    Overflow(String),

    /// Source and destination formats/shapes are incompatible.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl From<ResourceError> for TransferError {
    fn from(e: ResourceError) -> Self {
        match e {
            ResourceError::Overflow(m) => TransferError::Overflow(m),
            ResourceError::Invalid(m) => TransferError::Invalid(m),
            ResourceError::NotFound => TransferError::Invalid("handle not found".into()),
            ResourceError::Memory(m) => TransferError::ResourceExhausted(m.to_string()),
            ResourceError::Vulkan(v) => TransferError::ResourceExhausted(v.to_string()),
        }
    }
}

/// Three concurrent FIFOs processing transfer jobs, plus the registry of
/// dup-Dats the per-frame upfill pass must keep consistent.
///
/// Jobs within a single queue complete in enqueue order. The runner calls
/// [`Self::tick`] once per frame with the current swapchain image index,
/// which is also when the upfill pass advances.
pub struct TransferEngine {
    upload: Fifo<TransferJob>,
    download: Fifo<TransferJob>,
    copy: Fifo<TransferJob>,
    dup_dats: Vec<DatHandle>,
    worker_count: usize,
}

impl TransferEngine {
    /// Create an engine sized for a `worker_count`-wide pool (from
    /// `DVZ_NUM_THREADS`/`RunnerConfig`). Each of the three FIFOs is
    /// drained by its own dedicated worker thread per [`Self::tick`] call
    /// regardless of `worker_count` — jobs within one FIFO must complete in
    /// enqueue order, so widening a single queue's worker count would only
    /// add contention, not throughput. `worker_count` is kept as the
    /// configured width callers can read back via [`Self::worker_count`].
    pub fn new(worker_count: usize) -> Self {
        Self {
            upload: Fifo::new(),
            download: Fifo::new(),
            copy: Fifo::new(),
            dup_dats: Vec::new(),
            worker_count: worker_count.max(1),
        }
    }

    /// Configured worker count.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Register a dup-Dat so the upfill pass tracks it.
    pub fn register_dup(&mut self, handle: DatHandle) {
        self.dup_dats.push(handle);
    }

    /// Stop tracking a dup-Dat (call before destroying it).
    pub fn unregister_dup(&mut self, handle: DatHandle) {
        self.dup_dats.retain(|&h| h != handle);
    }

    /// Enqueue a host-to-Dat upload targeting `target_image`'s slice (for
    /// dup-Dats) or the sole slice (otherwise).
    pub fn enqueue_upload(&self, dat: DatHandle, data: Vec<u8>, target_image: usize) {
        self.upload
            .enqueue(TransferJob::new(TransferJobKind::BufferUpload { dat, data }, target_image));
    }

    /// Enqueue a Dat-to-host download, delivered to `callback` once processed.
    pub fn enqueue_download(
        &self,
        dat: DatHandle,
        target_image: usize,
        callback: impl FnOnce(Vec<u8>) + Send + 'static,
    ) {
        self.download.enqueue(TransferJob::with_callback(
            TransferJobKind::BufferDownload { dat },
            target_image,
            callback,
        ));
    }

    /// Enqueue a Dat-to-Dat copy.
    pub fn enqueue_copy(&self, src: DatHandle, dst: DatHandle, target_image: usize) {
        self.copy
            .enqueue(TransferJob::new(TransferJobKind::BufferCopy { src, dst }, target_image));
    }

    /// Enqueue a host-to-texture upload of `data` into `tex`'s sub-region
    /// `[offset, offset+extent)`.
    pub fn enqueue_texture_upload(
        &self,
        tex: TexHandle,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
        data: Vec<u8>,
        target_image: usize,
    ) {
        self.upload
            .enqueue(TransferJob::new(TransferJobKind::TextureUpload { tex, offset, extent, data }, target_image));
    }

    /// Enqueue a texture-to-host download of `tex`'s sub-region
    /// `[offset, offset+extent)`, delivered to `callback` once processed.
    pub fn enqueue_texture_download(
        &self,
        tex: TexHandle,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
        target_image: usize,
        callback: impl FnOnce(Vec<u8>) + Send + 'static,
    ) {
        self.download.enqueue(TransferJob::with_callback(
            TransferJobKind::TextureDownload { tex, offset, extent },
            target_image,
            callback,
        ));
    }

    /// Enqueue a texture-to-texture copy.
    pub fn enqueue_texture_copy(
        &self,
        src: TexHandle,
        src_offset: vk::Offset3D,
        dst: TexHandle,
        dst_offset: vk::Offset3D,
        extent: vk::Extent3D,
        target_image: usize,
    ) {
        self.copy.enqueue(TransferJob::new(
            TransferJobKind::TextureCopy { src, src_offset, dst, dst_offset, extent },
            target_image,
        ));
    }

    /// Drain all three queues against `resources`, then run the upfill pass
    /// for `current_image`. Called once per frame from the runner's
    /// per-frame transfer-flush Main event. `context` backs the one-shot
    /// command buffers texture jobs need for layout transitions and copies.
    ///
    /// Each queue is drained by its own background worker thread for the
    /// duration of this call, so the jobs themselves — and any Vulkan waits
    /// they perform — never run on the caller's thread. `resources` is
    /// shared between the three workers behind a mutex, since the
    /// allocator's buffer table and handle maps aren't internally
    /// synchronized; genuine concurrency still comes from the three queues
    /// running on distinct threads rather than being drained one at a time
    /// inline.
    pub fn tick(
        &mut self,
        context: &VulkanContext,
        current_image: usize,
        resources: &mut ResourceManager,
    ) -> Result<(), TransferError> {
        let this: &Self = self;
        let resources_lock = Mutex::new(resources);

        let (upload_result, copy_result, download_result) = std::thread::scope(|scope| {
            let upload_handle = scope.spawn(|| this.drain_upload(context, &resources_lock));
            let copy_handle = scope.spawn(|| this.drain_copy(context, &resources_lock));
            let download_handle = scope.spawn(|| this.drain_download(context, &resources_lock));
            (
                upload_handle.join().expect("upload worker thread panicked"),
                copy_handle.join().expect("copy worker thread panicked"),
                download_handle.join().expect("download worker thread panicked"),
            )
        });
        upload_result?;
        copy_result?;
        download_result?;

        let mut guard = resources_lock.lock().expect("transfer resource lock poisoned");
        this.run_upfill(current_image, &mut *guard)?;
        Ok(())
    }

    fn drain_upload(&self, context: &VulkanContext, resources: &Mutex<&mut ResourceManager>) -> Result<(), TransferError> {
        while let Some(job) = self.upload.try_dequeue() {
            let mut guard = resources.lock().expect("transfer resource lock poisoned");
            self.run_upload(context, job, &mut *guard)?;
        }
        Ok(())
    }

    fn drain_copy(&self, context: &VulkanContext, resources: &Mutex<&mut ResourceManager>) -> Result<(), TransferError> {
        while let Some(job) = self.copy.try_dequeue() {
            let mut guard = resources.lock().expect("transfer resource lock poisoned");
            self.run_copy(context, job, &mut *guard)?;
        }
        Ok(())
    }

    fn drain_download(&self, context: &VulkanContext, resources: &Mutex<&mut ResourceManager>) -> Result<(), TransferError> {
        while let Some(job) = self.download.try_dequeue() {
            let mut guard = resources.lock().expect("transfer resource lock poisoned");
            self.run_download(context, job, &mut *guard)?;
        }
        Ok(())
    }

    fn run_upload(
        &self,
        context: &VulkanContext,
        job: TransferJob,
        resources: &mut ResourceManager,
    ) -> Result<(), TransferError> {
        match job.kind {
            TransferJobKind::BufferUpload { dat, data } => {
                resources.upload_dat(context, dat, job.target_image, &data)?;
                Ok(())
            }
            TransferJobKind::TextureUpload { tex, offset, extent, data } => {
                resources.upload_tex(context, tex, offset, extent, &data)?;
                Ok(())
            }
            _ => Err(TransferError::Invalid("non-upload job found in upload queue".into())),
        }
    }

    fn run_copy(
        &self,
        context: &VulkanContext,
        job: TransferJob,
        resources: &mut ResourceManager,
    ) -> Result<(), TransferError> {
        match job.kind {
            TransferJobKind::BufferCopy { src, dst } => {
                let bytes = resources.download_dat(context, src)?;
                resources.upload_dat(context, dst, job.target_image, &bytes)?;
                Ok(())
            }
            TransferJobKind::TextureCopy { src, src_offset, dst, dst_offset, extent } => {
                resources.copy_tex(context, src, src_offset, dst, dst_offset, extent)?;
                Ok(())
            }
            _ => Err(TransferError::Invalid("non-copy job found in copy queue".into())),
        }
    }

    fn run_download(
        &self,
        context: &VulkanContext,
        job: TransferJob,
        resources: &mut ResourceManager,
    ) -> Result<(), TransferError> {
        match job.kind {
            TransferJobKind::BufferDownload { dat } => {
                let bytes = resources.download_dat(context, dat)?;
                if let Some(callback) = job.callback {
                    callback(bytes);
                }
                Ok(())
            }
            TransferJobKind::TextureDownload { tex, offset, extent } => {
                let bytes = resources.download_tex(context, tex, offset, extent)?;
                if let Some(callback) = job.callback {
                    callback(bytes);
                }
                Ok(())
            }
            _ => Err(TransferError::Invalid("non-download job found in download queue".into())),
        }
    }

    /// For every registered dup-Dat with a stale slice matching
    /// `current_image`, copy from a consistent slice into it — the
    /// "upfill" propagation that spreads one logical write across
    /// `swapchain-image-count` frames without a read-after-write hazard.
    fn run_upfill(&self, current_image: usize, resources: &mut ResourceManager) -> Result<(), TransferError> {
        for &handle in &self.dup_dats {
            let stale = resources.stale_slices(handle);
            if !stale.contains(&current_image) {
                continue;
            }
            let slice_count = match resources.dat(handle) {
                Some(dat) => dat.slice_count(),
                None => continue,
            };
            let source = (0..slice_count).find(|i| !stale.contains(i));
            if let Some(source) = source {
                resources.propagate_dup(handle, source, current_image)?;
            }
        }
        Ok(())
    }
}

//! Instance, physical device selection, and logical device creation.

use std::ffi::{CStr, CString};

use ash::{vk, Entry};
use thiserror::Error;

use crate::core::config::VulkanRendererConfig;

/// Errors surfaced by the Vulkan wrapper layer.
#[derive(Error, Debug)]
pub enum VulkanError {
    /// A raw Vulkan API call returned a non-success result.
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Instance, device, or surface setup failed before any API call could be blamed.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    /// No physical device on the system satisfies the renderer's requirements.
    #[error("no suitable physical device found")]
    NoSuitableDevice,

    /// The device reports no memory type matching the requested properties.
    #[error("no suitable memory type found")]
    NoSuitableMemoryType,

    /// The Vulkan device was lost (`VK_ERROR_DEVICE_LOST`).
    #[error("device lost")]
    DeviceLost,
}

/// Result alias for Vulkan wrapper operations.
pub type VulkanResult<T> = Result<T, VulkanError>;

impl From<vk::Result> for VulkanError {
    fn from(result: vk::Result) -> Self {
        if result == vk::Result::ERROR_DEVICE_LOST {
            VulkanError::DeviceLost
        } else {
            VulkanError::Api(result)
        }
    }
}

/// Queue family indices resolved during device selection.
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilies {
    /// Family supporting graphics + compute + transfer.
    pub graphics: u32,
    /// Family supporting presentation to the surface (may equal `graphics`).
    pub present: u32,
}

/// Physical device and its resolved capabilities.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// The physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (limits, name, type).
    pub properties: vk::PhysicalDeviceProperties,
    /// Device memory properties (heap/type table used by the allocator).
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Resolved queue family indices.
    pub queue_families: QueueFamilies,
}

/// Owns the Vulkan instance, logical device, and queues. Everything else in
/// the engine borrows a `&VulkanContext` rather than talking to `ash`
/// directly.
pub struct VulkanContext {
    entry: Entry,
    instance: ash::Instance,
    physical_device: PhysicalDeviceInfo,
    device: ash::Device,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
}

impl VulkanContext {
    /// Create an instance and logical device for `config`, selecting the
    /// surface-compatible physical device the loader reports first.
    ///
    /// Surface compatibility checks (`get_physical_device_surface_support`)
    /// are deferred to [`crate::vk::Surface`]; this constructor alone picks
    /// a device with a graphics-capable queue family.
    pub fn new(config: &VulkanRendererConfig, required_extensions: &[*const i8]) -> VulkanResult<Self> {
        log::debug!("creating Vulkan entry");
        let entry = unsafe { Entry::load().map_err(|e| VulkanError::InitializationFailed(e.to_string()))? };

        let app_name = CString::new(config.application_name.as_str())
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;
        let (major, minor, patch) = config.application_version;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(&app_name)
            .api_version(vk::API_VERSION_1_2);

        let validation_layer = CString::new("VK_LAYER_KHRONOS_validation").unwrap();
        let mut layer_ptrs = Vec::new();
        if config.enable_validation.unwrap_or(false) {
            layer_ptrs.push(validation_layer.as_ptr());
        }

        let instance_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(required_extensions)
            .enabled_layer_names(&layer_ptrs);

        log::info!("creating Vulkan instance '{}'", config.application_name);
        let instance = unsafe {
            entry
                .create_instance(&instance_info, None)
                .map_err(VulkanError::from)?
        };

        let physical_device = Self::select_physical_device(&instance)?;
        log::info!(
            "selected physical device: {:?}",
            unsafe { CStr::from_ptr(physical_device.properties.device_name.as_ptr()) }
        );

        let (device, graphics_queue, present_queue) = Self::create_logical_device(&instance, &physical_device)?;

        Ok(Self {
            entry,
            instance,
            physical_device,
            device,
            graphics_queue,
            present_queue,
        })
    }

    fn select_physical_device(instance: &ash::Instance) -> VulkanResult<PhysicalDeviceInfo> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(VulkanError::from)?
        };

        for device in devices {
            let properties = unsafe { instance.get_physical_device_properties(device) };
            let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
            let queue_family_props = unsafe { instance.get_physical_device_queue_family_properties(device) };

            let graphics = queue_family_props
                .iter()
                .enumerate()
                .find(|(_, props)| props.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(idx, _)| idx as u32);

            if let Some(graphics) = graphics {
                return Ok(PhysicalDeviceInfo {
                    device,
                    properties,
                    memory_properties,
                    // Present support is re-validated once a surface exists; assume shared
                    // queue family until `Surface::supports_present` says otherwise.
                    queue_families: QueueFamilies {
                        graphics,
                        present: graphics,
                    },
                });
            }
        }

        Err(VulkanError::NoSuitableDevice)
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: &PhysicalDeviceInfo,
    ) -> VulkanResult<(ash::Device, vk::Queue, vk::Queue)> {
        let mut unique_families = vec![physical_device.queue_families.graphics];
        if physical_device.queue_families.present != physical_device.queue_families.graphics {
            unique_families.push(physical_device.queue_families.present);
        }

        let priorities = [1.0f32];
        let queue_infos: Vec<_> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let swapchain_ext = CString::new("VK_KHR_swapchain").unwrap();
        let device_extensions = [swapchain_ext.as_ptr()];

        let features = vk::PhysicalDeviceFeatures::builder();
        let device_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&device_extensions)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .create_device(physical_device.device, &device_info, None)
                .map_err(VulkanError::from)?
        };

        let graphics_queue = unsafe { device.get_device_queue(physical_device.queue_families.graphics, 0) };
        let present_queue = unsafe { device.get_device_queue(physical_device.queue_families.present, 0) };

        Ok((device, graphics_queue, present_queue))
    }

    /// The loader entry point (needed to create a surface).
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// The Vulkan instance.
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// The selected physical device and its properties.
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// The logical device all resources are created against.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// The graphics/transfer queue.
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// The present queue (identical to `graphics_queue` on most hardware).
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Block until the device has no outstanding work. Called only during
    /// teardown and swapchain recreation.
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device.device_wait_idle().map_err(VulkanError::from) }
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        log::debug!("destroying Vulkan device and instance");
        unsafe {
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

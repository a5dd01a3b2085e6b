//! GPU device bootstrap.
//!
//! [`GpuResources`] bundles the wgpu instance, adapter, device and queue. It
//! is created explicitly and handed to a [`WgpuBackend`](crate::WgpuBackend);
//! there is no process-wide context.

use tracing::{debug, info};

use crate::error::{RenderError, RenderResult};
use crate::logging::targets;

/// How [`GpuResources::request`] picks an adapter and device.
#[derive(Debug, Clone)]
pub struct GraphicsConfig {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    /// Text only needs the downlevel limits; raise these if the device is shared.
    pub required_limits: wgpu::Limits,
    /// Turn on wgpu validation (defaults to on in debug builds).
    pub debug_validation: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::PRIMARY,
            power_preference: wgpu::PowerPreference::LowPower,
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            debug_validation: cfg!(debug_assertions),
        }
    }
}

impl GraphicsConfig {
    #[must_use]
    pub fn backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    #[must_use]
    pub fn power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    #[must_use]
    pub fn debug_validation(mut self, enabled: bool) -> Self {
        self.debug_validation = enabled;
        self
    }
}

/// GPU handles shared by every text block drawn through one backend.
///
/// Wrap in an `Arc` to share the device with the rest of the application.
#[derive(Debug)]
pub struct GpuResources {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuResources {
    /// Request an adapter and device, blocking until both are ready.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable adapter exists or the device request fails.
    pub fn request(config: &GraphicsConfig) -> RenderResult<Self> {
        let flags = if config.debug_validation {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::empty()
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: config.backends,
            flags,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: config.power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        info!(
            target: targets::BACKEND,
            adapter = %info.name,
            backend = ?info.backend,
            "using adapter for text rendering"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("horizon-lattice-bmfont-device"),
                required_features: wgpu::Features::empty(),
                required_limits: config.required_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))?;

        debug!(target: targets::BACKEND, "created graphics device and queue");

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }
}

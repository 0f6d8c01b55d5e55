/// Errors from bringing up a GPU surface.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceInitError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to open device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture format")]
    UnsupportedSurface,
}

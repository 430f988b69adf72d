// virtegl/src/platform/egl/extensions.rs
//
//! Native extension probing and the extension set exposed to clients.

use crate::GLVersion;

use bitflags::bitflags;
use fnv::FnvHashSet;

/// A snapshot of the native display's extensions, taken once at initialization.
///
/// Capabilities the backend depends on are resolved into fields up front. Anything else can be
/// looked up by name with `has()`.
#[derive(Clone, Debug)]
pub struct ExtensionSet {
    egl_version: GLVersion,
    names: FnvHashSet<String>,
    /// `EGL_EXT_create_context_robustness`.
    pub create_context_robustness: bool,
    /// `EGL_NV_robustness_video_memory_purge`.
    pub robustness_video_memory_purge: bool,
    /// EGL 1.5 or `EGL_KHR_create_context`: contexts accept explicit major/minor versions.
    pub flexible_context_version: bool,
    /// `EGL_KHR_surfaceless_context`.
    pub surfaceless_context: bool,
    /// `EGL_KHR_no_config_context`.
    pub no_config_context: bool,
    /// `EGL_EXT_pixel_format_float`.
    pub pixel_format_float: bool,
    /// `EGL_KHR_gl_colorspace`.
    pub gl_colorspace: bool,
}

impl ExtensionSet {
    /// Parses a space-separated extension string.
    pub fn new(egl_version: GLVersion, extensions: &str) -> ExtensionSet {
        let names: FnvHashSet<String> = extensions.split_whitespace().map(str::to_owned).collect();
        let has = |name: &str| names.contains(name);

        ExtensionSet {
            egl_version,
            create_context_robustness: has("EGL_EXT_create_context_robustness"),
            robustness_video_memory_purge: has("EGL_NV_robustness_video_memory_purge"),
            flexible_context_version: egl_version >= GLVersion::new(1, 5)
                || has("EGL_KHR_create_context"),
            surfaceless_context: has("EGL_KHR_surfaceless_context"),
            no_config_context: has("EGL_KHR_no_config_context"),
            pixel_format_float: has("EGL_EXT_pixel_format_float"),
            gl_colorspace: has("EGL_KHR_gl_colorspace"),
            names,
        }
    }

    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[inline]
    pub fn egl_version(&self) -> GLVersion {
        self.egl_version
    }

    /// Derives the client-visible extensions.
    ///
    /// `virtualized` enables surfaceless support even when the driver lacks it, since the shared
    /// context can stay bound to whatever surface it last had.
    pub fn display_extensions(&self, virtualized: bool) -> DisplayExtensions {
        let mut extensions = DisplayExtensions::DISPLAY_TEXTURE_SHARE_GROUP
            | DisplayExtensions::DISPLAY_SEMAPHORE_SHARE_GROUP
            | DisplayExtensions::SWAP_BUFFERS_WITH_DAMAGE
            | DisplayExtensions::EXTERNAL_CONTEXT_AND_SURFACE;

        let probed = [
            (DisplayExtensions::CREATE_CONTEXT_ROBUSTNESS, self.create_context_robustness),
            (DisplayExtensions::PRESENTATION_TIME, self.has("EGL_ANDROID_presentation_time")),
            (DisplayExtensions::IMAGE, self.has("EGL_KHR_image")),
            (DisplayExtensions::IMAGE_BASE, self.has("EGL_KHR_image_base")),
            (DisplayExtensions::GL_TEXTURE_2D_IMAGE, self.has("EGL_KHR_gl_texture_2D_image")),
            (
                DisplayExtensions::GL_TEXTURE_CUBEMAP_IMAGE,
                self.has("EGL_KHR_gl_texture_cubemap_image"),
            ),
            (DisplayExtensions::GL_TEXTURE_3D_IMAGE, self.has("EGL_KHR_gl_texture_3D_image")),
            (
                DisplayExtensions::GL_RENDERBUFFER_IMAGE,
                self.has("EGL_KHR_gl_renderbuffer_image"),
            ),
            (DisplayExtensions::PIXEL_FORMAT_FLOAT, self.pixel_format_float),
            (DisplayExtensions::GL_COLORSPACE, self.gl_colorspace),
            (
                DisplayExtensions::IMAGE_NATIVE_BUFFER,
                self.has("EGL_ANDROID_image_native_buffer"),
            ),
            (
                DisplayExtensions::GET_FRAME_TIMESTAMPS,
                self.has("EGL_ANDROID_get_frame_timestamps"),
            ),
            (
                DisplayExtensions::FENCE_SYNC,
                self.egl_version >= GLVersion::new(1, 5) || self.has("EGL_KHR_fence_sync"),
            ),
            (
                DisplayExtensions::WAIT_SYNC,
                self.egl_version >= GLVersion::new(1, 5) || self.has("EGL_KHR_wait_sync"),
            ),
            (
                DisplayExtensions::GET_NATIVE_CLIENT_BUFFER_ANDROID,
                self.has("EGL_ANDROID_get_native_client_buffer"),
            ),
            (
                DisplayExtensions::CREATE_NATIVE_CLIENT_BUFFER_ANDROID,
                self.has("EGL_ANDROID_create_native_client_buffer"),
            ),
            (
                DisplayExtensions::NATIVE_FENCE_SYNC_ANDROID,
                self.has("EGL_ANDROID_native_fence_sync"),
            ),
            (DisplayExtensions::NO_CONFIG_CONTEXT, self.no_config_context),
            (
                DisplayExtensions::FRAMEBUFFER_TARGET_ANDROID,
                self.has("EGL_ANDROID_framebuffer_target"),
            ),
            (DisplayExtensions::IMAGE_DMA_BUF_IMPORT, self.has("EGL_EXT_image_dma_buf_import")),
            (
                DisplayExtensions::IMAGE_DMA_BUF_IMPORT_MODIFIERS,
                self.has("EGL_EXT_image_dma_buf_import_modifiers"),
            ),
            (
                DisplayExtensions::ROBUSTNESS_VIDEO_MEMORY_PURGE_NV,
                self.robustness_video_memory_purge,
            ),
            (DisplayExtensions::SURFACELESS_CONTEXT, self.surfaceless_context || virtualized),
        ];
        for (flag, present) in probed {
            extensions.set(flag, present);
        }

        // The colorspace variants are meaningless without the base extension.
        if self.gl_colorspace {
            let colorspaces = [
                (
                    DisplayExtensions::GL_COLORSPACE_DISPLAY_P3_LINEAR,
                    "EGL_EXT_gl_colorspace_display_p3_linear",
                ),
                (
                    DisplayExtensions::GL_COLORSPACE_DISPLAY_P3,
                    "EGL_EXT_gl_colorspace_display_p3",
                ),
                (DisplayExtensions::GL_COLORSPACE_SCRGB, "EGL_EXT_gl_colorspace_scrgb"),
                (
                    DisplayExtensions::GL_COLORSPACE_SCRGB_LINEAR,
                    "EGL_EXT_gl_colorspace_scrgb_linear",
                ),
                (
                    DisplayExtensions::GL_COLORSPACE_DISPLAY_P3_PASSTHROUGH,
                    "EGL_EXT_gl_colorspace_display_p3_passthrough",
                ),
                (DisplayExtensions::IMAGE_GL_COLORSPACE, "EGL_EXT_image_gl_colorspace"),
            ];
            for (flag, name) in colorspaces {
                extensions.set(flag, self.has(name));
            }
        }

        extensions
    }
}

bitflags! {
    /// Display extensions advertised to clients of the backend.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DisplayExtensions: u64 {
        const CREATE_CONTEXT_ROBUSTNESS             = 1 << 0;
        /// Never set. Partial presentation isn't implemented by the surfaces.
        const POST_SUB_BUFFER                       = 1 << 1;
        const PRESENTATION_TIME                     = 1 << 2;
        const DISPLAY_TEXTURE_SHARE_GROUP           = 1 << 3;
        const DISPLAY_SEMAPHORE_SHARE_GROUP         = 1 << 4;
        /// Always set. Presentation falls back to a regular swap when the driver lacks it.
        const SWAP_BUFFERS_WITH_DAMAGE              = 1 << 5;
        const IMAGE                                 = 1 << 6;
        const IMAGE_BASE                            = 1 << 7;
        const GL_TEXTURE_2D_IMAGE                   = 1 << 8;
        const GL_TEXTURE_CUBEMAP_IMAGE              = 1 << 9;
        const GL_TEXTURE_3D_IMAGE                   = 1 << 10;
        const GL_RENDERBUFFER_IMAGE                 = 1 << 11;
        const PIXEL_FORMAT_FLOAT                    = 1 << 12;
        const GL_COLORSPACE                         = 1 << 13;
        const GL_COLORSPACE_DISPLAY_P3_LINEAR       = 1 << 14;
        const GL_COLORSPACE_DISPLAY_P3              = 1 << 15;
        const GL_COLORSPACE_SCRGB                   = 1 << 16;
        const GL_COLORSPACE_SCRGB_LINEAR            = 1 << 17;
        const GL_COLORSPACE_DISPLAY_P3_PASSTHROUGH  = 1 << 18;
        const IMAGE_GL_COLORSPACE                   = 1 << 19;
        const IMAGE_NATIVE_BUFFER                   = 1 << 20;
        const GET_FRAME_TIMESTAMPS                  = 1 << 21;
        const FENCE_SYNC                            = 1 << 22;
        const WAIT_SYNC                             = 1 << 23;
        const GET_NATIVE_CLIENT_BUFFER_ANDROID      = 1 << 24;
        const CREATE_NATIVE_CLIENT_BUFFER_ANDROID   = 1 << 25;
        const NATIVE_FENCE_SYNC_ANDROID             = 1 << 26;
        const NO_CONFIG_CONTEXT                     = 1 << 27;
        const SURFACELESS_CONTEXT                   = 1 << 28;
        const FRAMEBUFFER_TARGET_ANDROID            = 1 << 29;
        const IMAGE_DMA_BUF_IMPORT                  = 1 << 30;
        const IMAGE_DMA_BUF_IMPORT_MODIFIERS        = 1 << 31;
        const ROBUSTNESS_VIDEO_MEMORY_PURGE_NV      = 1 << 32;
        const EXTERNAL_CONTEXT_AND_SURFACE          = 1 << 33;
    }
}

/// Display capabilities advertised to clients of the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Caps {
    /// Non-power-of-two textures. Always available, since every context is at least ES 2.0.
    pub texture_npot: bool,
}

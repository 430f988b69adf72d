// virtegl/src/platform/egl/config.rs
//
//! Enumeration and classification of native framebuffer configurations.

use super::error::ToWindowingApiError;
use super::extensions::ExtensionSet;
use super::ffi::{EGL_COLOR_COMPONENT_TYPE_EXT, EGL_COLOR_COMPONENT_TYPE_FIXED_EXT};
use super::functions::NativeEGL;
use crate::egl;
use crate::egl::types::{EGLAttrib, EGLConfig, EGLenum, EGLint};
use crate::{AttributeMap, AttributeVector, Error};

use fnv::FnvHashMap;
use log::{debug, error};
use std::slice;

const RGB_CHANNEL_BIT_DEPTH: EGLint = 8;
const DEPTH_SIZE: EGLint = 24;
const STENCIL_SIZE: EGLint = 8;

/// The color format of a config's color buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderTargetFormat {
    RGBA8,
    RGB8,
    RGB565,
    RGB5A1,
    RGBA4,
    RGB10A2,
}

impl RenderTargetFormat {
    /// Maps exact red, green, blue and alpha bit depths to a format.
    pub fn classify(red: EGLint, green: EGLint, blue: EGLint, alpha: EGLint) -> Option<Self> {
        match (red, green, blue, alpha) {
            (8, 8, 8, 8) => Some(RenderTargetFormat::RGBA8),
            (8, 8, 8, 0) => Some(RenderTargetFormat::RGB8),
            (5, 6, 5, 0) => Some(RenderTargetFormat::RGB565),
            (5, 5, 5, 1) => Some(RenderTargetFormat::RGB5A1),
            (4, 4, 4, 4) => Some(RenderTargetFormat::RGBA4),
            (10, 10, 10, 2) => Some(RenderTargetFormat::RGB10A2),
            _ => None,
        }
    }

    /// The sized GL internal format.
    pub fn to_gl_enum(self) -> u32 {
        match self {
            RenderTargetFormat::RGBA8 => glow::RGBA8,
            RenderTargetFormat::RGB8 => glow::RGB8,
            RenderTargetFormat::RGB565 => glow::RGB565,
            RenderTargetFormat::RGB5A1 => glow::RGB5_A1,
            RenderTargetFormat::RGBA4 => glow::RGBA4,
            RenderTargetFormat::RGB10A2 => glow::RGB10_A2,
        }
    }
}

/// The format of a config's depth and stencil buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthStencilFormat {
    None,
    D16,
    D24,
    D24S8,
    S8,
}

impl DepthStencilFormat {
    pub fn classify(depth: EGLint, stencil: EGLint) -> Option<Self> {
        match (depth, stencil) {
            (0, 0) => Some(DepthStencilFormat::None),
            (16, 0) => Some(DepthStencilFormat::D16),
            (24, 0) => Some(DepthStencilFormat::D24),
            (24, 8) => Some(DepthStencilFormat::D24S8),
            (0, 8) => Some(DepthStencilFormat::S8),
            _ => None,
        }
    }

    /// The sized GL internal format, or `GL_ZERO` if there is no depth or stencil buffer.
    pub fn to_gl_enum(self) -> u32 {
        match self {
            DepthStencilFormat::None => glow::ZERO,
            DepthStencilFormat::D16 => glow::DEPTH_COMPONENT16,
            DepthStencilFormat::D24 => glow::DEPTH_COMPONENT24,
            DepthStencilFormat::D24S8 => glow::DEPTH24_STENCIL8,
            DepthStencilFormat::S8 => glow::STENCIL_INDEX8,
        }
    }
}

/// A classified native config, as exposed to clients.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayConfig {
    pub render_target_format: RenderTargetFormat,
    pub depth_stencil_format: DepthStencilFormat,
    /// The identifier assigned by the display, starting at 1.
    pub config_id: EGLint,
    /// The identifier the native driver reported.
    pub native_config_id: EGLint,
    pub buffer_size: EGLint,
    pub red_size: EGLint,
    pub green_size: EGLint,
    pub blue_size: EGLint,
    pub luminance_size: EGLint,
    pub alpha_size: EGLint,
    pub alpha_mask_size: EGLint,
    pub bind_to_texture_rgb: bool,
    pub bind_to_texture_rgba: bool,
    pub color_buffer_type: EGLint,
    pub color_component_type: EGLint,
    pub config_caveat: EGLint,
    pub conformant: EGLint,
    pub depth_size: EGLint,
    pub stencil_size: EGLint,
    pub level: EGLint,
    pub max_pbuffer_width: EGLint,
    pub max_pbuffer_height: EGLint,
    pub max_pbuffer_pixels: EGLint,
    pub max_swap_interval: EGLint,
    pub min_swap_interval: EGLint,
    pub native_renderable: bool,
    pub native_visual_id: EGLint,
    pub native_visual_type: EGLint,
    pub renderable_type: EGLint,
    pub sample_buffers: EGLint,
    pub samples: EGLint,
    /// Never includes `EGL_PIXMAP_BIT`.
    pub surface_type: EGLint,
    pub transparent_type: EGLint,
    pub transparent_red_value: EGLint,
    pub transparent_green_value: EGLint,
    pub transparent_blue_value: EGLint,
}

/// Configs accepted by a display, in enumeration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigSet {
    configs: Vec<DisplayConfig>,
}

impl ConfigSet {
    /// Adds a config, assigning it the next identifier. Returns that identifier.
    pub fn add(&mut self, mut config: DisplayConfig) -> EGLint {
        let config_id = self.configs.len() as EGLint + 1;
        config.config_id = config_id;
        self.configs.push(config);
        config_id
    }

    pub fn get(&self, config_id: EGLint) -> Option<&DisplayConfig> {
        if config_id < 1 {
            return None;
        }
        self.configs.get(config_id as usize - 1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<DisplayConfig> {
        self.configs.iter()
    }
}

impl<'a> IntoIterator for &'a ConfigSet {
    type Item = &'a DisplayConfig;
    type IntoIter = slice::Iter<'a, DisplayConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}

/// The config filter every enumeration starts from.
pub(crate) fn base_config_attributes(renderable_type: EGLint) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    attributes.insert(egl::COLOR_BUFFER_TYPE as EGLint, egl::RGB_BUFFER as EGLAttrib);
    attributes.insert(
        egl::SURFACE_TYPE as EGLint,
        (egl::WINDOW_BIT | egl::PBUFFER_BIT) as EGLAttrib,
    );
    attributes.insert(egl::RENDERABLE_TYPE as EGLint, renderable_type as EGLAttrib);
    attributes
}

/// The base filter narrowed to RGBA8 color with a D24S8 depth-stencil buffer.
pub(crate) fn format_config_attributes(renderable_type: EGLint) -> AttributeMap {
    let mut attributes = base_config_attributes(renderable_type);
    for attribute in [egl::RED_SIZE, egl::GREEN_SIZE, egl::BLUE_SIZE, egl::ALPHA_SIZE] {
        attributes.insert(attribute as EGLint, RGB_CHANNEL_BIT_DEPTH as EGLAttrib);
    }
    attributes.insert(egl::DEPTH_SIZE as EGLint, DEPTH_SIZE as EGLAttrib);
    attributes.insert(egl::STENCIL_SIZE as EGLint, STENCIL_SIZE as EGLAttrib);
    attributes
}

/// Enumerates native configs and remembers which native config each accepted one came from.
pub(crate) struct ConfigCatalog {
    config_attributes: AttributeVector,
    // Display config ID to native config ID.
    config_ids: FnvHashMap<EGLint, EGLint>,
}

impl ConfigCatalog {
    pub(crate) fn new(config_attributes: &AttributeMap) -> ConfigCatalog {
        ConfigCatalog {
            config_attributes: config_attributes.to_int_vector(),
            config_ids: FnvHashMap::default(),
        }
    }

    pub(crate) fn generate(
        &mut self,
        native: &dyn NativeEGL,
        extensions: &ExtensionSet,
    ) -> Result<ConfigSet, Error> {
        self.config_ids.clear();

        let config_count = match native.config_count(&self.config_attributes) {
            Some(config_count) => config_count,
            None => {
                let err = native.get_error().to_windowing_api_error();
                return Err(Error::PixelFormatSelectionFailed(err));
            }
        };
        if config_count <= 0 {
            return Err(Error::NoPixelFormatFound);
        }
        let native_configs = match native.choose_config(&self.config_attributes, config_count) {
            Some(native_configs) => native_configs,
            None => {
                let err = native.get_error().to_windowing_api_error();
                return Err(Error::PixelFormatSelectionFailed(err));
            }
        };

        let mut config_set = ConfigSet::default();
        for native_config in native_configs {
            let config = match read_config(native, native_config, extensions)? {
                Some(config) => config,
                None => continue,
            };
            let native_config_id = config.native_config_id;
            let config_id = config_set.add(config);
            self.config_ids.insert(config_id, native_config_id);
        }

        debug!(
            "accepted {} of {} native configs",
            config_set.len(),
            config_count
        );
        Ok(config_set)
    }

    /// The native config ID behind a display config ID.
    #[inline]
    pub(crate) fn native_config_id(&self, config_id: EGLint) -> Option<EGLint> {
        self.config_ids.get(&config_id).copied()
    }

    /// Selects the native config behind a display config ID.
    pub(crate) fn native_config(
        &self,
        native: &dyn NativeEGL,
        config_id: EGLint,
    ) -> Result<EGLConfig, Error> {
        let native_config_id = self.native_config_id(config_id).ok_or(Error::UnknownConfig)?;
        let config_attributes = [
            egl::CONFIG_ID as EGLint,
            native_config_id,
            egl::NONE as EGLint,
        ];
        match native.choose_config(&config_attributes, 1) {
            None => {
                let err = native.get_error().to_windowing_api_error();
                Err(Error::PixelFormatSelectionFailed(err))
            }
            Some(configs) => configs.first().copied().ok_or(Error::NoPixelFormatFound),
        }
    }
}

fn get_config_attr(
    native: &dyn NativeEGL,
    native_config: EGLConfig,
    attribute: EGLenum,
) -> Result<EGLint, Error> {
    native
        .get_config_attrib(native_config, attribute as EGLint)
        .ok_or_else(|| {
            let err = native.get_error().to_windowing_api_error();
            Error::PixelFormatSelectionFailed(err)
        })
}

// Reads and classifies one native config. Returns `None` if the config can't be exposed.
fn read_config(
    native: &dyn NativeEGL,
    native_config: EGLConfig,
    extensions: &ExtensionSet,
) -> Result<Option<DisplayConfig>, Error> {
    let get = |attribute| get_config_attr(native, native_config, attribute);

    let color_buffer_type = get(egl::COLOR_BUFFER_TYPE)?;
    if color_buffer_type != egl::RGB_BUFFER as EGLint {
        return Ok(None);
    }

    let (red_size, green_size) = (get(egl::RED_SIZE)?, get(egl::GREEN_SIZE)?);
    let (blue_size, alpha_size) = (get(egl::BLUE_SIZE)?, get(egl::ALPHA_SIZE)?);
    let render_target_format =
        match RenderTargetFormat::classify(red_size, green_size, blue_size, alpha_size) {
            Some(format) => format,
            None => {
                error!(
                    "RGBA({},{},{},{}) not handled",
                    red_size, green_size, blue_size, alpha_size
                );
                return Ok(None);
            }
        };

    let (depth_size, stencil_size) = (get(egl::DEPTH_SIZE)?, get(egl::STENCIL_SIZE)?);
    let depth_stencil_format = match DepthStencilFormat::classify(depth_size, stencil_size) {
        Some(format) => format,
        None => return Ok(None),
    };

    let color_component_type = if extensions.pixel_format_float {
        get(EGL_COLOR_COMPONENT_TYPE_EXT)?
    } else {
        EGL_COLOR_COMPONENT_TYPE_FIXED_EXT as EGLint
    };

    Ok(Some(DisplayConfig {
        render_target_format,
        depth_stencil_format,
        config_id: 0,
        native_config_id: get(egl::CONFIG_ID)?,
        buffer_size: get(egl::BUFFER_SIZE)?,
        red_size,
        green_size,
        blue_size,
        luminance_size: get(egl::LUMINANCE_SIZE)?,
        alpha_size,
        alpha_mask_size: get(egl::ALPHA_MASK_SIZE)?,
        bind_to_texture_rgb: get(egl::BIND_TO_TEXTURE_RGB)? != egl::FALSE as EGLint,
        bind_to_texture_rgba: get(egl::BIND_TO_TEXTURE_RGBA)? != egl::FALSE as EGLint,
        color_buffer_type,
        color_component_type,
        config_caveat: get(egl::CONFIG_CAVEAT)?,
        conformant: get(egl::CONFORMANT)?,
        depth_size,
        stencil_size,
        level: get(egl::LEVEL)?,
        max_pbuffer_width: get(egl::MAX_PBUFFER_WIDTH)?,
        max_pbuffer_height: get(egl::MAX_PBUFFER_HEIGHT)?,
        max_pbuffer_pixels: get(egl::MAX_PBUFFER_PIXELS)?,
        max_swap_interval: get(egl::MAX_SWAP_INTERVAL)?,
        min_swap_interval: get(egl::MIN_SWAP_INTERVAL)?,
        native_renderable: get(egl::NATIVE_RENDERABLE)? != egl::FALSE as EGLint,
        native_visual_id: get(egl::NATIVE_VISUAL_ID)?,
        native_visual_type: get(egl::NATIVE_VISUAL_TYPE)?,
        renderable_type: get(egl::RENDERABLE_TYPE)?,
        sample_buffers: get(egl::SAMPLE_BUFFERS)?,
        samples: get(egl::SAMPLES)?,
        surface_type: get(egl::SURFACE_TYPE)? & !(egl::PIXMAP_BIT as EGLint),
        transparent_type: get(egl::TRANSPARENT_TYPE)?,
        transparent_red_value: get(egl::TRANSPARENT_RED_VALUE)?,
        transparent_green_value: get(egl::TRANSPARENT_GREEN_VALUE)?,
        transparent_blue_value: get(egl::TRANSPARENT_BLUE_VALUE)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::{DepthStencilFormat, RenderTargetFormat};

    #[test]
    fn only_canonical_color_depths_classify() {
        assert_eq!(
            RenderTargetFormat::classify(8, 8, 8, 8),
            Some(RenderTargetFormat::RGBA8)
        );
        assert_eq!(
            RenderTargetFormat::classify(5, 6, 5, 0),
            Some(RenderTargetFormat::RGB565)
        );
        assert_eq!(
            RenderTargetFormat::classify(10, 10, 10, 2),
            Some(RenderTargetFormat::RGB10A2)
        );

        let accepted = [
            (8, 8, 8, 8),
            (8, 8, 8, 0),
            (5, 6, 5, 0),
            (5, 5, 5, 1),
            (4, 4, 4, 4),
            (10, 10, 10, 2),
        ];
        let depths = [0, 1, 2, 4, 5, 6, 8, 10, 16];
        for &r in &depths {
            for &g in &depths {
                for &b in &depths {
                    for &a in &depths {
                        let expected = accepted.contains(&(r, g, b, a));
                        assert_eq!(
                            RenderTargetFormat::classify(r, g, b, a).is_some(),
                            expected,
                            "RGBA({},{},{},{})",
                            r,
                            g,
                            b,
                            a
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn only_canonical_depth_stencil_combinations_classify() {
        let accepted = [(0, 0), (16, 0), (24, 0), (24, 8), (0, 8)];
        for depth in [0, 8, 16, 24, 32] {
            for stencil in [0, 1, 8, 16] {
                assert_eq!(
                    DepthStencilFormat::classify(depth, stencil).is_some(),
                    accepted.contains(&(depth, stencil)),
                    "depth {} stencil {}",
                    depth,
                    stencil
                );
            }
        }
        assert_eq!(DepthStencilFormat::None.to_gl_enum(), glow::ZERO);
        assert_eq!(
            DepthStencilFormat::D24S8.to_gl_enum(),
            glow::DEPTH24_STENCIL8
        );
    }
}

// virtegl/src/framebuffer.rs
//
//! Framebuffer attachment points and the resources bound to them.
//!
//! An attachment holds a strong reference to at most one resource (a texture, renderbuffer or
//! surface) along with the sub-resource it targets. Resources are told when they gain or lose an
//! attachment so they can track whether a framebuffer still renders into them.

use euclid::default::Vector2D;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::thread;

/// Per-view viewport offset of a multiview attachment.
pub type Offset = Vector2D<i32>;

/// A resource that can be bound to a framebuffer attachment point.
pub trait AttachmentObject: Send + Sync {
    /// The client-visible name of the resource.
    fn id(&self) -> u32;
    /// Called when an attachment starts referring to this resource.
    fn on_attach(&self);
    /// Called when an attachment stops referring to this resource.
    fn on_detach(&self);
}

/// What kind of resource an attachment point is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentType {
    None,
    Texture,
    Renderbuffer,
    /// A window or pbuffer surface's default framebuffer.
    FramebufferDefault,
}

impl AttachmentType {
    pub fn to_gl_enum(self) -> u32 {
        match self {
            AttachmentType::None => glow::NONE,
            AttachmentType::Texture => glow::TEXTURE,
            AttachmentType::Renderbuffer => glow::RENDERBUFFER,
            AttachmentType::FramebufferDefault => glow::FRAMEBUFFER_DEFAULT,
        }
    }
}

/// The texture target an image index addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureTarget {
    Texture2D,
    Texture2DMultisample,
    Texture2DArray,
    Texture3D,
    CubeMapPositiveX,
    CubeMapNegativeX,
    CubeMapPositiveY,
    CubeMapNegativeY,
    CubeMapPositiveZ,
    CubeMapNegativeZ,
}

impl TextureTarget {
    #[inline]
    pub fn is_cube_map_face(self) -> bool {
        matches!(
            self,
            TextureTarget::CubeMapPositiveX
                | TextureTarget::CubeMapNegativeX
                | TextureTarget::CubeMapPositiveY
                | TextureTarget::CubeMapNegativeY
                | TextureTarget::CubeMapPositiveZ
                | TextureTarget::CubeMapNegativeZ
        )
    }

    /// Whether images of this target are addressed by layer as well as mip level.
    #[inline]
    pub fn is_layered(self) -> bool {
        matches!(self, TextureTarget::Texture2DArray | TextureTarget::Texture3D)
    }

    pub fn to_gl_enum(self) -> u32 {
        match self {
            TextureTarget::Texture2D => glow::TEXTURE_2D,
            TextureTarget::Texture2DMultisample => glow::TEXTURE_2D_MULTISAMPLE,
            TextureTarget::Texture2DArray => glow::TEXTURE_2D_ARRAY,
            TextureTarget::Texture3D => glow::TEXTURE_3D,
            TextureTarget::CubeMapPositiveX => glow::TEXTURE_CUBE_MAP_POSITIVE_X,
            TextureTarget::CubeMapNegativeX => glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
            TextureTarget::CubeMapPositiveY => glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
            TextureTarget::CubeMapNegativeY => glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
            TextureTarget::CubeMapPositiveZ => glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
            TextureTarget::CubeMapNegativeZ => glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
        }
    }
}

/// One image of a texture: a mip level of a target, plus a layer for array and 3D textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageIndex {
    pub target: TextureTarget,
    pub mip_level: i32,
    pub layer_index: Option<i32>,
}

impl ImageIndex {
    #[inline]
    pub fn new(target: TextureTarget, mip_level: i32) -> ImageIndex {
        ImageIndex {
            target,
            mip_level,
            layer_index: None,
        }
    }

    #[inline]
    pub fn layered(target: TextureTarget, mip_level: i32, layer_index: i32) -> ImageIndex {
        ImageIndex {
            target,
            mip_level,
            layer_index: Some(layer_index),
        }
    }
}

/// How the views of a multiview attachment are arranged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiviewLayout {
    None,
    SideBySide,
    Layered,
}

/// A framebuffer attachment point.
///
/// Attachments must be detached before they are dropped.
pub struct FramebufferAttachment {
    attachment_type: AttachmentType,
    binding: u32,
    image_index: Option<ImageIndex>,
    resource: Option<Arc<dyn AttachmentObject>>,
    num_views: i32,
    multiview_layout: MultiviewLayout,
    base_view_index: i32,
    viewport_offsets: Vec<Offset>,
}

impl Default for FramebufferAttachment {
    fn default() -> FramebufferAttachment {
        FramebufferAttachment {
            attachment_type: AttachmentType::None,
            binding: glow::NONE,
            image_index: None,
            resource: None,
            num_views: 1,
            multiview_layout: MultiviewLayout::None,
            base_view_index: 0,
            viewport_offsets: vec![Offset::zero()],
        }
    }
}

impl Drop for FramebufferAttachment {
    fn drop(&mut self) {
        if self.is_attached() && !thread::panicking() {
            panic!("Attachments must be detached before they are dropped!")
        }
    }
}

impl Debug for FramebufferAttachment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("FramebufferAttachment")
            .field("type", &self.attachment_type)
            .field("binding", &self.binding)
            .field("image_index", &self.image_index)
            .field("id", &self.id())
            .field("num_views", &self.num_views)
            .finish()
    }
}

impl PartialEq for FramebufferAttachment {
    fn eq(&self, other: &FramebufferAttachment) -> bool {
        let same_resource = match (&self.resource, &other.resource) {
            (Some(a), Some(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
            (None, None) => true,
            _ => false,
        };
        if !same_resource
            || self.attachment_type != other.attachment_type
            || self.num_views != other.num_views
            || self.multiview_layout != other.multiview_layout
            || self.base_view_index != other.base_view_index
            || self.viewport_offsets != other.viewport_offsets
        {
            return false;
        }
        self.attachment_type != AttachmentType::Texture || self.image_index == other.image_index
    }
}

impl FramebufferAttachment {
    #[inline]
    pub fn new() -> FramebufferAttachment {
        FramebufferAttachment::default()
    }

    /// Binds `resource` to this attachment point. `None` is the same as `detach()`.
    ///
    /// The new resource is notified before the one it replaces, so re-attaching the same resource
    /// never lets its attachment count reach zero.
    pub fn attach(
        &mut self,
        attachment_type: AttachmentType,
        binding: u32,
        image_index: Option<ImageIndex>,
        resource: Option<Arc<dyn AttachmentObject>>,
    ) {
        let resource = match resource {
            Some(resource) => resource,
            None => return self.detach(),
        };

        self.attachment_type = attachment_type;
        self.binding = binding;
        self.image_index = image_index;
        resource.on_attach();
        if let Some(previous) = self.resource.replace(resource) {
            previous.on_detach();
        }
    }

    /// Unbinds the resource, if any, and resets the multiview parameters.
    pub fn detach(&mut self) {
        self.attachment_type = AttachmentType::None;
        if let Some(resource) = self.resource.take() {
            resource.on_detach();
        }
        self.binding = glow::NONE;
        self.image_index = None;
        self.num_views = 1;
        self.multiview_layout = MultiviewLayout::None;
        self.base_view_index = 0;
        self.viewport_offsets.clear();
        self.viewport_offsets.push(Offset::zero());
    }

    /// Renders into `num_views` views, one viewport offset each.
    pub fn set_multiview(
        &mut self,
        layout: MultiviewLayout,
        base_view_index: i32,
        viewport_offsets: Vec<Offset>,
    ) {
        assert!(!viewport_offsets.is_empty());
        self.num_views = viewport_offsets.len() as i32;
        self.multiview_layout = layout;
        self.base_view_index = base_view_index;
        self.viewport_offsets = viewport_offsets;
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.resource.is_some()
    }

    #[inline]
    pub fn attachment_type(&self) -> AttachmentType {
        self.attachment_type
    }

    /// The attachment point, e.g. `GL_COLOR_ATTACHMENT0`.
    #[inline]
    pub fn binding(&self) -> u32 {
        self.binding
    }

    #[inline]
    pub fn resource(&self) -> Option<&Arc<dyn AttachmentObject>> {
        self.resource.as_ref()
    }

    #[inline]
    pub fn id(&self) -> Option<u32> {
        self.resource.as_ref().map(|resource| resource.id())
    }

    fn texture_image_index(&self) -> Option<&ImageIndex> {
        assert_eq!(self.attachment_type, AttachmentType::Texture);
        self.image_index.as_ref()
    }

    /// The mip level of a texture attachment.
    pub fn mip_level(&self) -> i32 {
        self.texture_image_index().map_or(0, |index| index.mip_level)
    }

    /// The layer of an array or 3D texture attachment. Zero for every other target.
    pub fn layer(&self) -> i32 {
        match self.texture_image_index() {
            Some(index) if index.target.is_layered() => index.layer_index.unwrap_or(0),
            _ => 0,
        }
    }

    /// The face of a cube map texture attachment.
    pub fn cube_map_face(&self) -> Option<TextureTarget> {
        self.texture_image_index()
            .map(|index| index.target)
            .filter(|target| target.is_cube_map_face())
    }

    #[inline]
    pub fn num_views(&self) -> i32 {
        self.num_views
    }

    #[inline]
    pub fn multiview_layout(&self) -> MultiviewLayout {
        self.multiview_layout
    }

    #[inline]
    pub fn base_view_index(&self) -> i32 {
        self.base_view_index
    }

    #[inline]
    pub fn multiview_viewport_offsets(&self) -> &[Offset] {
        &self.viewport_offsets
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachmentObject, AttachmentType, FramebufferAttachment, ImageIndex};
    use super::{MultiviewLayout, Offset, TextureTarget};
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Texture {
        id: u32,
        attach_count: AtomicUsize,
        detach_count: AtomicUsize,
        references: AtomicI32,
    }

    impl AttachmentObject for Texture {
        fn id(&self) -> u32 {
            self.id
        }

        fn on_attach(&self) {
            self.attach_count.fetch_add(1, Ordering::SeqCst);
            self.references.fetch_add(1, Ordering::SeqCst);
        }

        fn on_detach(&self) {
            self.detach_count.fetch_add(1, Ordering::SeqCst);
            let remaining = self.references.fetch_sub(1, Ordering::SeqCst) - 1;
            assert!(remaining >= 0);
        }
    }

    impl Texture {
        fn counts(&self) -> (usize, usize) {
            (
                self.attach_count.load(Ordering::SeqCst),
                self.detach_count.load(Ordering::SeqCst),
            )
        }
    }

    fn texture(id: u32) -> Arc<Texture> {
        Arc::new(Texture {
            id,
            ..Texture::default()
        })
    }

    fn attach_texture(
        attachment: &mut FramebufferAttachment,
        texture: &Arc<Texture>,
        index: ImageIndex,
    ) {
        attachment.attach(
            AttachmentType::Texture,
            glow::COLOR_ATTACHMENT0,
            Some(index),
            Some(texture.clone()),
        );
    }

    #[test]
    fn reattaching_notifies_each_resource_once() {
        let first = texture(1);
        let second = texture(2);
        let mut attachment = FramebufferAttachment::new();

        attach_texture(&mut attachment, &first, ImageIndex::new(TextureTarget::Texture2D, 0));
        assert_eq!(first.counts(), (1, 0));
        assert_eq!(attachment.id(), Some(1));

        attach_texture(&mut attachment, &second, ImageIndex::new(TextureTarget::Texture2D, 0));
        assert_eq!(first.counts(), (1, 1));
        assert_eq!(second.counts(), (1, 0));

        // The same resource again: one attach, one detach, and it never drops to zero.
        attach_texture(&mut attachment, &second, ImageIndex::new(TextureTarget::Texture2D, 1));
        assert_eq!(second.counts(), (2, 1));
        assert_eq!(second.references.load(Ordering::SeqCst), 1);

        attachment.detach();
        assert_eq!(second.counts(), (2, 2));
        assert!(!attachment.is_attached());
    }

    #[test]
    fn attaching_nothing_is_detaching() {
        let resource = texture(7);
        let mut attached_then_nulled = FramebufferAttachment::new();
        let mut attached_then_detached = FramebufferAttachment::new();
        for attachment in [&mut attached_then_nulled, &mut attached_then_detached] {
            attach_texture(attachment, &resource, ImageIndex::new(TextureTarget::Texture2D, 0));
            attachment.set_multiview(
                MultiviewLayout::SideBySide,
                0,
                vec![Offset::new(0, 0), Offset::new(64, 0)],
            );
        }

        attached_then_nulled.attach(AttachmentType::Renderbuffer, glow::DEPTH_ATTACHMENT, None, None);
        attached_then_detached.detach();

        assert_eq!(resource.counts(), (2, 2));
        assert_eq!(attached_then_nulled, attached_then_detached);
        assert_eq!(attached_then_nulled, FramebufferAttachment::new());
        assert_eq!(attached_then_nulled.attachment_type(), AttachmentType::None);
        assert_eq!(attached_then_nulled.num_views(), 1);
        assert_eq!(attached_then_nulled.multiview_layout(), MultiviewLayout::None);
        assert_eq!(attached_then_nulled.multiview_viewport_offsets(), [Offset::zero()]);
    }

    #[test]
    fn equality_ignores_image_index_outside_textures() {
        let resource = texture(3);
        let mut a = FramebufferAttachment::new();
        let mut b = FramebufferAttachment::new();

        attach_texture(&mut a, &resource, ImageIndex::new(TextureTarget::Texture2D, 0));
        attach_texture(&mut b, &resource, ImageIndex::new(TextureTarget::Texture2D, 1));
        assert_ne!(a, b);

        for attachment in [&mut a, &mut b] {
            attachment.detach();
        }
        a.attach(
            AttachmentType::Renderbuffer,
            glow::COLOR_ATTACHMENT0,
            Some(ImageIndex::new(TextureTarget::Texture2D, 0)),
            Some(resource.clone()),
        );
        b.attach(
            AttachmentType::Renderbuffer,
            glow::COLOR_ATTACHMENT0,
            Some(ImageIndex::new(TextureTarget::Texture2D, 1)),
            Some(resource.clone()),
        );
        assert_eq!(a, b);

        b.set_multiview(MultiviewLayout::Layered, 2, vec![Offset::zero(); 2]);
        assert_ne!(a, b);

        let other = texture(3);
        a.attach(AttachmentType::Renderbuffer, glow::COLOR_ATTACHMENT0, None, Some(other));
        b.detach();
        b.attach(AttachmentType::Renderbuffer, glow::COLOR_ATTACHMENT0, None, Some(resource));
        assert_ne!(a, b, "resources are compared by identity, not by name");

        a.detach();
        b.detach();
    }

    #[test]
    fn texture_sub_resources() {
        let resource = texture(9);
        let mut attachment = FramebufferAttachment::new();

        attach_texture(
            &mut attachment,
            &resource,
            ImageIndex::layered(TextureTarget::Texture2DArray, 2, 5),
        );
        assert_eq!(attachment.mip_level(), 2);
        assert_eq!(attachment.layer(), 5);
        assert_eq!(attachment.cube_map_face(), None);

        attach_texture(
            &mut attachment,
            &resource,
            ImageIndex::new(TextureTarget::CubeMapNegativeY, 1),
        );
        assert_eq!(attachment.layer(), 0);
        assert_eq!(attachment.cube_map_face(), Some(TextureTarget::CubeMapNegativeY));
        assert_eq!(
            attachment.cube_map_face().map(TextureTarget::to_gl_enum),
            Some(glow::TEXTURE_CUBE_MAP_NEGATIVE_Y)
        );

        attachment.detach();
    }

    #[test]
    #[should_panic(expected = "detached before")]
    fn dropping_an_attached_attachment_panics() {
        let resource = texture(1);
        let mut attachment = FramebufferAttachment::new();
        attach_texture(&mut attachment, &resource, ImageIndex::new(TextureTarget::Texture2D, 0));
    }
}

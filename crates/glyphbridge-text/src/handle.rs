use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, ShapeError};

/// OpenType table tag, big-endian packed (`b"GSUB"` -> `0x47535542`).
pub type Tag = u32;

/// Pack four ASCII bytes into a [`Tag`].
pub const fn tag(bytes: &[u8; 4]) -> Tag {
    u32::from_be_bytes(*bytes)
}

/// A platform face the shaping engine can read.
///
/// Faces that expose their OpenType tables get full GSUB/GPOS shaping; the
/// default exposes nothing and shaping relies on the resolver callbacks alone.
pub trait PlatformFace: Send + Sync + 'static {
    /// Raw bytes of the table named by `tag`, if the face has one.
    fn table(&self, tag: Tag) -> Option<&[u8]> {
        let _ = tag;
        None
    }
}

type DestroyFn = Box<dyn FnOnce() + Send + 'static>;

struct HandleInner<F> {
    face: Arc<F>,
    point_size: f32,
    device_scale: f32,
    destroy: Mutex<Option<DestroyFn>>,
}

impl<F> Drop for HandleInner<F> {
    fn drop(&mut self) {
        if let Some(destroy) = self.destroy.get_mut().take() {
            log::trace!("font handle released, running destroy hook");
            destroy();
        }
    }
}

/// Opaque font handle consumed by the shaping engine.
///
/// The face is shared, never copied or freed here. Clones share the same
/// handle; the destroy hook runs once, after the last clone is dropped. A
/// bound [`ShapingFont`](crate::ShapingFont) holds a clone, so the hook never
/// runs while the engine can still reach the face.
pub struct FontHandle<F> {
    inner: Arc<HandleInner<F>>,
}

impl<F: PlatformFace> FontHandle<F> {
    /// Wrap `face` with a destroy hook.
    ///
    /// `point_size` and `device_scale` must be finite and positive.
    pub fn create(
        face: Arc<F>,
        point_size: f32,
        device_scale: f32,
        destroy: impl FnOnce() + Send + 'static,
    ) -> Result<Self> {
        Self::build(face, point_size, device_scale, Some(Box::new(destroy)))
    }

    /// Wrap `face` without a destroy hook.
    pub fn new(face: Arc<F>, point_size: f32, device_scale: f32) -> Result<Self> {
        Self::build(face, point_size, device_scale, None)
    }

    fn build(
        face: Arc<F>,
        point_size: f32,
        device_scale: f32,
        destroy: Option<DestroyFn>,
    ) -> Result<Self> {
        ensure_positive("point size", point_size)?;
        ensure_positive("device scale", device_scale)?;
        Ok(Self {
            inner: Arc::new(HandleInner {
                face,
                point_size,
                device_scale,
                destroy: Mutex::new(destroy),
            }),
        })
    }
}

impl<F> FontHandle<F> {
    pub fn face(&self) -> &Arc<F> {
        &self.inner.face
    }

    pub fn point_size(&self) -> f32 {
        self.inner.point_size
    }

    pub fn device_scale(&self) -> f32 {
        self.inner.device_scale
    }

    /// Drop the destroy hook without running it.
    ///
    /// For callers that must report a failure after the handle was built and
    /// keep ownership of the face. Returns whether a hook was armed.
    pub fn disarm(&self) -> bool {
        self.inner.destroy.lock().take().is_some()
    }

    /// Whether both values refer to the same handle.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<F> Clone for FontHandle<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> fmt::Debug for FontHandle<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("handle", &Arc::as_ptr(&self.inner))
            .field("point_size", &self.inner.point_size)
            .field("device_scale", &self.inner.device_scale)
            .finish()
    }
}

pub(crate) fn ensure_positive(what: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ShapeError::InvalidArgument(format!(
            "{what} must be finite and positive, got {value}"
        )))
    }
}

//! Capabilities the document controller needs from the host page.

use std::sync::Arc;

use super::element::{ElementId, ImageElement, LinkElement, ScriptElement};

/// Element insertion and mutation in the host document.
pub trait DocumentHost: Send + Sync {
    /// Identity for a newly created element.
    fn allocate_id(&self) -> ElementId;
    /// Insert a script at the end of `<body>`; it starts loading immediately.
    fn append_to_body(&self, script: ScriptElement);
    /// Insert a link into `<head>`.
    fn append_to_head(&self, link: LinkElement);
    /// Point an existing image at a new URL.
    fn update_image(&self, image: ImageElement);
}

impl<T: DocumentHost + ?Sized> DocumentHost for Arc<T> {
    fn allocate_id(&self) -> ElementId {
        (**self).allocate_id()
    }

    fn append_to_body(&self, script: ScriptElement) {
        (**self).append_to_body(script)
    }

    fn append_to_head(&self, link: LinkElement) {
        (**self).append_to_head(link)
    }

    fn update_image(&self, image: ImageElement) {
        (**self).update_image(image)
    }
}

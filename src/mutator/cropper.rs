//! Sets one or more of `/MediaBox /CropBox /BleedBox /TrimBox /ArtBox` on
//! selected pages of a freshly copied document.

use super::{copy_all_pages, finish_document};
use crate::document::Document;
use crate::object::Object;
use crate::Result;

/// A page-box rectangle in default user space: `[llx lly urx ury]`.
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl Rect {
    fn width(&self) -> f64 {
        self.urx - self.llx
    }
    fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

impl From<Rect> for Object {
    fn from(r: Rect) -> Self {
        Object::Array(vec![
            Object::Real(r.llx),
            Object::Real(r.lly),
            Object::Real(r.urx),
            Object::Real(r.ury),
        ])
    }
}

/// Which box(es) a crop targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBox {
    MediaBox,
    CropBox,
    BleedBox,
    TrimBox,
    ArtBox,
}

impl PageBox {
    fn key(self) -> &'static [u8] {
        match self {
            PageBox::MediaBox => b"MediaBox",
            PageBox::CropBox => b"CropBox",
            PageBox::BleedBox => b"BleedBox",
            PageBox::TrimBox => b"TrimBox",
            PageBox::ArtBox => b"ArtBox",
        }
    }
}

/// A named anchor for "crop to size" requests, expressed relative to the
/// page's current `/MediaBox`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

pub struct Cropper;

impl Cropper {
    /// Sets `box_kind` to `rect` on every page in `indices` (empty means
    /// all pages) of a fresh copy of `source`.
    pub fn crop(source: &Document, indices: &[u32], box_kind: PageBox, rect: Rect) -> Result<Document> {
        let mut target = Document::new();
        let leaves = copy_all_pages(source, &mut target)?;
        let selected = select(&leaves, indices);

        for &leaf in &selected {
            target.get_object_mut(leaf)?.as_dict_mut()?.set(box_kind.key(), rect);
        }

        finish_document(&mut target, &leaves)?;
        Ok(target)
    }

    /// Crops to `(width, height)` anchored within the page's current
    /// `/MediaBox` (default `[0 0 612 792]` if absent).
    pub fn crop_to_size(
        source: &Document, indices: &[u32], box_kind: PageBox, width: f64, height: f64, anchor: Anchor,
    ) -> Result<Document> {
        let mut target = Document::new();
        let leaves = copy_all_pages(source, &mut target)?;
        let selected = select(&leaves, indices);

        for &leaf in &selected {
            let media = current_media_box(&target, leaf)?;
            let rect = anchored_rect(media, width, height, anchor);
            target.get_object_mut(leaf)?.as_dict_mut()?.set(box_kind.key(), rect);
        }

        finish_document(&mut target, &leaves)?;
        Ok(target)
    }
}

fn select(leaves: &[crate::object::ObjectId], indices: &[u32]) -> Vec<crate::object::ObjectId> {
    if indices.is_empty() {
        leaves.to_vec()
    } else {
        indices.iter().filter_map(|&i| leaves.get(i as usize).copied()).collect()
    }
}

fn current_media_box(doc: &Document, leaf: crate::object::ObjectId) -> Result<Rect> {
    let default = Rect { llx: 0.0, lly: 0.0, urx: 612.0, ury: 792.0 };
    let Ok(dict) = doc.get_dictionary(leaf) else { return Ok(default) };
    let Ok(arr) = dict.get(b"MediaBox").and_then(Object::as_array) else { return Ok(default) };
    if arr.len() != 4 {
        return Ok(default);
    }
    let v: Vec<f64> = arr.iter().map(|o| o.as_f64().unwrap_or(0.0)).collect();
    Ok(Rect { llx: v[0], lly: v[1], urx: v[2], ury: v[3] })
}

fn anchored_rect(media: Rect, width: f64, height: f64, anchor: Anchor) -> Rect {
    let (mw, mh) = (media.width(), media.height());
    let (x0, y0) = match anchor {
        Anchor::Center => (media.llx + (mw - width) / 2.0, media.lly + (mh - height) / 2.0),
        Anchor::TopLeft => (media.llx, media.ury - height),
        Anchor::TopRight => (media.urx - width, media.ury - height),
        Anchor::BottomLeft => (media.llx, media.lly),
        Anchor::BottomRight => (media.urx - width, media.lly),
    };
    Rect { llx: x0, lly: y0, urx: x0 + width, ury: y0 + height }
}

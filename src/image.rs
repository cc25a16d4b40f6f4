//! Image compositing: object-fit placement and the failure placeholder.

use crate::assets::AssetLoader;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ops::{Color, DrawOp, ImageBlit, PathOp, Rect, Stroke};
use crate::shapes::rect_path;
use crate::template::{ImageContent, ObjectFit};

const PLACEHOLDER_FILL: Color = Color::rgb(230, 230, 230);
const PLACEHOLDER_BORDER: Color = Color::rgb(179, 179, 179);

/// Background images cover their box; everything else is contained.
pub fn default_fit(content: &ImageContent) -> ObjectFit {
    content.object_fit.unwrap_or(if content.background {
        ObjectFit::Cover
    } else {
        ObjectFit::Contain
    })
}

/// Destination rectangle of an image of size `(iw, ih)` (page units) in
/// `container`, centered.
pub fn place(fit: ObjectFit, intrinsic: (f32, f32), container: Rect) -> Rect {
    let (iw, ih) = intrinsic;
    let (cw, ch) = (container.width, container.height);
    if !(iw > 0.0 && ih > 0.0 && cw > 0.0 && ch > 0.0) {
        return container;
    }

    let image_ratio = iw / ih;
    let container_ratio = cw / ch;
    let contain = if image_ratio > container_ratio {
        (cw, cw / image_ratio)
    } else {
        (ch * image_ratio, ch)
    };

    let (w, h) = match fit {
        ObjectFit::Fill => (cw, ch),
        ObjectFit::Contain => contain,
        ObjectFit::Cover => {
            if image_ratio > container_ratio {
                (ch * image_ratio, ch)
            } else {
                (cw, cw / image_ratio)
            }
        }
        ObjectFit::None => (iw, ih),
        ObjectFit::ScaleDown => {
            if iw <= contain.0 && ih <= contain.1 {
                (iw, ih)
            } else {
                contain
            }
        }
    };

    Rect::new(
        container.x + (cw - w) / 2.0,
        container.y + (ch - h) / 2.0,
        w,
        h,
    )
}

/// Light gray box with a darker border.
pub fn placeholder(rect: Rect) -> DrawOp {
    DrawOp::Path(PathOp {
        segments: rect_path(rect, 0.0),
        fill: Some(PLACEHOLDER_FILL),
        stroke: Some(Stroke {
            color: PLACEHOLDER_BORDER,
            width: 0.35,
        }),
    })
}

/// Loads and places one image. Any failure yields the placeholder plus an
/// asset diagnostic. `px_length` is the page length of one image pixel.
pub fn render_image(
    content: &ImageContent,
    url: Option<&str>,
    rect: Rect,
    px_length: f32,
    loader: &dyn AssetLoader,
    diag: &mut Diagnostics,
) -> Vec<DrawOp> {
    let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
        diag.warn(DiagnosticKind::Asset, "image has no source");
        return vec![placeholder(rect)];
    };

    match loader.load(url) {
        Ok(image) => {
            let intrinsic = (image.width as f32 * px_length, image.height as f32 * px_length);
            let dest = place(default_fit(content), intrinsic, rect);
            vec![DrawOp::Image(ImageBlit {
                dest,
                clip: rect,
                image,
            })]
        }
        Err(e) => {
            let shown: String = url.chars().take(80).collect();
            diag.warn(DiagnosticKind::Asset, format!("failed to load image {}: {}", shown, e));
            vec![placeholder(rect)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::RasterImage;
    use crate::error::AssetError;
    use std::sync::Arc;

    struct Fixed(Option<(u32, u32)>);

    impl AssetLoader for Fixed {
        fn load(&self, _url: &str) -> Result<Arc<RasterImage>, AssetError> {
            match self.0 {
                Some((width, height)) => Ok(Arc::new(RasterImage {
                    width,
                    height,
                    pixels: vec![0; (width * height * 3) as usize],
                })),
                None => Err(AssetError::EmptyData),
            }
        }
    }

    fn container() -> Rect {
        Rect::new(10.0, 20.0, 100.0, 50.0)
    }

    #[test]
    fn test_contain_letterboxes() {
        // 1:1 image in a 2:1 box: height limits.
        let r = place(ObjectFit::Contain, (400.0, 400.0), container());
        assert_eq!((r.width, r.height), (50.0, 50.0));
        assert_eq!((r.x, r.y), (35.0, 20.0));
        // 4:1 image: width limits.
        let r = place(ObjectFit::Contain, (400.0, 100.0), container());
        assert_eq!((r.width, r.height), (100.0, 25.0));
        assert_eq!(r.y, 32.5);
    }

    #[test]
    fn test_cover_crops() {
        let r = place(ObjectFit::Cover, (400.0, 400.0), container());
        assert_eq!((r.width, r.height), (100.0, 100.0));
        assert_eq!(r.y, -5.0);
        let r = place(ObjectFit::Cover, (400.0, 100.0), container());
        assert_eq!((r.width, r.height), (200.0, 50.0));
    }

    #[test]
    fn test_fill_none_and_scale_down() {
        assert_eq!(place(ObjectFit::Fill, (1.0, 9.0), container()), container());
        let r = place(ObjectFit::None, (20.0, 10.0), container());
        assert_eq!((r.x, r.y, r.width, r.height), (50.0, 40.0, 20.0, 10.0));
        let small = place(ObjectFit::ScaleDown, (20.0, 10.0), container());
        assert_eq!((small.width, small.height), (20.0, 10.0));
        let big = place(ObjectFit::ScaleDown, (400.0, 400.0), container());
        assert_eq!((big.width, big.height), (50.0, 50.0));
    }

    #[test]
    fn test_default_fit_depends_on_role() {
        let mut content = ImageContent::default();
        assert_eq!(default_fit(&content), ObjectFit::Contain);
        content.background = true;
        assert_eq!(default_fit(&content), ObjectFit::Cover);
        content.object_fit = Some(ObjectFit::Fill);
        assert_eq!(default_fit(&content), ObjectFit::Fill);
    }

    #[test]
    fn test_blit_is_clipped_to_container() {
        let mut diag = Diagnostics::new();
        let content = ImageContent {
            background: true,
            ..Default::default()
        };
        let ops = render_image(&content, Some("x.png"), container(), 1.0, &Fixed(Some((10, 10))), &mut diag);
        match &ops[..] {
            [DrawOp::Image(blit)] => {
                assert_eq!(blit.clip, container());
                assert_eq!(blit.dest.width, 100.0);
            }
            other => panic!("expected one blit, got {:?}", other),
        }
        assert!(diag.is_empty());
    }

    #[test]
    fn test_failure_draws_placeholder() {
        let mut diag = Diagnostics::new();
        let content = ImageContent::default();
        let ops = render_image(&content, Some("x.png"), container(), 1.0, &Fixed(None), &mut diag);
        assert!(matches!(&ops[..], [DrawOp::Path(p)] if p.fill == Some(PLACEHOLDER_FILL)));
        assert_eq!(diag.count(DiagnosticKind::Asset), 1);

        let ops = render_image(&content, None, container(), 1.0, &Fixed(Some((1, 1))), &mut diag);
        assert_eq!(ops.len(), 1);
        assert_eq!(diag.count(DiagnosticKind::Asset), 2);
    }
}

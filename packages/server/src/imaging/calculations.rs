//! Pure calculation functions for image dimensions.

/// Fit `source` inside `bounds`, preserving aspect ratio.
///
/// Returns `source` unchanged when it already fits. Otherwise the image is
/// scaled by `min(max_w / w, max_h / h)` and each side is rounded, never
/// dropping below 1px or exceeding its bound.
///
/// # Examples
/// ```
/// # use places_server::imaging::calculations::fit_within;
/// assert_eq!(fit_within((1500, 1000), (1200, 800)), (1200, 800));
/// assert_eq!(fit_within((800, 600), (1200, 800)), (800, 600));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = f64::min(max_w as f64 / src_w as f64, max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Whether `dims` needs downscaling to fit `bounds`.
pub fn exceeds(dims: (u32, u32), bounds: (u32, u32)) -> bool {
    dims.0 > bounds.0 || dims.1 > bounds.1
}

use image::{Rgba, Rgba32FImage};

use super::{BlurParams, EdgeMode};

/// Samples `src` at texture coordinate `(u, v)` with bilinear filtering.
///
/// Texel centers sit at `(i + 0.5) / width`, row 0 is the top row, matching
/// how the GPU samples a linear-filtered texture.
pub fn sample_bilinear(src: &Rgba32FImage, u: f32, v: f32, edge: EdgeMode) -> [f32; 4] {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return [0.0; 4];
    }

    let x = u * w as f32 - 0.5;
    let y = v * h as f32 - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let texel = |ix: i64, iy: i64| -> [f32; 4] {
        let px = address(ix, w, edge);
        let py = address(iy, h, edge);
        src.get_pixel(px, py).0
    };

    let (ix, iy) = (x0 as i64, y0 as i64);
    let t00 = texel(ix, iy);
    let t10 = texel(ix + 1, iy);
    let t01 = texel(ix, iy + 1);
    let t11 = texel(ix + 1, iy + 1);

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let top = t00[c] + (t10[c] - t00[c]) * fx;
        let bottom = t01[c] + (t11[c] - t01[c]) * fx;
        out[c] = top + (bottom - top) * fy;
    }
    out
}

fn address(i: i64, len: u32, edge: EdgeMode) -> u32 {
    let len = len as i64;
    match edge {
        EdgeMode::Repeat => i.rem_euclid(len) as u32,
        EdgeMode::Clamp => i.clamp(0, len - 1) as u32,
    }
}

/// Evaluates the composite pass on the CPU.
///
/// Produces an `out_width`×`out_height` image where each pixel is the
/// equal-weight mean of `params.taps()` bilinear samples of `src` around the
/// pixel's texture coordinate.
pub fn box_blur(
    src: &Rgba32FImage,
    out_width: u32,
    out_height: u32,
    params: &BlurParams,
) -> Rgba32FImage {
    let r = params.radius as i32;
    let weight = params.weight();

    Rgba32FImage::from_fn(out_width, out_height, |px, py| {
        let u = (px as f32 + 0.5) / out_width as f32;
        let v = (py as f32 + 0.5) / out_height as f32;

        let mut acc = [0.0f32; 4];
        for dx in -r..=r {
            for dy in -r..=r {
                let s = sample_bilinear(
                    src,
                    u + dx as f32 * params.step,
                    v + dy as f32 * params.step,
                    params.edge,
                );
                for c in 0..4 {
                    acc[c] += s[c];
                }
            }
        }

        Rgba(acc.map(|c| c * weight))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn solid(w: u32, h: u32, c: [f32; 4]) -> Rgba32FImage {
        Rgba32FImage::from_pixel(w, h, Rgba(c))
    }

    /// Step of exactly one texel on a `size`-wide texture.
    fn one_texel(size: u32) -> BlurParams {
        BlurParams {
            step: 1.0 / size as f32,
            ..BlurParams::default()
        }
    }

    #[test]
    fn sample_at_texel_center_is_exact() {
        let mut img = solid(4, 4, [0.0; 4]);
        img.put_pixel(1, 2, Rgba([1.0, 0.5, 0.25, 1.0]));
        let s = sample_bilinear(&img, 1.5 / 4.0, 2.5 / 4.0, EdgeMode::Clamp);
        assert!((s[0] - 1.0).abs() < EPS);
        assert!((s[2] - 0.25).abs() < EPS);
    }

    #[test]
    fn sample_between_texels_interpolates() {
        let mut img = solid(2, 1, [0.0; 4]);
        img.put_pixel(1, 0, Rgba([1.0; 4]));
        let s = sample_bilinear(&img, 0.5, 0.5, EdgeMode::Clamp);
        assert!((s[0] - 0.5).abs() < EPS);
    }

    #[test]
    fn constant_field_is_identity() {
        let color = [0.0, 0.0, 0.0, 0.5];
        let src = solid(80, 60, color);
        for edge in [EdgeMode::Repeat, EdgeMode::Clamp] {
            let params = BlurParams { edge, ..BlurParams::default() };
            let out = box_blur(&src, 40, 30, &params);
            for p in out.pixels() {
                for c in 0..4 {
                    assert!((p.0[c] - color[c]).abs() < EPS, "{edge:?}: {:?}", p.0);
                }
            }
        }
    }

    #[test]
    fn single_texel_is_diluted_to_one_81st() {
        let mut src = solid(300, 300, [0.0; 4]);
        src.put_pixel(150, 150, Rgba([1.0; 4]));
        let out = box_blur(&src, 300, 300, &one_texel(300));

        let center = out.get_pixel(150, 150).0[0];
        assert!((center - 1.0 / 81.0).abs() < EPS, "center = {center}");
        assert!(center <= 1.0 / 81.0 + EPS);

        // Still inside the 9×9 window at the edge, outside one texel further.
        assert!((out.get_pixel(154, 150).0[0] - 1.0 / 81.0).abs() < EPS);
        assert!(out.get_pixel(156, 150).0[0].abs() < EPS);
    }

    #[test]
    fn one_texel_stripe_peaks_at_nine_81sts() {
        let mut src = solid(300, 300, [0.0; 4]);
        for y in 0..300 {
            src.put_pixel(150, y, Rgba([1.0; 4]));
        }
        let out = box_blur(&src, 300, 300, &one_texel(300));

        for y in [0, 10, 150, 299] {
            let peak = out.get_pixel(150, y).0[0];
            assert!((peak - 9.0 / 81.0).abs() < EPS, "row {y}: {peak}");
        }
    }

    #[test]
    fn repeat_conserves_total_energy() {
        let mut src = solid(64, 64, [0.0; 4]);
        src.put_pixel(3, 60, Rgba([1.0; 4]));
        src.put_pixel(40, 7, Rgba([0.5; 4]));
        let params = BlurParams { edge: EdgeMode::Repeat, ..one_texel(64) };
        let out = box_blur(&src, 64, 64, &params);

        let total: f32 = out.pixels().map(|p| p.0[0]).sum();
        assert!((total - 1.5).abs() < 1e-2, "total = {total}");
    }

    #[test]
    fn edge_mode_controls_wraparound() {
        let mut src = solid(32, 32, [0.0; 4]);
        for y in 0..32 {
            src.put_pixel(0, y, Rgba([1.0; 4]));
        }

        let repeat = box_blur(&src, 32, 32, &BlurParams { edge: EdgeMode::Repeat, ..one_texel(32) });
        let clamp = box_blur(&src, 32, 32, &BlurParams { edge: EdgeMode::Clamp, ..one_texel(32) });

        // The far-right column sees the left column only when wrapping.
        assert!(repeat.get_pixel(31, 16).0[0] > 0.1);
        assert!(clamp.get_pixel(31, 16).0[0].abs() < EPS);
    }
}

use rastermix::{
    BlendMethod, Color, Operator, PixelColor, Rect, RenderContext, Surface, blend_premultiplied,
    composite, paint_with_alpha,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn surface_from_pixels(width: u32, height: u32, pixels: &[PixelColor]) -> Surface {
    assert_eq!(pixels.len(), (width * height) as usize);
    let mut s = Surface::new(width, height);
    {
        let mut m = s.map().unwrap();
        for y in 0..height {
            for x in 0..width {
                m.pixels_mut()
                    .set_pixel(x, y, pixels[(y * width + x) as usize]);
            }
        }
    }
    s.mark_clean();
    s
}

fn pixels_of(s: &Surface) -> Vec<PixelColor> {
    let mut out = Vec::new();
    for y in 0..s.height() {
        for x in 0..s.width() {
            out.push(s.buffer().pixel(x, y));
        }
    }
    out
}

fn paint_solid(target: &mut Surface, color: Color, alpha: f32, method: BlendMethod) {
    let mut ctx = RenderContext::new(target);
    ctx.set_source_color(color);
    paint_with_alpha(ctx, alpha, method).unwrap();
}

fn checker(width: u32, height: u32) -> Vec<PixelColor> {
    (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                if (x + y) % 2 == 0 {
                    PixelColor::new(0, 0, 200, 200)
                } else {
                    PixelColor::new(60, 120, 30, 240)
                }
            })
        })
        .collect()
}

const NATIVE_METHODS: [BlendMethod; 5] = [
    BlendMethod::Composite,
    BlendMethod::Straight,
    BlendMethod::Behind,
    BlendMethod::Onto,
    BlendMethod::AlphaOver,
];

#[test]
fn native_methods_with_alpha_zero_are_noops() {
    init_tracing();
    let before = checker(4, 4);
    for method in NATIVE_METHODS {
        let mut target = surface_from_pixels(4, 4, &before);
        paint_solid(&mut target, Color::new(1.0, 0.3, 0.7, 1.0), 0.0, method);
        assert_eq!(pixels_of(&target), before, "{method:?} at alpha 0");
    }
}

#[test]
fn composite_alpha_one_matches_source_over() {
    let before = checker(4, 4);
    let src = Color::new(0.8, 0.2, 0.1, 0.6);
    let mut target = surface_from_pixels(4, 4, &before);
    paint_solid(&mut target, src, 1.0, BlendMethod::Composite);

    let s = src.premultiply();
    for (got, d) in pixels_of(&target).into_iter().zip(before) {
        assert_eq!(got, composite(Operator::Over, s, d));
    }
}

#[test]
fn composite_opaque_source_is_idempotent() {
    let before = checker(3, 3);
    let src = Color::new(0.9, 0.1, 0.4, 1.0);

    let mut once = surface_from_pixels(3, 3, &before);
    paint_solid(&mut once, src, 1.0, BlendMethod::Composite);

    let mut twice = surface_from_pixels(3, 3, &before);
    paint_solid(&mut twice, src, 1.0, BlendMethod::Composite);
    paint_solid(&mut twice, src, 1.0, BlendMethod::Composite);

    assert_eq!(pixels_of(&once), pixels_of(&twice));
}

#[test]
fn straight_at_half_alpha_mixes_target_and_contribution() {
    let mut target = surface_from_pixels(1, 1, &[PixelColor::new(0, 0, 255, 255)]);
    paint_solid(
        &mut target,
        Color::new(1.0, 0.0, 0.0, 1.0),
        0.5,
        BlendMethod::Straight,
    );
    let p = target.buffer().pixel(0, 0);
    // Target alpha reduced to 0.5 then the contribution added at 0.5.
    assert!(p.b.abs_diff(128) <= 1, "b {}", p.b);
    assert!(p.r.abs_diff(128) <= 1, "r {}", p.r);
    assert!(p.a.abs_diff(255) <= 1, "a {}", p.a);
}

#[test]
fn multiply_of_opaque_red_over_opaque_blue_is_black() {
    let mut target = surface_from_pixels(2, 2, &[PixelColor::new(0, 0, 255, 255); 4]);
    paint_solid(
        &mut target,
        Color::new(1.0, 0.0, 0.0, 1.0),
        1.0,
        BlendMethod::Multiply,
    );
    for p in pixels_of(&target) {
        assert_eq!(p, PixelColor::new(0, 0, 0, 255));
    }
}

#[test]
fn onto_keeps_target_coverage() {
    let mut target = surface_from_pixels(
        2,
        1,
        &[PixelColor::new(0, 0, 255, 255), PixelColor::TRANSPARENT],
    );
    paint_solid(
        &mut target,
        Color::new(1.0, 0.0, 0.0, 1.0),
        1.0,
        BlendMethod::Onto,
    );
    assert_eq!(target.buffer().pixel(0, 0), PixelColor::new(255, 0, 0, 255));
    assert_eq!(target.buffer().pixel(1, 0), PixelColor::TRANSPARENT);
}

#[test]
fn behind_paints_only_where_target_is_uncovered() {
    let mut target = surface_from_pixels(
        2,
        1,
        &[PixelColor::new(0, 0, 255, 255), PixelColor::TRANSPARENT],
    );
    paint_solid(
        &mut target,
        Color::new(1.0, 0.0, 0.0, 1.0),
        1.0,
        BlendMethod::Behind,
    );
    assert_eq!(target.buffer().pixel(0, 0), PixelColor::new(0, 0, 255, 255));
    assert_eq!(target.buffer().pixel(1, 0), PixelColor::new(255, 0, 0, 255));
}

#[test]
fn alpha_over_erases_under_the_contribution() {
    let mut target = surface_from_pixels(1, 1, &[PixelColor::new(0, 0, 255, 255)]);
    paint_solid(
        &mut target,
        Color::new(1.0, 1.0, 1.0, 1.0),
        1.0,
        BlendMethod::AlphaOver,
    );
    assert_eq!(target.buffer().pixel(0, 0), PixelColor::TRANSPARENT);
}

#[test]
fn overlay_on_transparent_target_lands_at_scaled_source_alpha() {
    let mut target = Surface::new(2, 2);
    let src = Color::new(1.0, 0.0, 0.0, 0.8);
    paint_solid(&mut target, src, 0.5, BlendMethod::Overlay);

    let p = target.buffer().pixel(0, 0);
    let expected_a = (0.8f32 * 0.5 * 255.0).round() as u8;
    assert!(p.a.abs_diff(expected_a) <= 2, "alpha {} vs {expected_a}", p.a);
}

#[test]
fn overlay_on_partially_covered_target_takes_contribution_coverage() {
    // The re-composite paints the mutated contribution over the target, so
    // final coverage follows the contribution, not the target's partial
    // coverage.
    let mut target = surface_from_pixels(1, 1, &[PixelColor::new(0, 0, 128, 128)]);
    paint_solid(
        &mut target,
        Color::new(1.0, 0.0, 0.0, 1.0),
        1.0,
        BlendMethod::Overlay,
    );
    let p = target.buffer().pixel(0, 0);
    assert_eq!(p.a, 255, "coverage rises to the opaque contribution's");
}

#[test]
fn destination_loop_methods_are_pointwise() {
    let before = checker(4, 4);
    let src = Color::new(0.7, 0.4, 0.9, 0.8);
    for method in [
        BlendMethod::Add,
        BlendMethod::Subtract,
        BlendMethod::Difference,
        BlendMethod::Color,
        BlendMethod::AlphaBrighten,
        BlendMethod::AlphaDarken,
        BlendMethod::Divide,
    ] {
        let mut target = surface_from_pixels(4, 4, &before);
        paint_solid(&mut target, src, 0.7, method);
        let after = pixels_of(&target);

        // Permute two unrelated pixels of the input; every other output
        // pixel must be unchanged.
        let mut permuted = before.clone();
        permuted.swap(0, 15);
        let mut target = surface_from_pixels(4, 4, &permuted);
        paint_solid(&mut target, src, 0.7, method);
        let after_permuted = pixels_of(&target);

        for i in 1..15 {
            assert_eq!(after[i], after_permuted[i], "{method:?} pixel {i}");
        }
    }
}

#[test]
fn add_matches_per_pixel_evaluation() {
    let before = checker(3, 3);
    let src = Color::new(0.2, 0.9, 0.5, 0.6);
    let mut target = surface_from_pixels(3, 3, &before);
    paint_solid(&mut target, src, 0.8, BlendMethod::Add);

    let s = src.premultiply();
    for (got, d) in pixels_of(&target).into_iter().zip(before) {
        let expected = blend_premultiplied(s, d, 0.8, BlendMethod::Add);
        assert_eq!(got, expected);
    }
}

#[test]
fn divide_runs_on_premultiplied_values() {
    let mut target = surface_from_pixels(1, 1, &[PixelColor::new(64, 64, 64, 255)]);
    paint_solid(
        &mut target,
        Color::new(0.5, 0.5, 0.5, 1.0),
        1.0,
        BlendMethod::Divide,
    );
    let p = target.buffer().pixel(0, 0);
    assert!(p.r.abs_diff(128) <= 1, "0.25 / 0.5 should give 0.5, got {}", p.r);
    assert_eq!(p.a, 255);
}

#[test]
fn straight_onto_restricts_to_existing_coverage() {
    let mut target = surface_from_pixels(
        2,
        1,
        &[PixelColor::new(0, 0, 255, 255), PixelColor::TRANSPARENT],
    );
    paint_solid(
        &mut target,
        Color::new(1.0, 0.0, 0.0, 1.0),
        1.0,
        BlendMethod::StraightOnto,
    );
    assert_eq!(target.buffer().pixel(0, 0), PixelColor::new(255, 0, 0, 255));
    assert_eq!(target.buffer().pixel(1, 0), PixelColor::TRANSPARENT);
}

#[test]
fn clip_confines_every_strategy() {
    for method in [
        BlendMethod::Composite,
        BlendMethod::Straight,
        BlendMethod::Multiply,
        BlendMethod::Add,
        BlendMethod::Divide,
        BlendMethod::StraightOnto,
    ] {
        let before = checker(4, 4);
        let mut target = surface_from_pixels(4, 4, &before);
        let mut ctx = RenderContext::new(&mut target);
        ctx.clip_rect(Rect::new(1.0, 1.0, 3.0, 3.0));
        ctx.set_source_color(Color::new(1.0, 1.0, 0.0, 1.0));
        paint_with_alpha(ctx, 1.0, method).unwrap();

        let after = pixels_of(&target);
        for y in 0..4u32 {
            for x in 0..4u32 {
                let i = (y * 4 + x) as usize;
                if !(1..3).contains(&x) || !(1..3).contains(&y) {
                    assert_eq!(after[i], before[i], "{method:?} leaked at ({x},{y})");
                }
            }
        }
    }
}

#[test]
fn mapping_failure_aborts_the_paint_with_a_typed_error() {
    init_tracing();
    let mut target = Surface::new(2, 2);
    target.set_device_error("surface lost");
    let mut ctx = RenderContext::new(&mut target);
    ctx.set_source_color(Color::WHITE);
    let err = paint_with_alpha(ctx, 1.0, BlendMethod::Multiply).unwrap_err();
    assert!(err.to_string().contains("surface lost"));
}

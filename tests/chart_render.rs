//! End-to-end rendering behaviour of the chart core

use ikigai_pathway::chart::palette::{Rgb, SAKURA_PINK};
use ikigai_pathway::chart::raster::rasterize;
use ikigai_pathway::chart::{
    ChartFormat, ChartOptions, ChartRenderer, ColorScheme, render_chart, render_placeholder_chart,
};
use ikigai_pathway::{IkigaiError, Pillar, PillarResponses};

fn example_responses() -> PillarResponses {
    serde_json::from_value(serde_json::json!({
        "love": ["painting", "hiking"],
        "good_at": [],
        "world_needs": ["clean water"],
        "paid_for": ["teaching", "consulting", "writing", "extra"]
    }))
    .unwrap()
}

fn decode(bytes: &[u8]) -> image::RgbImage {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .expect("valid png")
        .to_rgb8()
}

#[test]
fn example_renders_with_expected_texts() {
    let responses = example_responses();
    let image = render_chart(&responses, None).unwrap();
    assert_eq!(image.format, ChartFormat::Png);
    assert!(!image.is_empty());
    assert_eq!(&image.bytes[1..4], b"PNG");

    let scene = ChartRenderer::default().scene(&responses, None).unwrap();
    assert_eq!(
        scene.response_text(Pillar::PaidFor).as_deref(),
        Some("teaching\nconsulting\nwriting")
    );
    assert_eq!(
        scene.response_text(Pillar::Love).as_deref(),
        Some("painting\nhiking")
    );
    assert!(scene.response_text(Pillar::GoodAt).is_none());
}

#[test]
fn rendering_is_deterministic() {
    let responses = example_responses();
    let a = render_chart(&responses, None).unwrap();
    let b = render_chart(&responses, None).unwrap();
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn empty_chart_matches_placeholder_except_title() {
    let renderer = ChartRenderer::default();
    let empty = renderer.scene(&PillarResponses::new(), None).unwrap();
    let placeholder = renderer.placeholder_scene().unwrap();
    assert_ne!(empty.title, placeholder.title);

    let a = rasterize(&empty.without_title()).unwrap();
    let b = rasterize(&placeholder.without_title()).unwrap();
    assert_eq!(a, b);

    let png = render_placeholder_chart().unwrap();
    assert_eq!(decode(&png.bytes).dimensions(), (900, 900));
}

#[test]
fn unknown_keys_are_ignored() {
    let with_extra: PillarResponses = serde_json::from_value(serde_json::json!({
        "love": ["music"],
        "hobbies": ["chess"]
    }))
    .unwrap();
    let plain = PillarResponses::new().with(Pillar::Love, ["music"]);
    assert_eq!(
        render_chart(&with_extra, None).unwrap(),
        render_chart(&plain, None).unwrap()
    );
}

#[test]
fn missing_scheme_uses_default_palette() {
    let image = render_chart(&PillarResponses::new(), None).unwrap();
    let explicit = render_chart(&PillarResponses::new(), Some(&ColorScheme::default())).unwrap();
    assert_eq!(image, explicit);

    let frame = decode(&image.bytes);
    // Corner is outside every circle and every text block
    let corner = frame.get_pixel(1, frame.height() - 2);
    assert_eq!(corner.0, [0xF9, 0xF5, 0xF0]);
    assert_eq!(ColorScheme::default().love, SAKURA_PINK);
}

#[test]
fn love_only_region_is_tinted_pink() {
    let renderer = ChartRenderer::default();
    let scene = renderer.scene(&PillarResponses::new(), None).unwrap();
    let frame = rasterize(&scene).unwrap();
    // (-0.6, 0.75) sits inside the love circle only, away from any label
    let (x, y) = scene.viewport.to_px(ikigai_pathway::chart::layout::Point::new(-0.6, 0.75));
    let Rgb(r, g, b) = frame.pixel(x as u32, y as u32);
    assert!(r > g && r > b, "expected a pink tint, got ({}, {}, {})", r, g, b);
}

#[test]
fn invalid_color_is_a_render_error() {
    let scheme = ColorScheme {
        world_needs: "not-a-color".into(),
        ..ColorScheme::default()
    };
    let err = render_chart(&PillarResponses::new(), Some(&scheme)).unwrap_err();
    match err {
        IkigaiError::InvalidColor { field, value } => {
            assert_eq!(field, "world_needs");
            assert_eq!(value, "not-a-color");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn svg_output_contains_labels() {
    let renderer = ChartRenderer::new(ChartOptions {
        size_px: 600,
        format: ChartFormat::Svg,
    })
    .unwrap();
    let image = renderer.render(&example_responses(), None).unwrap();
    assert_eq!(image.mime_type(), "image/svg+xml");
    let text = String::from_utf8(image.bytes).unwrap();
    assert!(text.contains("IKIGAI"));
    assert!(text.contains("teaching"));
    assert!(!text.contains("extra"));
}

#[test]
fn custom_size_changes_canvas() {
    let renderer = ChartRenderer::new(ChartOptions {
        size_px: 480,
        format: ChartFormat::Png,
    })
    .unwrap();
    let image = renderer.render(&example_responses(), None).unwrap();
    assert_eq!(decode(&image.bytes).dimensions(), (480, 480));
}

#[test]
fn very_long_responses_still_render_at_every_size() {
    let long = "a".repeat(1_000_000);
    let multiline = "line\n".repeat(200_000);
    let responses = PillarResponses::new()
        .with(Pillar::Love, [long.as_str(), "b", "c"])
        .with(Pillar::WorldNeeds, [multiline.as_str()]);

    for size_px in [900, 4000] {
        let renderer = ChartRenderer::new(ChartOptions {
            size_px,
            format: ChartFormat::Png,
        })
        .unwrap();
        let image = renderer.render(&responses, None).unwrap();
        assert_eq!(decode(&image.bytes).dimensions(), (size_px, size_px));
    }
}

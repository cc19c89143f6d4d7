use orb_runtime::{Frame, OffscreenRenderer, RenderError, SceneConfig};

const RED: [u8; 4] = [0, 0, 255, 255];
// (1, 1, 0.8, 1) stored as BGRA unorm
const PALE_YELLOW: [u8; 4] = [204, 255, 255, 255];

fn renderer() -> Option<OffscreenRenderer> {
    match pollster::block_on(OffscreenRenderer::new(&SceneConfig::default())) {
        Ok(renderer) => Some(renderer),
        Err(RenderError::NoDevice(e)) => {
            eprintln!("skipping: {e}");
            None
        }
        Err(e) => panic!("setup failed: {e}"),
    }
}

fn render() -> Option<Frame> {
    renderer().map(|r| r.render_frame().unwrap())
}

#[test]
fn sphere_is_red_on_pale_yellow() {
    let Some(frame) = render() else { return };
    assert_eq!((frame.width, frame.height), (600, 600));

    // radius 0.375 in clip space is 112.5 pixels
    for (x, y) in [(300, 300), (400, 300), (300, 200), (250, 350)] {
        assert_eq!(frame.pixel(x, y), RED, "({x}, {y})");
    }
    for (x, y) in [(0, 0), (599, 0), (0, 599), (599, 599), (300, 450), (150, 300)] {
        assert_eq!(frame.pixel(x, y), PALE_YELLOW, "({x}, {y})");
    }
}

#[test]
fn only_sphere_and_clear_colors_appear() {
    let Some(frame) = render() else { return };
    for px in frame.bgra.chunks_exact(4) {
        assert!(px == RED || px == PALE_YELLOW, "unexpected pixel {px:?}");
    }
}

#[test]
fn repeated_renders_are_identical() {
    let Some(first) = render() else { return };
    let Some(second) = render() else { return };
    assert_eq!(first, second);
}

#[test]
fn same_renderer_draws_the_same_frame_twice() {
    let Some(renderer) = renderer() else { return };
    let a = renderer.render_frame().unwrap();
    let b = renderer.render_frame().unwrap();
    assert_eq!(a, b);
}

use lorenz::{render, Canvas, Conf};
use tempfile::tempdir;

#[test]
fn rendered_png_decodes_to_the_same_pixels() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lorenz.png");
    let conf = Conf {
        output: path.to_string_lossy().into_owned(),
        size: 120.0,
        iterations: 20_000,
        ..Conf::default()
    };

    let canvas = render(&conf).unwrap();
    canvas.write_png(&conf.output).unwrap();

    let back = Canvas::read_png(&path).unwrap();
    assert_eq!(back, canvas);
    assert_eq!(back.width().max(back.height()), 120);
}

#[test]
fn textbook_beta_renders_too() {
    let conf = Conf {
        beta: 8.0 / 3.0,
        size: 64.0,
        iterations: 10_000,
        ..Conf::default()
    };
    let canvas = render(&conf).unwrap();
    assert!(canvas.pixels().iter().any(|&p| p > 0));
}

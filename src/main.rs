//! Valentine Duck entry point
//!
//! On the web this wires the page up; natively it plays a scripted visit
//! against the headless page and logs what happens.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    valentine_duck::platform::web::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use valentine_duck::Settings;
    use valentine_duck::platform::HeadlessPage;
    use valentine_duck::sim::InputEvent;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Valentine Duck (native) starting...");
    log::info!("Native mode is a scripted visit - serve the wasm build for the real page");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(14);
    let settings = Settings {
        seed: Some(seed),
        ..Settings::default()
    };
    let mut page = HeadlessPage::new(settings, Vec2::new(1280.0, 800.0));
    page.start(false);

    // Chase the No button until the duck melts down
    for _ in 0..8 {
        page.send(InputEvent::PointerEnter);
        log::info!(
            "{:?}: \"{}\" No button at ({:.0}, {:.0})",
            page.controller.phase(),
            page.view.caption,
            page.layout.target.origin.x,
            page.layout.target.origin.y
        );
    }
    page.fire_collapse_timer();

    page.send(InputEvent::ConfirmClick);
    let frames = page.run_frames(10_000);
    log::info!(
        "{:?} after {} escapes, confetti done in {} frames",
        page.controller.phase(),
        page.controller.mood().escape_count(),
        frames
    );
    if let Some(message) = page.view.announcement {
        println!("{message}");
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

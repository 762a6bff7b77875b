//! Browser adapter
//!
//! Binds the controller to the page: DOM events become [`InputEvent`]s,
//! directives become class/style changes, confetti frames run on
//! `requestAnimationFrame`, hearts and the meltdown collapse on `setTimeout`.
//! State lives in one `Rc<RefCell<App>>`; every borrow is dropped before
//! handing a closure back to the browser.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, HtmlImageElement, MediaQueryListEvent, Window,
};

use crate::consts::FALL_MARGIN;
use crate::settings::Settings;
use crate::sim::{
    ConfettiAnimator, Controller, Directive, HeartLoop, HeartSpawn, InputEvent, Layout, Rect,
    TickSource,
};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";
const SUCCESS_SIGN: &str = "<tspan x=\"150\" y=\"44\" font-size=\"18\"></tspan>\
    <tspan x=\"150\" y=\"66\" font-size=\"20\">Yes! \u{1F495}</tspan>";

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn warn_on_err<T>(what: &str, result: Result<T, JsValue>) {
    if let Err(e) = result {
        log::warn!("{} failed: {:?}", what, e);
    }
}

/// Page elements the adapter drives
struct Dom {
    window: Window,
    document: Document,
    yes: HtmlButtonElement,
    no: HtmlButtonElement,
    headline: Element,
    caption: HtmlElement,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    duck: HtmlImageElement,
    sign_text: Element,
    announcer: Element,
    click_hint: Element,
    duck_wrapper: Element,
    wooden_sign: HtmlElement,
    button_row: HtmlElement,
}

impl Dom {
    fn lookup() -> Result<Self, JsValue> {
        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let by_id = |id: &str| {
            document
                .get_element_by_id(id)
                .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))
        };
        let by_selector = |sel: &str| {
            document
                .query_selector(sel)?
                .ok_or_else(|| JsValue::from_str(&format!("missing {sel}")))
        };

        let canvas: HtmlCanvasElement = by_id("confetti-canvas")?.dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;

        Ok(Self {
            yes: by_id("btn-yes")?.dyn_into()?,
            no: by_id("btn-no")?.dyn_into()?,
            headline: by_id("headline")?,
            caption: by_id("anger-caption")?.dyn_into()?,
            duck: by_id("duck-img")?.dyn_into()?,
            sign_text: by_id("sign-text")?,
            announcer: by_id("sr-announcer")?,
            click_hint: by_id("click-hint")?,
            duck_wrapper: by_selector(".duck-wrapper")?,
            wooden_sign: by_selector(".wooden-sign")?.dyn_into()?,
            button_row: by_selector(".button-container")?.dyn_into()?,
            canvas,
            ctx,
            window,
            document,
        })
    }

    fn viewport(&self) -> Vec2 {
        let w = self.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let h = self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Vec2::new(w as f32, h as f32)
    }

    fn rect_of(el: &Element) -> Rect {
        let r = el.get_bounding_client_rect();
        Rect::new(r.left() as f32, r.top() as f32, r.width() as f32, r.height() as f32)
    }

    fn layout(&self) -> Layout {
        let active = self.document.active_element();
        Layout {
            viewport: self.viewport(),
            target: Self::rect_of(&self.no),
            obstacle: Self::rect_of(&self.yes),
            target_focused: self.no.is_same_node(active.as_deref()),
        }
    }

    /// Match the canvas backing store to the viewport and device pixel ratio
    fn resize_canvas(&self) {
        let dpr = self.window.device_pixel_ratio();
        let viewport = self.viewport();
        self.canvas.set_width((viewport.x as f64 * dpr) as u32);
        self.canvas.set_height((viewport.y as f64 * dpr) as u32);
        let style = self.canvas.style();
        warn_on_err("canvas width", style.set_property("width", &format!("{}px", viewport.x)));
        warn_on_err("canvas height", style.set_property("height", &format!("{}px", viewport.y)));
        warn_on_err("reset transform", self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        warn_on_err("scale", self.ctx.scale(dpr, dpr));
    }

    fn clear_canvas(&self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
    }

    fn draw_confetti(&self, confetti: &ConfettiAnimator) {
        self.clear_canvas();
        for p in confetti.visible() {
            self.ctx.save();
            warn_on_err("translate", self.ctx.translate(p.pos.x as f64, p.pos.y as f64));
            warn_on_err("rotate", self.ctx.rotate(p.rotation as f64));
            self.ctx.set_global_alpha(p.opacity.clamp(0.0, 1.0) as f64);
            self.ctx.set_fill_style_str(confetti.color_of(p));
            self.ctx.fill_rect(
                -p.size.x as f64 / 2.0,
                -p.size.y as f64 / 2.0,
                p.size.x as f64,
                p.size.y as f64,
            );
            self.ctx.restore();
        }
    }

    /// Restart a CSS animation class
    fn restart_class(el: &HtmlElement, class: &str) {
        warn_on_err("remove class", el.class_list().remove_1(class));
        // Force reflow so the animation starts over
        let _ = el.offset_width();
        warn_on_err("add class", el.class_list().add_1(class));
    }

    /// Set `--fall-distance` so a flow element lands at the viewport bottom
    fn set_fall_distance(&self, el: &HtmlElement) {
        let rect = el.get_bounding_client_rect();
        let vh = self.viewport().y as f64;
        let dist = vh - rect.bottom() + rect.height() - FALL_MARGIN as f64;
        warn_on_err(
            "fall distance",
            el.style().set_property("--fall-distance", &format!("{dist}px")),
        );
    }

    fn move_target(&self, pos: Vec2) {
        let style = self.no.style();
        if !self.no.class_list().contains("escaping") {
            // Pin the button where it is so the transition starts from here
            let rect = self.no.get_bounding_client_rect();
            warn_on_err("escaping", self.no.class_list().add_1("escaping"));
            warn_on_err("top", style.set_property("top", &format!("{}px", rect.top())));
            warn_on_err("left", style.set_property("left", &format!("{}px", rect.left())));
            let _ = self.no.offset_width();
        }
        warn_on_err("left", style.set_property("left", &format!("{}px", pos.x)));
        warn_on_err("top", style.set_property("top", &format!("{}px", pos.y)));
    }

    fn meltdown(&self, photo: &str) {
        self.duck.set_src(photo);
        warn_on_err("unshake", self.duck.class_list().remove_1("shake"));

        self.set_fall_distance(&self.wooden_sign);
        self.set_fall_distance(&self.caption);
        warn_on_err("sign fall", self.wooden_sign.class_list().add_1("fall"));
        warn_on_err("caption fall", self.caption.class_list().add_1("fall"));

        let rect = self.no.get_bounding_client_rect();
        let top = self.viewport().y as f64 - rect.height() - FALL_MARGIN as f64;
        warn_on_err(
            "fall top",
            self.no.style().set_property("--fall-top", &format!("{top}px")),
        );
        warn_on_err("no fall", self.no.class_list().add_1("fall"));

        self.remove_hearts();
    }

    /// Leave only the Yes button under the photo
    fn collapse(&self) {
        warn_on_err(
            "move yes",
            self.duck_wrapper.insert_adjacent_element("afterend", &self.yes),
        );
        warn_on_err("solo", self.yes.class_list().add_1("solo"));
        self.set_fall_distance(&self.button_row);
        warn_on_err("row fall", self.button_row.class_list().add_1("fall"));
    }

    fn restore_scene(&self) {
        if self.yes.class_list().contains("solo") {
            warn_on_err("unsolo", self.yes.class_list().remove_1("solo"));
        }
        warn_on_err("sign", self.wooden_sign.class_list().remove_1("fall"));
        warn_on_err("caption", self.caption.class_list().remove_1("fall"));
    }

    fn show_success(&self) {
        warn_on_err("headline", self.headline.class_list().add_1("visible"));
        warn_on_err("duck opacity", self.duck.style().set_property("opacity", "1"));
        self.sign_text.set_inner_html(SUCCESS_SIGN);
        warn_on_err(
            "caption color",
            self.caption.style().set_property("color", "var(--pink-dark)"),
        );
        warn_on_err("hide no", self.no.class_list().add_1("hidden"));
        self.yes.set_disabled(true);
        warn_on_err("cursor", self.yes.style().set_property("cursor", "default"));
        warn_on_err("clickable", self.duck.class_list().add_1("clickable"));
        warn_on_err("hint", self.click_hint.class_list().add_1("visible"));
    }

    fn remove_hearts(&self) {
        if let Ok(hearts) = self.document.query_selector_all(".floating-heart") {
            for i in 0..hearts.length() {
                if let Some(el) = hearts.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    el.remove();
                }
            }
        }
    }

    fn add_heart(&self, heart: &HeartSpawn) -> Result<(), JsValue> {
        let el: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        el.set_class_name("floating-heart");
        el.set_text_content(Some(heart.glyph));
        let style = el.style();
        style.set_property("left", &format!("{}vw", heart.left_vw))?;
        style.set_property("bottom", "-2rem")?;
        style.set_property("font-size", &format!("{}rem", heart.font_rem))?;
        style.set_property("--heart-duration", &format!("{}s", heart.duration_s))?;
        style.set_property("--heart-sway", &format!("{}px", heart.sway_px))?;

        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?;
        body.append_child(&el)?;

        let target = el.clone();
        let closure = Closure::once(move |_event: web_sys::Event| target.remove());
        el.add_event_listener_with_callback("animationend", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }
}

/// `requestAnimationFrame` bound as a tick source.
///
/// Requests are recorded while the app is borrowed and turned into a real
/// callback by [`schedule_frame`] afterwards.
#[derive(Default)]
struct RafSource {
    requested: bool,
    handle: Option<i32>,
}

impl TickSource for RafSource {
    fn request_frame(&mut self) {
        self.requested = true;
    }

    fn cancel_frame(&mut self) {
        self.requested = false;
        if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
            warn_on_err("cancel frame", window.cancel_animation_frame(handle));
        }
    }
}

struct App {
    controller: Controller,
    settings: Settings,
    dom: Dom,
    confetti: ConfettiAnimator,
    frames: RafSource,
    hearts: HeartLoop<i32>,
    collapse_timer: Option<i32>,
}

type Shared = Rc<RefCell<App>>;

fn set_timeout(window: &Window, delay_ms: u32, f: impl FnOnce() + 'static) -> Option<i32> {
    let closure = Closure::once(f);
    let handle = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms as i32,
        )
        .map_err(|e| log::warn!("setTimeout failed: {:?}", e))
        .ok();
    closure.forget();
    handle
}

/// Turn a pending frame request into a real `requestAnimationFrame` callback
fn schedule_frame(app: &Shared) {
    let mut a = app.borrow_mut();
    if !a.frames.requested || a.frames.handle.is_some() {
        return;
    }
    a.frames.requested = false;

    let app_clone = app.clone();
    let closure = Closure::once(move |time: f64| confetti_frame(app_clone, time));
    a.frames.handle = a
        .dom
        .window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|e| log::warn!("requestAnimationFrame failed: {:?}", e))
        .ok();
    closure.forget();
}

fn confetti_frame(app: Shared, time: f64) {
    {
        let mut a = app.borrow_mut();
        a.frames.handle = None;
        let App {
            confetti,
            frames,
            dom,
            ..
        } = &mut *a;
        confetti.tick(time, frames);
        if confetti.is_active() {
            dom.draw_confetti(confetti);
        } else {
            dom.clear_canvas();
        }
    }
    schedule_frame(&app);
}

fn spawn_heart(app: Shared) {
    let mut a = app.borrow_mut();
    let App {
        controller,
        hearts,
        dom,
        ..
    } = &mut *a;
    let Some((heart, delay)) = hearts.spawn(controller.rng_mut()) else {
        return;
    };
    warn_on_err("spawn heart", dom.add_heart(&heart));

    let app_clone = app.clone();
    if let Some(handle) = set_timeout(&dom.window, delay, move || spawn_heart(app_clone)) {
        hearts.arm(handle);
    }
}

fn stop_hearts(a: &mut App) {
    if let Some(handle) = a.hearts.stop() {
        a.dom.window.clear_timeout_with_handle(handle);
    }
}

fn announce(a: &App, message: &'static str) {
    // Clear first so repeated messages are read again
    a.dom.announcer.set_text_content(Some(""));
    let announcer = a.dom.announcer.clone();
    let closure = Closure::once(move |_time: f64| announcer.set_text_content(Some(message)));
    warn_on_err(
        "announce",
        a.dom.window.request_animation_frame(closure.as_ref().unchecked_ref()),
    );
    closure.forget();
}

/// Apply controller output to the page
fn apply(app: &Shared, directives: Vec<Directive>) {
    for directive in directives {
        let mut spawn_first_heart = false;
        {
            let mut a = app.borrow_mut();
            match directive {
                Directive::SetMood { level, caption } => {
                    a.dom.duck.set_src(a.settings.images.for_level(level));
                    a.dom.caption.set_text_content(Some(caption));
                }
                Directive::Emphasize => Dom::restart_class(&a.dom.duck, "shake"),
                Directive::ClearEmphasis => {
                    warn_on_err("unshake", a.dom.duck.class_list().remove_1("shake"));
                }
                Directive::MoveTarget(pos) => a.dom.move_target(pos),
                Directive::Announce(message) => announce(&a, message),
                Directive::Meltdown => a.dom.meltdown(&a.settings.images.photo),
                Directive::ScheduleCollapse { delay_ms } => {
                    let app_clone = app.clone();
                    let handle = set_timeout(&a.dom.window, delay_ms, move || {
                        let mut a = app_clone.borrow_mut();
                        a.collapse_timer = None;
                        a.dom.collapse();
                    });
                    a.collapse_timer = handle;
                }
                Directive::RestoreScene => {
                    if let Some(handle) = a.collapse_timer.take() {
                        a.dom.window.clear_timeout_with_handle(handle);
                    }
                    a.dom.restore_scene();
                }
                Directive::StartHearts => {
                    let reduced = a.controller.reduced_motion();
                    spawn_first_heart = a.hearts.start(reduced);
                }
                Directive::StopHearts => stop_hearts(&mut a),
                Directive::LaunchConfetti => {
                    let App {
                        controller,
                        settings,
                        confetti,
                        frames,
                        ..
                    } = &mut *a;
                    confetti.launch(
                        controller.rng_mut(),
                        settings.confetti_count,
                        &settings.palette,
                        now_ms(),
                        frames,
                    );
                }
                Directive::StopConfetti => {
                    let App {
                        confetti,
                        frames,
                        dom,
                        ..
                    } = &mut *a;
                    confetti.stop(frames);
                    dom.clear_canvas();
                }
                Directive::ShowSuccess => a.dom.show_success(),
                Directive::ShowPhoto(photo) => {
                    let src = if photo {
                        a.settings.images.photo.clone()
                    } else {
                        a.settings.images.for_level(0).to_owned()
                    };
                    a.dom.duck.set_src(&src);
                }
                Directive::HideClickHint => {
                    warn_on_err("hint", a.dom.click_hint.class_list().remove_1("visible"));
                }
            }
        }
        if spawn_first_heart {
            spawn_heart(app.clone());
        }
    }
    schedule_frame(app);
}

fn dispatch(app: &Shared, event: InputEvent) {
    let directives = {
        let mut a = app.borrow_mut();
        let layout = a.dom.layout();
        a.controller.handle_input(event, &layout)
    };
    apply(app, directives);
}

fn listen<F>(target: &web_sys::EventTarget, name: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(web_sys::Event) + 'static,
{
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn setup_input_handlers(app: &Shared) -> Result<(), JsValue> {
    let (yes, no, duck, window) = {
        let a = app.borrow();
        (
            a.dom.yes.clone(),
            a.dom.no.clone(),
            a.dom.duck.clone(),
            a.dom.window.clone(),
        )
    };

    {
        let app = app.clone();
        listen(&yes, "click", move |_| dispatch(&app, InputEvent::ConfirmClick))?;
    }
    {
        let app = app.clone();
        listen(&no, "mouseenter", move |_| dispatch(&app, InputEvent::PointerEnter))?;
    }
    {
        let app = app.clone();
        listen(&no, "focus", move |_| dispatch(&app, InputEvent::Focus))?;
    }

    // Touch start needs passive: false to be cancelable
    {
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            event.prevent_default();
            dispatch(&app, InputEvent::TouchStart);
        });
        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(false);
        no.add_event_listener_with_callback_and_add_event_listener_options(
            "touchstart",
            closure.as_ref().unchecked_ref(),
            &options,
        )?;
        closure.forget();
    }

    // Click fallback (fast cursor) and keyboard mercy
    {
        let app = app.clone();
        listen(&no, "click", move |event| {
            event.prevent_default();
            dispatch(&app, InputEvent::Click);
        })?;
    }

    {
        let app = app.clone();
        listen(&duck, "click", move |_| {
            let directives = app.borrow_mut().controller.toggle_photo();
            apply(&app, directives);
        })?;
    }

    {
        let app = app.clone();
        listen(&window, "resize", move |_| {
            {
                let mut a = app.borrow_mut();
                a.dom.resize_canvas();
                let viewport = a.dom.viewport();
                a.confetti.set_viewport(viewport);
            }
            dispatch(&app, InputEvent::ViewportResize);
        })?;
    }

    Ok(())
}

/// Read the reduced-motion preference and follow its changes
fn setup_reduced_motion(app: &Shared) -> Result<bool, JsValue> {
    let window = app.borrow().dom.window.clone();
    let Some(query) = window.match_media(REDUCED_MOTION_QUERY)? else {
        return Ok(false);
    };

    let app = app.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |event: MediaQueryListEvent| {
        let directives = app.borrow_mut().controller.set_reduced_motion(event.matches());
        apply(&app, directives);
    });
    query.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
    closure.forget();

    Ok(query.matches())
}

fn preload(settings: &Settings) {
    for src in settings.images.all() {
        match HtmlImageElement::new() {
            Ok(img) => img.set_src(src),
            Err(e) => log::warn!("Preload of {} failed: {:?}", src, e),
        }
    }
}

/// Wire everything up. Called once the DOM is ready.
pub fn run() -> Result<(), JsValue> {
    let settings = Settings::load();
    console_log::init_with_level(settings.level())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    log::info!("Valentine Duck starting...");

    let dom = Dom::lookup()?;
    dom.resize_canvas();
    preload(&settings);

    let seed = settings.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
    let viewport = dom.viewport();
    let app = Rc::new(RefCell::new(App {
        controller: Controller::new(seed),
        settings,
        confetti: ConfettiAnimator::new(viewport),
        frames: RafSource::default(),
        hearts: HeartLoop::new(),
        collapse_timer: None,
        dom,
    }));

    let reduced_motion = setup_reduced_motion(&app)?;
    let directives = app.borrow_mut().controller.start(reduced_motion);
    apply(&app, directives);

    setup_input_handlers(&app)?;

    log::info!("Duck running!");
    Ok(())
}

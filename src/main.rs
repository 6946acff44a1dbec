//! Breakout R1 entry point
//!
//! In the browser: wires DOM input to the game loop and draws on a 2D canvas.
//! Natively: runs the synthetic input harness headless and prints its report.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, TouchEvent, WheelEvent};

    use breakout_r1::harness::Harness;
    use breakout_r1::sim::{GamePhase, GameState, InputEvent, Key};
    use breakout_r1::{GameLoop, Renderer, Settings};

    const BRICK_COLOR: &str = "#FF8C00";
    const BALL_COLOR: &str = "#FFFFFF";
    const PADDLE_COLOR: &str = "#FF8C00";
    const BACKGROUND: &str = "#000000";

    /// Draws the game on a 2D canvas
    struct CanvasRenderer {
        ctx: CanvasRenderingContext2d,
    }

    impl Renderer for CanvasRenderer {
        fn render(&mut self, state: &GameState) {
            let ctx = &self.ctx;
            let s = &state.settings;
            ctx.set_fill_style_str(BACKGROUND);
            ctx.fill_rect(0.0, 0.0, s.field_width as f64, s.field_height as f64);

            ctx.set_fill_style_str(BRICK_COLOR);
            for brick in state.bricks.iter().filter(|b| b.alive) {
                let r = state.bricks.rect_of(brick.row, brick.col);
                ctx.fill_rect(r.x as f64, r.y as f64, r.w as f64, r.h as f64);
            }

            ctx.set_fill_style_str(BALL_COLOR);
            ctx.begin_path();
            let ball = &state.ball;
            if ctx
                .arc(ball.pos.x as f64, ball.pos.y as f64, ball.radius as f64, 0.0, TAU)
                .is_ok()
            {
                ctx.fill();
            }

            ctx.set_fill_style_str(PADDLE_COLOR);
            let p = state.paddle.rect();
            ctx.fill_rect(p.x as f64, p.y as f64, p.w as f64, p.h as f64);

            ctx.set_fill_style_str(BALL_COLOR);
            ctx.set_font("16px sans-serif");
            let _ = ctx.fill_text(&format!("Score: {}", state.score), 8.0, 20.0);
            let banner = match state.phase {
                GamePhase::Won => Some("YOU WIN!"),
                GamePhase::GameOver => Some("GAME OVER"),
                _ => None,
            };
            if let Some(text) = banner {
                let _ = ctx.fill_text(text, s.field_width as f64 / 2.0 - 48.0, s.field_height as f64 / 2.0);
            }
        }
    }

    /// Game instance plus its canvas
    struct Game {
        game: GameLoop,
        renderer: CanvasRenderer,
        /// A frame callback is pending
        scheduled: bool,
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Breakout R1 starting...");

        let settings = Settings::load();
        // Write back so the stored copy always matches what the game runs with
        settings.save();
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        canvas.set_width(settings.field_width as u32);
        canvas.set_height(settings.field_height as u32);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let seed = js_sys::Date::now() as u64;
        let mut renderer = CanvasRenderer { ctx };
        let game_loop = GameLoop::new(settings, seed);
        renderer.render(&game_loop.state);
        let game = Rc::new(RefCell::new(Game {
            game: game_loop,
            renderer,
            scheduled: false,
        }));

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone())?;
        setup_start_button(game.clone())?;
        setup_test_button(game)?;

        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let document = web_sys::window().ok_or("no window")?.document().ok_or("no document")?;

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = Key::from_dom(&event.key()) {
                    game.borrow_mut().game.push_input(InputEvent::KeyDown(key));
                }
            });
            document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = Key::from_dom(&event.key()) {
                    game.borrow_mut().game.push_input(InputEvent::KeyUp(key));
                }
            });
            document.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Scroll wheel
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: WheelEvent| {
                event.prevent_default();
                let delta_y = event.delta_y() as f32;
                game.borrow_mut().game.push_input(InputEvent::Wheel { delta_y });
            });
            canvas.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch
        let touch_handler = |game: Rc<RefCell<Game>>, make: fn(f32, f32) -> InputEvent| {
            Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let input = make(touch.client_x() as f32, touch.client_y() as f32);
                    game.borrow_mut().game.push_input(input);
                }
            })
        };
        {
            let closure = touch_handler(game.clone(), |x, y| InputEvent::TouchStart { x, y });
            canvas.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let closure = touch_handler(game.clone(), |x, y| InputEvent::TouchMove { x, y });
            canvas.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                game.borrow_mut().game.push_input(InputEvent::TouchEnd);
            });
            canvas.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn set_overlay_hidden(hidden: bool) {
        let overlay = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("gameOverlay"));
        if let Some(el) = overlay {
            let classes = el.class_list();
            let _ = if hidden { classes.add_1("hidden") } else { classes.remove_1("hidden") };
        }
    }

    fn setup_start_button(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let document = web_sys::window().ok_or("no window")?.document().ok_or("no document")?;

        if let Some(btn) = document.get_element_by_id("startButton") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let schedule = {
                    let mut g = game.borrow_mut();
                    g.game.start();
                    !std::mem::replace(&mut g.scheduled, true)
                };
                set_overlay_hidden(true);
                if schedule {
                    request_animation_frame(game.clone());
                }
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_test_button(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let document = web_sys::window().ok_or("no window")?.document().ok_or("no document")?;

        if let Some(btn) = document.get_element_by_id("runTestsButton") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let (settings, live_stats) = {
                    let g = game.borrow();
                    (g.game.state.settings.clone(), g.game.stats.clone())
                };
                let seed = js_sys::Date::now() as u64;
                let report = Harness::new(settings, seed)
                    .run()
                    .with_live_performance(&live_stats);
                report.log_summary();
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let keep_going = {
            let mut g = game.borrow_mut();
            let Game { game: inner, renderer, scheduled } = &mut *g;
            if inner.should_continue() {
                inner.frame(time, renderer);
            }
            *scheduled = inner.should_continue();
            *scheduled
        };

        if keep_going {
            request_animation_frame(game);
        } else {
            set_overlay_hidden(false);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use breakout_r1::Settings;
    use breakout_r1::harness::Harness;

    env_logger::init();
    log::info!("Breakout R1 (native) starting...");
    log::info!("Native mode runs the input harness headless - build for wasm32 to play");

    let seed = std::env::var("BREAKOUT_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let report = Harness::new(Settings::load(), seed).run();
    report.log_summary();

    match report.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize report: {}", e),
    }

    if !report.all_passed() {
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

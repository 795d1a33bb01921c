//! Dodge Cars entry point
//!
//! On the web this wires the DOM (canvas, buttons, keyboard), the relay
//! bridge and the leaderboard around the simulation. Natively it runs a
//! headless autopilot demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement};

    use dodge_cars::config::{Config, GameConfig};
    use dodge_cars::leaderboard::{self, LeaderboardView, client};
    use dodge_cars::sim::{Direction, InboundEvent, InputState, Simulation, StateSnapshot};

    // Relay bridge: the page's socket glue exposes `window.dodgeRelay.emit`
    #[wasm_bindgen(inline_js = "
        export function relay_emit(event, payload) {
            const relay = window.dodgeRelay;
            if (relay && typeof relay.emit === 'function') {
                relay.emit(event, JSON.parse(payload));
            }
        }
    ")]
    extern "C" {
        fn relay_emit(event: &str, payload: &str);
    }

    thread_local! {
        static GAME: RefCell<Option<Rc<RefCell<Game>>>> = const { RefCell::new(None) };
    }

    /// Game instance holding all state
    struct Game {
        sim: Simulation,
        input: InputState,
        scores: LeaderboardView,
        config: Config,
        ctx: CanvasRenderingContext2d,
        /// Game over screen already shown for this run
        over_shown: bool,
    }

    impl Game {
        fn restart(&mut self) {
            let seed = js_sys::Date::now() as u64;
            self.sim.start_with_seed(seed);
            self.input.clear();
            self.over_shown = false;
            if let Some(document) = document() {
                set_class(&document, "gameOverScreen", "active", false);
                if let Some(input) = name_input(&document) {
                    input.set_value("");
                }
            }
        }

        /// Run one frame: resolve input, step, flush relay events
        fn frame(&mut self) {
            let intent = self.input.resolve();
            let snapshot = self.sim.step(intent);
            for event in self.sim.drain_events() {
                relay_emit(event.name(), &event.payload_json());
            }
            self.draw(&snapshot);
            self.update_hud(&snapshot);
        }

        fn draw(&self, snapshot: &StateSnapshot) {
            let game = self.sim.config();
            let ctx = &self.ctx;
            ctx.clear_rect(0.0, 0.0, game.track_width as f64, game.track_height as f64);

            // Lane markers
            ctx.set_fill_style_str("#7f8c8d");
            let period = (dodge_cars::consts::ROAD_MARKER_LENGTH + dodge_cars::consts::ROAD_MARKER_GAP) as f64;
            let lane_width = game.lane_width() as f64;
            for lane in 1..game.lane_count {
                let x = lane as f64 * lane_width - 5.0;
                let mut y = snapshot.road_offset as f64 - period;
                while y < game.track_height as f64 {
                    ctx.fill_rect(x, y, 10.0, dodge_cars::consts::ROAD_MARKER_LENGTH as f64);
                    y += period;
                }
            }

            for ghost in &snapshot.remote_players {
                draw_car(ctx, ghost.x, ghost.y, game.player_width, game.player_height, "blue");
            }
            draw_car(
                ctx,
                snapshot.player.x,
                snapshot.player.y,
                game.player_width,
                game.player_height,
                "red",
            );
            for obstacle in &snapshot.obstacles {
                draw_car(
                    ctx,
                    obstacle.x,
                    obstacle.y,
                    game.obstacle_width,
                    game.obstacle_height,
                    &obstacle.color.to_string(),
                );
            }
        }

        fn update_hud(&mut self, snapshot: &StateSnapshot) {
            let Some(document) = document() else { return };
            set_text(&document, "scoreValue", &snapshot.score.to_string());
            set_text(&document, "stageValue", &snapshot.stage.to_string());

            if snapshot.is_over && !self.over_shown {
                self.over_shown = true;
                set_text(&document, "finalScore", &snapshot.score.to_string());
                set_class(&document, "gameOverScreen", "active", true);
            }
        }
    }

    fn draw_car(ctx: &CanvasRenderingContext2d, x: f32, y: f32, w: f32, h: f32, color: &str) {
        let (x, y, w, h) = (x as f64, y as f64, w as f64, h as f64);
        ctx.set_fill_style_str(color);
        ctx.fill_rect(x, y, w, h);
        // Windows and wheels
        ctx.set_fill_style_str("black");
        ctx.fill_rect(x + 5.0, y + 10.0, w - 10.0, 15.0);
        ctx.fill_rect(x + 5.0, y + h - 25.0, w - 10.0, 15.0);
        ctx.begin_path();
        let _ = ctx.arc(x + 10.0, y + h - 10.0, 5.0, 0.0, TAU);
        let _ = ctx.arc(x + w - 10.0, y + h - 10.0, 5.0, 0.0, TAU);
        ctx.fill();
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(document: &Document, id: &str, class: &str, on: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let list = el.class_list();
            let _ = if on { list.add_1(class) } else { list.remove_1(class) };
        }
    }

    fn name_input(document: &Document) -> Option<HtmlInputElement> {
        document
            .get_element_by_id("playerNameInput")?
            .dyn_into::<HtmlInputElement>()
            .ok()
    }

    fn render_scores(game: &Game) {
        let Some(document) = document() else { return };
        let Some(list) = document.get_element_by_id("highScoresList") else {
            return;
        };
        list.set_inner_html("");
        for line in game.scores.lines() {
            if let Ok(li) = document.create_element("li") {
                li.set_text_content(Some(&line));
                let _ = list.append_child(&li);
            }
        }
    }

    /// Fetch the leaderboard without blocking the frame loop
    fn refresh_scores(game: Rc<RefCell<Game>>) {
        let url = game.borrow().config.network.highscores_url();
        wasm_bindgen_futures::spawn_local(async move {
            let result = client::fetch(&url).await;
            let mut g = game.borrow_mut();
            g.scores.apply_fetch(result);
            render_scores(&g);
        });
    }

    fn submit_score(game: Rc<RefCell<Game>>) {
        let name = document()
            .and_then(|d| name_input(&d))
            .map(|input| input.value())
            .unwrap_or_default();
        let (url, score) = {
            let g = game.borrow();
            (g.config.network.highscores_url(), g.sim.state().score)
        };

        let entry = match leaderboard::submission(&name, score) {
            Ok(entry) => entry,
            Err(e) => {
                let mut g = game.borrow_mut();
                g.scores.apply_submit(Err(e));
                render_scores(&g);
                return;
            }
        };

        wasm_bindgen_futures::spawn_local(async move {
            let result = client::submit(&url, &entry).await;
            let ok = {
                let mut g = game.borrow_mut();
                let ok = g.scores.apply_submit(result);
                render_scores(&g);
                ok
            };
            if ok {
                if let Some(document) = document() {
                    set_class(&document, "gameOverScreen", "active", false);
                }
                refresh_scores(game);
            }
        });
    }

    /// Called by the page's socket glue once connected
    #[wasm_bindgen]
    pub fn relay_connected(id: &str) {
        log::info!("Connected to game server as {}", id);
        GAME.with(|cell| {
            if let Some(game) = cell.borrow().as_ref() {
                game.borrow_mut().sim.set_local_id(id);
                refresh_scores(game.clone());
            }
        });
    }

    /// Called by the page's socket glue for every relay message
    #[wasm_bindgen]
    pub fn relay_receive(event: &str, payload: &str) {
        GAME.with(|cell| {
            let Some(game) = cell.borrow().as_ref().cloned() else {
                return;
            };
            let received = game.borrow_mut().sim.receive(event, payload);
            if let Some(InboundEvent::HighScoresUpdated(entries)) = received {
                let mut g = game.borrow_mut();
                g.scores.apply_fetch(Ok(entries));
                render_scores(&g);
            }
        });
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Dodge Cars starting...");

        let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;

        // Track size follows the canvas
        let mut config = Config::load();
        config.game = GameConfig {
            track_width: canvas.width() as f32,
            track_height: canvas.height() as f32,
            ..config.game
        };

        let seed = js_sys::Date::now() as u64;
        let sim = Simulation::new(config.game.clone(), seed).or_else(|e| {
            log::warn!("Canvas-sized config rejected ({}), using defaults", e);
            config.game = GameConfig::default();
            Simulation::new(config.game.clone(), seed)
        });
        let sim = sim.map_err(|e| JsValue::from_str(&e.to_string()))?;

        let game = Rc::new(RefCell::new(Game {
            sim,
            input: InputState::new(),
            scores: LeaderboardView::new(),
            config,
            ctx,
            over_shown: false,
        }));
        GAME.with(|cell| *cell.borrow_mut() = Some(game.clone()));

        setup_keyboard(game.clone());
        setup_touch_buttons(game.clone());
        setup_buttons(game.clone());

        game.borrow_mut().restart();
        refresh_scores(game.clone());
        request_animation_frame(game);

        log::info!("Dodge Cars running with seed {}", seed);
        Ok(())
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut g = game.borrow_mut();
            if g.sim.state().is_over() {
                return;
            }
            match event.key().as_str() {
                "ArrowLeft" => g.input.press(Direction::Left),
                "ArrowRight" => g.input.press(Direction::Right),
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_touch_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };
        for (id, direction) in [("leftButton", Direction::Left), ("rightButton", Direction::Right)] {
            let Some(button) = document.get_element_by_id(id) else {
                continue;
            };

            {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::TouchEvent| {
                    event.prevent_default(); // no scroll/zoom
                    game.borrow_mut().input.hold(direction);
                });
                let _ = button
                    .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
                closure.forget();
            }

            for release in ["touchend", "touchcancel"] {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::TouchEvent| {
                    event.prevent_default();
                    game.borrow_mut().input.release(direction);
                });
                let _ = button
                    .add_event_listener_with_callback(release, closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };

        if let Some(btn) = document.get_element_by_id("restartGameBtn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().restart();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("submitScoreBtn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                submit_score(game.clone());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        game.borrow_mut().frame();
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

/// Frames the native demo runs before giving up (10 minutes at 60 Hz)
#[cfg(not(target_arch = "wasm32"))]
const DEMO_MAX_FRAMES: u64 = 60 * 60 * 10;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use dodge_cars::config::Config;
    use dodge_cars::sim::{OutboundEvent, Simulation, autopilot_intent};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Dodge Cars (native) starting...");
    log::info!("Native mode runs a headless autopilot demo - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(12345);

    let config = Config::load();
    let mut sim = match Simulation::new(config.game, seed) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };

    sim.start_with_seed(seed);
    let (mut moves, mut spawns) = (0usize, 0usize);
    while sim.state().frame < DEMO_MAX_FRAMES {
        let intent = autopilot_intent(sim.state(), sim.config());
        let snapshot = sim.step(intent);
        for event in sim.drain_events() {
            match event {
                OutboundEvent::PlayerMoved { .. } => moves += 1,
                OutboundEvent::ObstacleSpawned(_) => spawns += 1,
            }
        }
        if snapshot.is_over {
            break;
        }
    }

    let snapshot = sim.snapshot();
    log::info!(
        "Demo finished after {} frames: score {}, stage {}, {} moves, {} spawns{}",
        snapshot.frame,
        snapshot.score,
        snapshot.stage,
        moves,
        spawns,
        if snapshot.is_over { "" } else { " (survived)" }
    );
}

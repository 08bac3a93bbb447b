//! Pixolve page wiring: auth, lobby setup over REST, gameplay over the
//! websocket channel, and canvas rendering of the reveal.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::console;
use gloo::timers::callback::{Interval, Timeout};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    CanvasRenderingContext2d, Document, Event, HtmlCanvasElement, HtmlElement, HtmlImageElement,
    HtmlInputElement, HtmlSelectElement,
};

use crate::channel::{authenticated_url, Channel, ChannelHooks, ChannelStatus};
use crate::config::{PIXOLVE_TOKEN_KEY, PIXOLVE_USERNAME_KEY, PIXOLVE_WS_URL};
use crate::dom::{by_id, document, escape_html};
use crate::pixolve::api::{self, Lobby, LobbyCreate, PlayerInLobby, Profile};
use crate::pixolve::protocol::{ClientMsg, PlayerRef, ProtocolError, ServerMsg};
use crate::pixolve::state::{Phase, PixolveState, UiEvent};
use crate::session;

struct PixolveEls {
    // auth
    login_view: HtmlElement,
    username_input: HtmlInputElement,
    password_input: HtmlInputElement,
    login_btn: HtmlElement,
    register_btn: HtmlElement,
    auth_error: HtmlElement,
    // lobby
    lobby_view: HtmlElement,
    category_select: HtmlSelectElement,
    rounds_input: HtmlInputElement,
    max_players_input: HtmlInputElement,
    create_lobby_btn: HtmlElement,
    join_code_btn: HtmlElement,
    leave_lobby_btn: HtmlElement,
    ready_btn: HtmlElement,
    start_game_btn: HtmlElement,
    join_code_label: HtmlElement,
    player_list: HtmlElement,
    chat_window: HtmlElement,
    chat_input: HtmlInputElement,
    chat_send_btn: HtmlElement,
    // game
    game_view: HtmlElement,
    round_label: HtmlElement,
    timer_label: HtmlElement,
    guess_input: HtmlInputElement,
    guess_btn: HtmlElement,
    feed_list: HtmlElement,
    scoreboard_list: HtmlElement,
    game_canvas: HtmlCanvasElement,
    game_image: HtmlImageElement,
    // end screen
    final_view: HtmlElement,
    final_scores: HtmlElement,
    // shared
    status_label: HtmlElement,
    error_banner: HtmlElement,
}

impl PixolveEls {
    fn lookup(document: &Document) -> Result<PixolveEls, JsValue> {
        Ok(PixolveEls {
            login_view: by_id(document, "loginView")?,
            username_input: by_id(document, "usernameInput")?,
            password_input: by_id(document, "passwordInput")?,
            login_btn: by_id(document, "loginBtn")?,
            register_btn: by_id(document, "registerBtn")?,
            auth_error: by_id(document, "authError")?,
            lobby_view: by_id(document, "lobbyView")?,
            category_select: by_id(document, "categorySelect")?,
            rounds_input: by_id(document, "roundsInput")?,
            max_players_input: by_id(document, "maxPlayersInput")?,
            create_lobby_btn: by_id(document, "createLobbyBtn")?,
            join_code_btn: by_id(document, "joinCodeBtn")?,
            leave_lobby_btn: by_id(document, "leaveLobbyBtn")?,
            ready_btn: by_id(document, "readyBtn")?,
            start_game_btn: by_id(document, "startGameBtn")?,
            join_code_label: by_id(document, "joinCodeLabel")?,
            player_list: by_id(document, "playerList")?,
            chat_window: by_id(document, "chatWindow")?,
            chat_input: by_id(document, "chatInput")?,
            chat_send_btn: by_id(document, "chatSendBtn")?,
            game_view: by_id(document, "gameView")?,
            round_label: by_id(document, "roundLabel")?,
            timer_label: by_id(document, "timerLabel")?,
            guess_input: by_id(document, "guessInput")?,
            guess_btn: by_id(document, "guessBtn")?,
            feed_list: by_id(document, "feedList")?,
            scoreboard_list: by_id(document, "scoreboardList")?,
            game_canvas: by_id(document, "gameCanvas")?,
            game_image: by_id(document, "gameImage")?,
            final_view: by_id(document, "finalView")?,
            final_scores: by_id(document, "finalScores")?,
            status_label: by_id(document, "statusLabel")?,
            error_banner: by_id(document, "errorBanner")?,
        })
    }
}

struct App {
    els: PixolveEls,
    state: RefCell<PixolveState>,
    profile: RefCell<Option<Profile>>,
    lobby: RefCell<Option<Lobby>>,
    channel: RefCell<Option<Channel>>,
    countdown: RefCell<Option<Interval>>,
}

pub fn run() -> Result<(), JsValue> {
    let document = document()?;
    let app = Rc::new(App {
        els: PixolveEls::lookup(&document)?,
        state: RefCell::new(PixolveState::default()),
        profile: RefCell::new(None),
        lobby: RefCell::new(None),
        channel: RefCell::new(None),
        countdown: RefCell::new(None),
    });

    wire_auth(&app)?;
    wire_lobby(&app)?;
    wire_game(&app)?;

    match session::stored_token(PIXOLVE_TOKEN_KEY) {
        Some(token) => {
            let app = app.clone();
            spawn_local(async move { bootstrap(app, token).await });
        }
        None => app.show_login(),
    }
    Ok(())
}

async fn bootstrap(app: Rc<App>, token: String) {
    match session::fetch_profile::<Profile>("/auth/me", &token).await {
        Ok(profile) => {
            *app.profile.borrow_mut() = Some(profile);
            app.els.login_view.set_hidden(true);
            app.render_phase();
            load_categories(&app).await;
        }
        Err(_) => {
            session::clear_token(PIXOLVE_TOKEN_KEY);
            session::clear_token(PIXOLVE_USERNAME_KEY);
            app.show_login();
        }
    }
}

async fn load_categories(app: &Rc<App>) {
    match api::list_categories().await {
        Ok(categories) => {
            let options = categories
                .iter()
                .map(|category| {
                    format!(
                        "<option value=\"{}\">{}</option>",
                        escape_html(&category.id),
                        escape_html(&category.name)
                    )
                })
                .collect::<String>();
            app.els.category_select.set_inner_html(&options);
        }
        Err(err) => console::warn!("failed to load categories", err.to_string()),
    }
}

fn wire_auth(app: &Rc<App>) -> Result<(), JsValue> {
    on_click(&app.els.login_btn, {
        let app = app.clone();
        move || submit_auth(&app, false)
    })?;
    on_click(&app.els.register_btn, {
        let app = app.clone();
        move || submit_auth(&app, true)
    })?;
    Ok(())
}

fn submit_auth(app: &Rc<App>, register_first: bool) {
    let credentials = api::Credentials {
        username: app.els.username_input.value().trim().to_string(),
        password: app.els.password_input.value(),
    };
    if credentials.username.is_empty() || credentials.password.is_empty() {
        app.els
            .auth_error
            .set_text_content(Some("Username and password are required."));
        return;
    }
    let app = app.clone();
    spawn_local(async move {
        if register_first {
            if let Err(err) = api::register(&credentials).await {
                app.els.auth_error.set_text_content(Some(&err.to_string()));
                return;
            }
        }
        match api::login(&credentials).await {
            Ok(token) => {
                session::store_token(PIXOLVE_TOKEN_KEY, &token.access_token);
                session::store_token(PIXOLVE_USERNAME_KEY, &credentials.username);
                bootstrap(app.clone(), token.access_token).await;
            }
            Err(err) => app.els.auth_error.set_text_content(Some(&err.to_string())),
        }
    });
}

fn wire_lobby(app: &Rc<App>) -> Result<(), JsValue> {
    on_click(&app.els.create_lobby_btn, {
        let app = app.clone();
        move || {
            let app = app.clone();
            spawn_local(async move { create_lobby(app).await });
        }
    })?;
    on_click(&app.els.join_code_btn, {
        let app = app.clone();
        move || {
            let code = prompt("Enter join code");
            let code = match code {
                Some(code) if !code.trim().is_empty() => code.trim().to_string(),
                _ => return,
            };
            let app = app.clone();
            spawn_local(async move { join_by_code(app, code).await });
        }
    })?;
    on_click(&app.els.leave_lobby_btn, {
        let app = app.clone();
        move || {
            let app = app.clone();
            spawn_local(async move { leave_lobby(app).await });
        }
    })?;
    on_click(&app.els.ready_btn, {
        let app = app.clone();
        move || app.toggle_ready()
    })?;
    on_click(&app.els.start_game_btn, {
        let app = app.clone();
        move || app.start_game()
    })?;
    on_click(&app.els.chat_send_btn, {
        let app = app.clone();
        move || app.send_chat()
    })?;
    Ok(())
}

fn wire_game(app: &Rc<App>) -> Result<(), JsValue> {
    on_click(&app.els.guess_btn, {
        let app = app.clone();
        move || app.submit_guess()
    })?;

    // The image loads asynchronously after each round start; redraw then.
    let on_load = {
        let app = app.clone();
        Closure::wrap(Box::new(move |_event: Event| {
            app.redraw_canvas();
        }) as Box<dyn FnMut(Event)>)
    };
    app.els
        .game_image
        .add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())?;
    on_load.forget();
    Ok(())
}

async fn create_lobby(app: Rc<App>) {
    let host_id = match app.profile.borrow().as_ref() {
        Some(profile) => profile.username.clone(),
        None => return,
    };
    let body = LobbyCreate {
        host_id,
        max_players: parse_count(&app.els.max_players_input, 5),
        rounds: parse_count(&app.els.rounds_input, 5),
        category: Some(app.els.category_select.value()).filter(|id| !id.is_empty()),
    };
    match api::create_lobby(&body).await {
        Ok(lobby) => app.enter_lobby(lobby),
        Err(err) => app.report_error(&err.to_string()),
    }
}

async fn join_by_code(app: Rc<App>, code: String) {
    let player = match app.self_player() {
        Some(player) => player,
        None => return,
    };
    match api::join_by_code(&code, &player).await {
        Ok(joined) => app.enter_lobby(joined.lobby),
        Err(err) => app.report_error(&err.to_string()),
    }
}

async fn leave_lobby(app: Rc<App>) {
    let (lobby_id, player) = {
        let lobby = app.lobby.borrow();
        match (lobby.as_ref(), app.self_player()) {
            (Some(lobby), Some(player)) => (lobby.id.clone(), player),
            _ => return,
        }
    };
    if let Err(err) = api::leave_lobby(&lobby_id, &player).await {
        console::warn!("leave lobby failed", err.to_string());
    }
    if let Some(channel) = app.channel.borrow_mut().take() {
        channel.close();
    }
    app.countdown.borrow_mut().take();
    app.lobby.borrow_mut().take();
    *app.state.borrow_mut() = PixolveState::default();
    app.els.player_list.set_inner_html("");
    app.els.chat_window.set_inner_html("");
    app.els.feed_list.set_inner_html("");
    app.els.join_code_label.set_text_content(None);
    app.render_phase();
}

impl App {
    fn show_login(&self) {
        self.els.login_view.set_hidden(false);
        self.els.lobby_view.set_hidden(true);
        self.els.game_view.set_hidden(true);
        self.els.final_view.set_hidden(true);
    }

    fn self_player(&self) -> Option<PlayerInLobby> {
        let profile = self.profile.borrow();
        let profile = profile.as_ref()?;
        Some(PlayerInLobby {
            id: profile.username.clone(),
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            ready: false,
        })
    }

    fn enter_lobby(self: &Rc<Self>, lobby: Lobby) {
        if let Some(code) = lobby.join_code.as_deref() {
            self.els.join_code_label.set_text_content(Some(code));
        }
        let lobby_id = lobby.id.clone();
        *self.lobby.borrow_mut() = Some(lobby);
        *self.state.borrow_mut() = PixolveState::default();
        self.render_phase();
        if let Err(err) = self.connect_ws(&lobby_id) {
            self.report_error(&format!("connection failed: {err:?}"));
        }
    }

    /// Opens the gameplay channel for a lobby, replacing any previous one.
    fn connect_ws(self: &Rc<Self>, lobby_id: &str) -> Result<(), JsValue> {
        if let Some(previous) = self.channel.borrow_mut().take() {
            previous.close();
        }
        let token = session::stored_token(PIXOLVE_TOKEN_KEY)
            .ok_or_else(|| JsValue::from_str("no stored credential"))?;
        let username = self
            .profile
            .borrow()
            .as_ref()
            .map(|profile| profile.username.clone())
            .ok_or_else(|| JsValue::from_str("no profile"))?;

        let url = authenticated_url(PIXOLVE_WS_URL, Some(&token), &[("lobby", lobby_id)])
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let presence = ClientMsg::presence(PlayerRef::new(username.clone(), username))
            .to_frame()
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        let hooks = ChannelHooks {
            on_open: {
                let app = self.clone();
                Rc::new(move || app.els.error_banner.set_text_content(None))
            },
            on_frame: {
                let app = self.clone();
                Rc::new(move |raw: String| app.handle_frame(&raw))
            },
            on_status: {
                let app = self.clone();
                Rc::new(move |status: ChannelStatus| {
                    let label = match status {
                        ChannelStatus::Connecting => "Connecting...",
                        ChannelStatus::Open => "Connected",
                        ChannelStatus::Closed => "Reconnecting...",
                    };
                    app.els.status_label.set_text_content(Some(label));
                })
            },
            on_auth_rejected: Rc::new(move || {
                session::clear_token(PIXOLVE_TOKEN_KEY);
                session::clear_token(PIXOLVE_USERNAME_KEY);
                session::redirect(crate::config::PIXOLVE_ENTRY_PATH);
            }),
        };

        let channel = Channel::open(url, presence, hooks)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        *self.channel.borrow_mut() = Some(channel);
        self.start_countdown();
        Ok(())
    }

    fn start_countdown(self: &Rc<Self>) {
        let app = self.clone();
        *self.countdown.borrow_mut() = Some(Interval::new(1_000, move || {
            if app.state.borrow_mut().tick_second() {
                app.render_round();
            }
        }));
    }

    fn handle_frame(self: &Rc<Self>, raw: &str) {
        match ServerMsg::parse(raw) {
            Ok(msg) => {
                let events = self.state.borrow_mut().apply(msg);
                self.render_events(&events);
            }
            Err(ProtocolError::NotJson) | Err(ProtocolError::MissingTag) => {
                console::warn!("dropped non-protocol frame");
            }
            Err(err) => console::warn!("dropped malformed frame", err.to_string()),
        }
    }

    fn render_events(self: &Rc<Self>, events: &[UiEvent]) {
        for event in events {
            match event {
                UiEvent::PlayersChanged => self.render_players(),
                UiEvent::ChatAppended => self.render_chat(),
                UiEvent::FeedAppended => self.render_feed(),
                UiEvent::ScoresChanged => self.render_scores(),
                UiEvent::RoundChanged => self.render_round(),
                UiEvent::ImageChanged => self.render_image(),
                UiEvent::GamePhaseChanged => self.render_phase(),
                UiEvent::PulseCorrect => self.pulse_canvas(),
                UiEvent::ErrorReported(message) => self.report_error(message),
            }
        }
    }

    fn send_or_notice(&self, msg: &ClientMsg) {
        let frame = match msg.to_frame() {
            Ok(frame) => frame,
            Err(err) => {
                console::error!("frame encode failed", err.to_string());
                return;
            }
        };
        let sent = self
            .channel
            .borrow()
            .as_ref()
            .map(|channel| channel.send(&frame).is_ok())
            .unwrap_or(false);
        if !sent {
            self.report_error("Not connected.");
        }
    }

    fn toggle_ready(&self) {
        let username = match self.profile.borrow().as_ref() {
            Some(profile) => profile.username.clone(),
            None => return,
        };
        let currently_ready = self
            .state
            .borrow()
            .players
            .iter()
            .find(|player| player.id == username)
            .map(|player| player.ready)
            .unwrap_or(false);
        self.send_or_notice(&ClientMsg::PlayerReady {
            player_id: username,
            ready: !currently_ready,
        });
    }

    fn start_game(&self) {
        let username = match self.profile.borrow().as_ref() {
            Some(profile) => profile.username.clone(),
            None => return,
        };
        let host_id = match self.lobby.borrow().as_ref() {
            Some(lobby) => lobby.host_id.clone(),
            None => return,
        };
        if !self.state.borrow().can_start(&username, &host_id) {
            self.report_error("Need the host and at least 2 players to start.");
            return;
        }
        self.send_or_notice(&ClientMsg::StartGame {
            player: PlayerRef::new(username.clone(), username),
        });
    }

    fn send_chat(self: &Rc<Self>) {
        let text = self.els.chat_input.value();
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        let username = match self.profile.borrow().as_ref() {
            Some(profile) => profile.username.clone(),
            None => return,
        };
        // No local echo: the line appears when the server broadcasts it back.
        self.send_or_notice(&ClientMsg::Chat {
            player: username,
            text,
        });
        self.els.chat_input.set_value("");
    }

    fn submit_guess(&self) {
        let text = self.els.guess_input.value();
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        let username = match self.profile.borrow().as_ref() {
            Some(profile) => profile.username.clone(),
            None => return,
        };
        self.send_or_notice(&ClientMsg::SubmitGuess {
            player_id: username,
            text,
        });
        self.els.guess_input.set_value("");
    }

    fn report_error(&self, message: &str) {
        self.els.error_banner.set_text_content(Some(message));
    }

    fn render_phase(&self) {
        let phase = self.state.borrow().phase();
        self.els.login_view.set_hidden(true);
        self.els.lobby_view.set_hidden(phase != Phase::Lobby);
        self.els.game_view.set_hidden(phase != Phase::InGame);
        self.els.final_view.set_hidden(phase != Phase::Finished);
        if phase == Phase::Finished {
            self.render_final_scores();
        }
    }

    fn render_players(&self) {
        let state = self.state.borrow();
        let host_id = self
            .lobby
            .borrow()
            .as_ref()
            .map(|lobby| lobby.host_id.clone())
            .unwrap_or_default();
        let rows = state
            .players
            .iter()
            .map(|player| {
                let ready = if player.ready { "ready" } else { "waiting" };
                let host = if player.id == host_id { " (host)" } else { "" };
                format!(
                    "<li class=\"{ready}\">{}{host}</li>",
                    escape_html(player.label())
                )
            })
            .collect::<String>();
        self.els.player_list.set_inner_html(&rows);
    }

    fn render_chat(&self) {
        let state = self.state.borrow();
        let rendered = self.els.chat_window.child_element_count() as usize;
        for line in state.chat.iter().skip(rendered) {
            let html = format!(
                "<div class=\"chat-line\"><span class=\"sender\">{}:</span> {}</div>",
                escape_html(&line.player),
                escape_html(&line.text)
            );
            if let Err(err) = append_html(&self.els.chat_window, &html) {
                console::warn!("chat render failed", err);
            }
        }
        self.els
            .chat_window
            .set_scroll_top(self.els.chat_window.scroll_height());
    }

    fn render_feed(&self) {
        let state = self.state.borrow();
        let rendered = self.els.feed_list.child_element_count() as usize;
        for line in state.feed.iter().skip(rendered) {
            let html = format!("<div class=\"feed-line\">{}</div>", escape_html(line));
            if let Err(err) = append_html(&self.els.feed_list, &html) {
                console::warn!("feed render failed", err);
            }
        }
        self.els
            .feed_list
            .set_scroll_top(self.els.feed_list.scroll_height());
    }

    fn render_scores(&self) {
        let rows = self
            .state
            .borrow()
            .standings()
            .into_iter()
            .map(|(player, score)| {
                format!(
                    "<li><span class=\"player\">{}</span> <span class=\"score\">{score}</span></li>",
                    escape_html(&player)
                )
            })
            .collect::<String>();
        self.els.scoreboard_list.set_inner_html(&rows);
    }

    fn render_final_scores(&self) {
        let rows = self
            .state
            .borrow()
            .standings()
            .into_iter()
            .enumerate()
            .map(|(rank, (player, score))| {
                format!(
                    "<li>#{} {} \u{2014} {score}</li>",
                    rank + 1,
                    escape_html(&player)
                )
            })
            .collect::<String>();
        self.els.final_scores.set_inner_html(&rows);
    }

    fn render_round(&self) {
        let state = self.state.borrow();
        let round = match state.round.as_ref() {
            Some(round) => round,
            None => return,
        };
        self.els
            .round_label
            .set_text_content(Some(&format!("Round {}", round.round_index)));
        let timer = if round.ended {
            "Round over".to_string()
        } else {
            format!("{}s", round.time_remaining_secs)
        };
        self.els.timer_label.set_text_content(Some(&timer));
    }

    /// Points the hidden source image at the current round's asset. The
    /// canvas redraw happens in the image's load handler.
    fn render_image(&self) {
        let state = self.state.borrow();
        let round = match state.round.as_ref() {
            Some(round) => round,
            None => return,
        };
        let url = api::pixelated_image_url(&round.image_id, 0, 16);
        if self.els.game_image.src().ends_with(&url) {
            // Same asset; only the pixelation changed.
            drop(state);
            self.redraw_canvas();
        } else {
            self.els.game_image.set_src(&url);
        }
    }

    fn redraw_canvas(&self) {
        let pixelation = match self.state.borrow().round.as_ref() {
            Some(round) => round.pixelation,
            None => return,
        };
        if let Err(err) = draw_pixelated(&self.els.game_canvas, &self.els.game_image, pixelation) {
            console::warn!("canvas draw failed", err);
        }
    }

    fn pulse_canvas(&self) {
        let style = self.els.game_canvas.style();
        let _ = style.set_property("box-shadow", "0 0 24px rgba(0,255,247,0.18)");
        let canvas = self.els.game_canvas.clone();
        Timeout::new(300, move || {
            let _ = canvas.style().set_property("box-shadow", "none");
        })
        .forget();
    }
}

fn on_click<F: FnMut() + 'static>(target: &HtmlElement, mut handler: F) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move |_event: Event| handler()) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn prompt(message: &str) -> Option<String> {
    web_sys::window()?
        .prompt_with_message(message)
        .ok()
        .flatten()
}

fn parse_count(input: &HtmlInputElement, fallback: u32) -> u32 {
    input.value().trim().parse().unwrap_or(fallback)
}

fn append_html(target: &HtmlElement, html: &str) -> Result<(), JsValue> {
    let document = document()?;
    let wrapper = document.create_element("div")?;
    wrapper.set_inner_html(html);
    if let Some(child) = wrapper.first_element_child() {
        target.append_child(&child)?;
    }
    Ok(())
}

/// Draws the source image at the requested pixelation: downscale to an
/// offscreen canvas, then scale back up with smoothing off. Pixelation 0
/// draws the image untouched.
fn draw_pixelated(
    canvas: &HtmlCanvasElement,
    image: &HtmlImageElement,
    pixelation: u32,
) -> Result<(), JsValue> {
    let width = image.natural_width().max(1);
    let height = image.natural_height().max(1);
    canvas.set_width(width);
    canvas.set_height(height);
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    ctx.set_image_smoothing_enabled(false);
    ctx.clear_rect(0.0, 0.0, width as f64, height as f64);

    if pixelation == 0 {
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            0.0,
            0.0,
            width as f64,
            height as f64,
        )?;
        return Ok(());
    }

    let sx = (width / pixelation).max(1);
    let sy = (height / pixelation).max(1);
    let document = document()?;
    let off = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    off.set_width(sx);
    off.set_height(sy);
    let octx = off
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    octx.set_image_smoothing_enabled(false);
    octx.draw_image_with_html_image_element_and_dw_and_dh(
        image,
        0.0,
        0.0,
        sx as f64,
        sy as f64,
    )?;
    ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
        &off,
        0.0,
        0.0,
        width as f64,
        height as f64,
    )?;
    Ok(())
}

//! MUD page wiring: bootstrap, channel lifecycle, DOM rendering.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::console;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Event, HtmlCanvasElement, HtmlElement, HtmlImageElement, HtmlInputElement,
};

use crate::channel::{authenticated_url, Channel, ChannelHooks, ChannelStatus};
use crate::config::{
    MUD_API_BASE, MUD_CREATE_CHARACTER_PATH, MUD_ENTRY_PATH, MUD_TOKEN_KEY, MUD_WS_BASE,
};
use crate::dom::{by_id, document, escape_html, title_case_id};
use crate::mud::minimap;
use crate::mud::protocol::{ProtocolError, ServerMsg};
use crate::mud::state::{room_image_url, ChatLine, MudEvent, MudState, Player};
use crate::session::{self, BootstrapError};

struct MudEls {
    game_log: HtmlElement,
    cmd_input: HtmlInputElement,
    command_form: HtmlElement,
    connection_status: HtmlElement,
    char_name: HtmlElement,
    char_race: HtmlElement,
    stat_level: HtmlElement,
    stat_exp: HtmlElement,
    stat_next: HtmlElement,
    exp_bar: HtmlElement,
    stat_hp_cur: HtmlElement,
    stat_hp_max: HtmlElement,
    hp_bar: HtmlElement,
    stat_str: HtmlElement,
    stat_dex: HtmlElement,
    stat_int: HtmlElement,
    stat_vit: HtmlElement,
    hud_pl: HtmlElement,
    room_name: HtmlElement,
    room_desc: HtmlElement,
    entity_list: HtmlElement,
    inventory_list: HtmlElement,
    room_image: HtmlImageElement,
    mini_map: HtmlCanvasElement,
    logout_btn: HtmlElement,
}

impl MudEls {
    fn lookup(document: &Document) -> Result<MudEls, JsValue> {
        Ok(MudEls {
            game_log: by_id(document, "gameLog")?,
            cmd_input: by_id(document, "cmdInput")?,
            command_form: by_id(document, "commandForm")?,
            connection_status: by_id(document, "connectionStatus")?,
            char_name: by_id(document, "charName")?,
            char_race: by_id(document, "charRace")?,
            stat_level: by_id(document, "statLevel")?,
            stat_exp: by_id(document, "statExp")?,
            stat_next: by_id(document, "statNext")?,
            exp_bar: by_id(document, "expBar")?,
            stat_hp_cur: by_id(document, "statHpCur")?,
            stat_hp_max: by_id(document, "statHpMax")?,
            hp_bar: by_id(document, "hpBar")?,
            stat_str: by_id(document, "statStr")?,
            stat_dex: by_id(document, "statDex")?,
            stat_int: by_id(document, "statInt")?,
            stat_vit: by_id(document, "statVit")?,
            hud_pl: by_id(document, "hudPL")?,
            room_name: by_id(document, "roomName")?,
            room_desc: by_id(document, "roomDesc")?,
            entity_list: by_id(document, "entityList")?,
            inventory_list: by_id(document, "inventoryList")?,
            room_image: by_id(document, "roomImage")?,
            mini_map: by_id(document, "miniMap")?,
            logout_btn: by_id(document, "logoutBtn")?,
        })
    }
}

struct App {
    els: MudEls,
    state: RefCell<MudState>,
    channel: RefCell<Option<Channel>>,
}

pub fn run() -> Result<(), JsValue> {
    let token = match session::stored_token(MUD_TOKEN_KEY) {
        Some(token) => token,
        None => {
            session::redirect(MUD_ENTRY_PATH);
            return Ok(());
        }
    };

    spawn_local(async move {
        if let Err(err) = bootstrap(token).await {
            console::error!("mud bootstrap failed", err);
        }
    });
    Ok(())
}

async fn bootstrap(token: String) -> Result<(), JsValue> {
    let url = format!("{MUD_API_BASE}/players/me");
    let player: Player = match session::fetch_profile(&url, &token).await {
        Ok(player) => player,
        Err(BootstrapError::NotFound) => {
            session::redirect(MUD_CREATE_CHARACTER_PATH);
            return Ok(());
        }
        Err(_) => {
            session::clear_token(MUD_TOKEN_KEY);
            session::redirect(MUD_ENTRY_PATH);
            return Ok(());
        }
    };

    let document = document()?;
    let app = Rc::new(App {
        els: MudEls::lookup(&document)?,
        state: RefCell::new(MudState::default()),
        channel: RefCell::new(None),
    });

    {
        let mut state = app.state.borrow_mut();
        state.player = Some(player.clone());
    }
    app.render_player();
    app.set_status("Connecting...");

    open_channel(&app, &token, player.id)?;
    wire_ui(&app)?;
    Ok(())
}

fn open_channel(app: &Rc<App>, token: &str, player_id: i64) -> Result<(), JsValue> {
    let url = authenticated_url(&format!("{MUD_WS_BASE}/{player_id}"), Some(token), &[])
        .map_err(|err| JsValue::from_str(&err.to_string()))?;

    let hooks = ChannelHooks {
        on_open: {
            let app = app.clone();
            Rc::new(move || {
                let stamp = now_stamp();
                app.state
                    .borrow_mut()
                    .push_system("Neural Link Established.", &stamp);
                app.render_new_lines();
            })
        },
        on_frame: {
            let app = app.clone();
            Rc::new(move |raw: String| app.handle_frame(&raw))
        },
        on_status: {
            let app = app.clone();
            Rc::new(move |status: ChannelStatus| match status {
                ChannelStatus::Connecting => app.set_status("Connecting..."),
                ChannelStatus::Open => app.set_status("Connected"),
                ChannelStatus::Closed => {
                    app.set_status("Disconnected");
                    let stamp = now_stamp();
                    app.state
                        .borrow_mut()
                        .push_system("Connection Lost. Retrying...", &stamp);
                    app.render_new_lines();
                }
            })
        },
        on_auth_rejected: Rc::new(move || {
            session::clear_token(MUD_TOKEN_KEY);
            session::redirect(MUD_ENTRY_PATH);
        }),
    };

    // "look" doubles as the presence announcement: the server replies with
    // the full room gamestate for the freshly-joined player.
    let channel = Channel::open(url, "look".to_string(), hooks)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    *app.channel.borrow_mut() = Some(channel);
    Ok(())
}

fn wire_ui(app: &Rc<App>) -> Result<(), JsValue> {
    let on_submit = {
        let app = app.clone();
        Closure::wrap(Box::new(move |event: Event| {
            event.prevent_default();
            let text = app.els.cmd_input.value();
            let text = text.trim();
            if text.is_empty() {
                return;
            }
            app.send_command(text);
            app.els.cmd_input.set_value("");
        }) as Box<dyn FnMut(Event)>)
    };
    app.els
        .command_form
        .add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;
    on_submit.forget();

    let on_logout = {
        let app = app.clone();
        Closure::wrap(Box::new(move |_event: Event| {
            if let Some(channel) = app.channel.borrow_mut().take() {
                channel.close();
            }
            session::clear_token(MUD_TOKEN_KEY);
            session::redirect(MUD_ENTRY_PATH);
        }) as Box<dyn FnMut(Event)>)
    };
    app.els
        .logout_btn
        .add_event_listener_with_callback("click", on_logout.as_ref().unchecked_ref())?;
    on_logout.forget();

    Ok(())
}

impl App {
    /// Commands go out as raw text, never JSON.
    fn send_command(&self, text: &str) {
        let sent = self
            .channel
            .borrow()
            .as_ref()
            .map(|channel| channel.send(text).is_ok())
            .unwrap_or(false);
        if !sent {
            let stamp = now_stamp();
            self.state.borrow_mut().push_system("Not connected.", &stamp);
            self.render_new_lines();
        }
    }

    fn handle_frame(&self, raw: &str) {
        let stamp = now_stamp();
        match ServerMsg::parse(raw) {
            Ok(msg) => {
                let events = self.state.borrow_mut().apply(msg, &stamp);
                for event in events {
                    match event {
                        MudEvent::StatsChanged => self.render_player(),
                        MudEvent::RoomChanged => self.render_room(),
                        MudEvent::LineAppended => self.render_new_lines(),
                    }
                }
            }
            Err(ProtocolError::NotJson) => {
                self.state.borrow_mut().push_raw_fallback(raw, &stamp);
                self.render_new_lines();
            }
            Err(err) => console::warn!("dropped malformed frame", err.to_string()),
        }
    }

    fn set_status(&self, text: &str) {
        self.els.connection_status.set_text_content(Some(text));
    }

    fn render_player(&self) {
        let state = self.state.borrow();
        let player = match state.player.as_ref() {
            Some(player) => player,
            None => return,
        };
        self.els.char_name.set_text_content(Some(&player.name));
        self.els
            .char_race
            .set_text_content(Some(&title_case_id(&player.race)));
        self.els
            .stat_level
            .set_text_content(Some(&player.level.to_string()));
        self.els
            .stat_exp
            .set_text_content(Some(&player.exp.to_string()));
        self.els
            .stat_next
            .set_text_content(Some(&player.next_level_exp().to_string()));
        set_bar(&self.els.exp_bar, player.exp_percent());

        self.els
            .stat_hp_cur
            .set_text_content(Some(&player.stats.current_hp().to_string()));
        self.els
            .stat_hp_max
            .set_text_content(Some(&player.stats.max_hp().to_string()));
        set_bar(&self.els.hp_bar, player.hp_percent());

        self.els
            .stat_str
            .set_text_content(Some(&player.stats.strength.to_string()));
        self.els
            .stat_dex
            .set_text_content(Some(&player.stats.dex.to_string()));
        self.els
            .stat_int
            .set_text_content(Some(&player.stats.int.to_string()));
        self.els
            .stat_vit
            .set_text_content(Some(&player.stats.vit.to_string()));
        self.els
            .hud_pl
            .set_text_content(Some(&player.power_level().to_string()));

        let inventory = player
            .inventory
            .iter()
            .map(|slot| {
                format!(
                    "<li>{} <span class=\"qty\">x{}</span></li>",
                    escape_html(&title_case_id(&slot.item_id)),
                    slot.qty
                )
            })
            .collect::<String>();
        self.els.inventory_list.set_inner_html(&inventory);
    }

    fn render_room(&self) {
        let state = self.state.borrow();
        let room = match state.room.as_ref() {
            Some(room) => room,
            None => return,
        };
        self.els.room_name.set_text_content(Some(&room.name));
        self.els.room_desc.set_text_content(Some(&room.description));
        self.els.room_image.set_src(room_image_url(&room.id));

        let mobs = room
            .mobs
            .iter()
            .map(|mob| format!("<li class=\"mob\">{}</li>", escape_html(&title_case_id(mob))))
            .collect::<String>();
        self.els.entity_list.set_inner_html(&mobs);

        if let Err(err) = minimap::draw(&self.els.mini_map, room) {
            console::warn!("minimap draw failed", err);
        }
    }

    /// Appends every log line not yet in the DOM, then scrolls to the tail.
    fn render_new_lines(&self) {
        let state = self.state.borrow();
        let rendered = self.els.game_log.child_element_count() as usize;
        for line in state.log.iter().skip(rendered) {
            if let Err(err) = self.append_line(line) {
                console::warn!("failed to append log line", err);
            }
        }
        self.els
            .game_log
            .set_scroll_top(self.els.game_log.scroll_height());
    }

    fn append_line(&self, line: &ChatLine) -> Result<(), JsValue> {
        let document = document()?;
        let div = document.create_element("div")?;
        div.set_class_name(&format!("log-line {}", line.channel));
        div.set_inner_html(&format!(
            "<span class=\"ts\">[{}]</span> <span class=\"sender\">{}:</span> {}",
            escape_html(&line.timestamp),
            escape_html(&line.sender),
            escape_html(&line.text),
        ));
        self.els.game_log.append_child(&div)?;
        Ok(())
    }
}

fn set_bar(bar: &HtmlElement, percent: f64) {
    let _ = bar.style().set_property("width", &format!("{percent:.1}%"));
}

fn now_stamp() -> String {
    let now = js_sys::Date::new_0();
    format!("{:02}:{:02}", now.get_hours(), now.get_minutes())
}

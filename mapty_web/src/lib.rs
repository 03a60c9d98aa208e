use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::*;
use mapty::{
    Discipline, PopupSpec, Tracker, TrackerConfig, Workout, WorkoutCard, WorkoutForm, WorkoutStore,
};
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlSelectElement;

mod geolocation;
mod leaflet;
mod storage;

pub use leaflet::LeafletMap;
pub use storage::BrowserStorage;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_COMMIT: &str = env!("GIT_COMMIT_HASH");

const MAP_CONTAINER_ID: &str = "map";
const POSITION_ERROR: &str = "Could not get your position";

/// Markers may only be placed once the map exists, so stored workouts are
/// replayed from the `Ready` transition and nowhere else.
enum MapState {
    Locating,
    Ready(LeafletMap),
    Unavailable,
}

type SharedTracker = Rc<RefCell<Tracker<BrowserStorage>>>;
type SharedMap = Rc<RefCell<MapState>>;

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

fn log_js_error(context: &str, err: &JsValue) {
    web_sys::console::error_2(&JsValue::from_str(context), err);
}

fn render_markers(map: &LeafletMap, workouts: &[Workout], config: &TrackerConfig) {
    for workout in workouts {
        let popup = PopupSpec::for_workout(workout, config);
        if let Err(err) = map.add_marker(workout.coords, &popup) {
            log_js_error("failed to place marker", &err);
        }
    }
}

/// Row classes for (cadence, elevation); exactly one row is visible.
fn metric_row_classes(discipline: Discipline) -> (&'static str, &'static str) {
    const SHOWN: &str = "form__row";
    const HIDDEN: &str = "form__row form__row--hidden";
    match discipline {
        Discipline::Running => (SHOWN, HIDDEN),
        Discipline::Cycling => (HIDDEN, SHOWN),
    }
}

fn locate(tracker: &SharedTracker, map_state: &SharedMap, id: &str) {
    let Some(coords) = tracker.borrow_mut().locate(id) else {
        return;
    };
    if let MapState::Ready(map) = &*map_state.borrow() {
        if let Err(err) = map.pan_to(coords) {
            log_js_error("failed to move map", &err);
        }
    }
}

/// Clears the stored workouts and reloads the page.
#[wasm_bindgen]
pub fn reset() {
    let config = TrackerConfig::default();
    let mut store = WorkoutStore::new(BrowserStorage::local(), config.storage_key);
    if let Err(err) = store.clear() {
        web_sys::console::error_1(&err.to_string().into());
    }
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.location().reload() {
            log_js_error("failed to reload", &err);
        }
    }
}

#[component]
pub fn App() -> impl IntoView {
    let config = store_value(TrackerConfig::default());
    let tracker: SharedTracker = Rc::new(RefCell::new(
        config.with_value(|cfg| Tracker::new(BrowserStorage::local(), cfg)),
    ));
    let map_state: SharedMap = Rc::new(RefCell::new(MapState::Locating));

    let (workouts, set_workouts) = create_signal(Vec::<Workout>::new());
    let (form_hidden, set_form_hidden) = create_signal(true);
    let (form_displayed, set_form_displayed) = create_signal(true);
    let (discipline, set_discipline) = create_signal(Discipline::Running);
    let (distance, set_distance) = create_signal(String::new());
    let (duration, set_duration) = create_signal(String::new());
    let (cadence, set_cadence) = create_signal(String::new());
    let (elevation, set_elevation) = create_signal(String::new());
    let distance_input = create_node_ref::<html::Input>();

    // Geolocation -> map -> restore. Deferred a frame so the map container exists.
    {
        let tracker = tracker.clone();
        let map_state = map_state.clone();
        request_animation_frame(move || {
            let failed_state = map_state.clone();
            geolocation::request_position(
                move |center| {
                    let cfg = config.get_value();
                    let mut map = match LeafletMap::mount(MAP_CONTAINER_ID, center, &cfg) {
                        Ok(map) => map,
                        Err(err) => {
                            log_js_error("failed to create map", &err);
                            *map_state.borrow_mut() = MapState::Unavailable;
                            return;
                        }
                    };

                    let click_tracker = tracker.clone();
                    let bound = map.on_click(move |coords| {
                        click_tracker.borrow_mut().begin_entry(coords);
                        set_form_hidden.set(false);
                        if let Some(input) = distance_input.get_untracked() {
                            let _ = input.focus();
                        }
                    });
                    if let Err(err) = bound {
                        log_js_error("failed to bind map click", &err);
                    }

                    let restored = tracker.borrow_mut().restore().to_vec();
                    render_markers(&map, &restored, &cfg);
                    *map_state.borrow_mut() = MapState::Ready(map);
                    set_workouts.set(restored);
                },
                move |reason| {
                    web_sys::console::warn_1(&JsValue::from_str(&reason));
                    *failed_state.borrow_mut() = MapState::Unavailable;
                    alert(POSITION_ERROR);
                },
            );
        });
    }

    let hide_form = move || {
        set_distance.set(String::new());
        set_duration.set(String::new());
        set_cadence.set(String::new());
        set_elevation.set(String::new());
        set_form_displayed.set(false);
        set_form_hidden.set(true);
        let delay = config.with_value(|cfg| cfg.form_redisplay_ms);
        Timeout::new(delay, move || set_form_displayed.set(true)).forget();
    };

    let on_submit = {
        let tracker = tracker.clone();
        let map_state = map_state.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            let form = WorkoutForm {
                discipline: discipline.get_untracked(),
                distance: distance.get_untracked(),
                duration: duration.get_untracked(),
                cadence: cadence.get_untracked(),
                elevation: elevation.get_untracked(),
            };
            let committed = tracker.borrow_mut().submit(&form).map(Workout::clone);
            match committed {
                Ok(workout) => {
                    hide_form();
                    if let MapState::Ready(map) = &*map_state.borrow() {
                        config.with_value(|cfg| {
                            render_markers(map, std::slice::from_ref(&workout), cfg)
                        });
                    }
                    set_workouts.update(|list| list.push(workout));
                }
                Err(err) => alert(&err.to_string()),
            }
        }
    };

    let on_discipline = move |ev: ev::Event| {
        if let Some(t) = ev.target() {
            if let Ok(sel) = t.dyn_into::<HtmlSelectElement>() {
                match sel.value().parse::<Discipline>() {
                    Ok(d) => set_discipline.set(d),
                    Err(err) => web_sys::console::warn_1(&err.to_string().into()),
                }
            }
        }
    };

    // Each new item goes directly after the form, so the newest is listed first.
    let workout_items = {
        let tracker = tracker.clone();
        let map_state = map_state.clone();
        move || {
            workouts
                .get()
                .iter()
                .rev()
                .map(|workout| {
                    let card = WorkoutCard::from_workout(workout);
                    let id = card.id.clone();
                    let tracker = tracker.clone();
                    let map_state = map_state.clone();
                    let details = card
                        .details
                        .into_iter()
                        .map(|d| {
                            view! {
                                <div class="workout__details">
                                    <span class="workout__icon">{d.icon}</span>
                                    <span class="workout__value">{d.value}</span>
                                    <span class="workout__unit">{d.unit}</span>
                                </div>
                            }
                        })
                        .collect_view();
                    view! {
                        <li class=card.class data-id=card.id on:click=move |_| locate(&tracker, &map_state, &id)>
                            <h2 class="workout__title">{card.title}</h2>
                            {details}
                        </li>
                    }
                })
                .collect_view()
        }
    };

    view! {
        <div class="sidebar">
            <h1 class="logo">"mapty"</h1>
            <ul class="workouts">
                <form
                    class=move || if form_hidden.get() { "form hidden" } else { "form" }
                    style=move || if form_displayed.get() { "display: grid" } else { "display: none" }
                    on:submit=on_submit
                >
                    <div class="form__row">
                        <label class="form__label">"Type"</label>
                        <select class="form__input form__input--type" on:change=on_discipline
                            prop:value=move || discipline.get().as_str()>
                            <option value="running">"Running"</option>
                            <option value="cycling">"Cycling"</option>
                        </select>
                    </div>
                    <div class="form__row">
                        <label class="form__label">"Distance"</label>
                        <input class="form__input form__input--distance" placeholder="km"
                            node_ref=distance_input
                            prop:value=move || distance.get()
                            on:input=move |ev| set_distance.set(event_target_value(&ev)) />
                    </div>
                    <div class="form__row">
                        <label class="form__label">"Duration"</label>
                        <input class="form__input form__input--duration" placeholder="min"
                            prop:value=move || duration.get()
                            on:input=move |ev| set_duration.set(event_target_value(&ev)) />
                    </div>
                    <div class={move || metric_row_classes(discipline.get()).0}>
                        <label class="form__label">"Cadence"</label>
                        <input class="form__input form__input--cadence" placeholder="step/min"
                            prop:value=move || cadence.get()
                            on:input=move |ev| set_cadence.set(event_target_value(&ev)) />
                    </div>
                    <div class={move || metric_row_classes(discipline.get()).1}>
                        <label class="form__label">"Elev Gain"</label>
                        <input class="form__input form__input--elevation" placeholder="meters"
                            prop:value=move || elevation.get()
                            on:input=move |ev| set_elevation.set(event_target_value(&ev)) />
                    </div>
                    <button class="form__btn">"OK"</button>
                </form>
                {workout_items}
            </ul>
            <button class="btn btn--reset" on:click=move |_| reset()>"Reset workouts"</button>
            <p class="copyright">{"Mapty web "}{APP_VERSION}{" ("}{APP_COMMIT}{")"}</p>
        </div>
        <div id=MAP_CONTAINER_ID></div>
    }
}

/// Routes `tracing` events from the core crate to the browser console.
#[cfg(target_arch = "wasm32")]
fn init_logging() {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    // No clock on wasm32-unknown-unknown; the console stamps entries itself.
    let console = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(tracing_web::MakeWebConsoleWriter::new());
    if tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(console)
        .try_init()
        .is_err()
    {
        web_sys::console::warn_1(&"tracing subscriber already installed".into());
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    init_logging();
    tracing::info!(version = APP_VERSION, commit = APP_COMMIT, "mapty web starting");
    leptos::mount_to_body(|| view! { <App/> });
}

use super::*;
use pretty_assertions::assert_eq;
use std::sync::atomic::AtomicUsize;
use std::sync::Mutex;

fn key(code: KeyCode) -> Msg {
    Box::new(KeyMsg {
        key: code,
        modifiers: KeyModifiers::NONE,
    })
}

fn plain_styles() -> Styles {
    Styles {
        control: Style::new(),
        focused: Style::new(),
        indicator: Style::new(),
        error: Style::new(),
        hint: Style::new(),
    }
}

#[derive(Default)]
struct Calls {
    use_web: Arc<AtomicUsize>,
    suggest: Arc<AtomicUsize>,
    remove: Arc<AtomicUsize>,
    detached: Arc<AtomicUsize>,
    images: Arc<Mutex<Vec<Vec<String>>>>,
    randomness: Arc<Mutex<Vec<u8>>>,
    models: Arc<Mutex<Vec<String>>>,
}

fn bump(count: &Arc<AtomicUsize>) -> impl Fn() -> Option<Msg> + Send + Sync + 'static {
    let count = Arc::clone(count);
    move || {
        count.fetch_add(1, Ordering::SeqCst);
        None
    }
}

impl Calls {
    fn callbacks(&self) -> ToolbarCallbacks {
        let images = Arc::clone(&self.images);
        let randomness = Arc::clone(&self.randomness);
        let models = Arc::clone(&self.models);
        ToolbarCallbacks::default()
            .on_toggle_use_web(bump(&self.use_web))
            .on_suggest_question(bump(&self.suggest))
            .on_remove_chat(bump(&self.remove))
            .on_toggle_detached(bump(&self.detached))
            .on_set_images(move |urls| {
                images.lock().unwrap().push(urls);
                None
            })
            .on_set_randomness(move |value| {
                randomness.lock().unwrap().push(value);
                None
            })
            .on_set_user_model(move |model| {
                models.lock().unwrap().push(model.name.clone());
                None
            })
    }
}

fn editable(detached: bool) -> ToolbarFlags {
    ToolbarFlags {
        detached,
        can_edit: true,
        ..ToolbarFlags::default()
    }
}

fn toolbar(registry: &Registry, calls: &Calls) -> Model {
    let mut t = Model::new(registry, calls.callbacks()).with_selected_model(SelectedModel {
        name: "gpt".to_string(),
        accepts_images: true,
    });
    t.styles = plain_styles();
    t.set_flags(editable(false));
    t.set_models(
        ModelListState::Loaded,
        vec![
            UserModel {
                name: "gpt".to_string(),
                available: true,
                accepts_images: true,
            },
            UserModel {
                name: "o1".to_string(),
                available: false,
                accepts_images: false,
            },
        ],
    );
    t
}

#[test]
fn test_detached_flag_swaps_control_set() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);

    assert_eq!(
        t.visible_controls(),
        vec![
            Control::ModelSelector,
            Control::SuggestQuestion,
            Control::AttachImage,
            Control::Overflow,
            Control::Delete,
        ]
    );

    t.set_flags(editable(true));
    assert_eq!(
        t.visible_controls(),
        vec![
            Control::WebToggle,
            Control::ModelSelector,
            Control::Spacer,
            Control::AttachImage,
            Control::Delete,
        ]
    );

    // Delete and attach follow their own conditions in both branches.
    for detached in [true, false] {
        t.set_flags(ToolbarFlags {
            is_loading: true,
            ..editable(detached)
        });
        t.set_selected_model(Some(SelectedModel {
            name: "o1".to_string(),
            accepts_images: false,
        }));
        let controls = t.visible_controls();
        assert!(!controls.contains(&Control::Delete));
        assert!(!controls.contains(&Control::AttachImage));
        assert!(controls.contains(&Control::ModelSelector));
    }
}

#[test]
fn test_delete_needs_remove_callback() {
    let registry = Registry::new();
    let mut t = Model::new(&registry, ToolbarCallbacks::default());
    t.set_flags(editable(false));
    assert!(!t.visible_controls().contains(&Control::Delete));
    assert!(!t.visible_controls().contains(&Control::ModelSelector));
}

#[test]
fn test_disable_web_hides_web_controls() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls).with_config(ToolbarConfig { disable_web: true });
    assert_eq!(t.overflow().options.len(), 2);
    t.set_flags(editable(true));
    assert!(!t.visible_controls().contains(&Control::WebToggle));

    Component::focus(&mut t);
    let ctrl_i: Msg = Box::new(KeyMsg {
        key: KeyCode::Char('i'),
        modifiers: KeyModifiers::CONTROL,
    });
    t.update(&ctrl_i);
    assert_eq!(calls.use_web.load(Ordering::SeqCst), 0);
}

#[test]
fn test_env_flag() {
    assert!(!env_flag(None));
    assert!(!env_flag(Some("")));
    assert!(!env_flag(Some("0")));
    assert!(!env_flag(Some("False")));
    assert!(env_flag(Some("1")));
    assert!(env_flag(Some("true")));
}

#[test]
fn test_model_selector_states() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);
    assert!(t.view().starts_with("gpt ▾"));

    t.set_models(ModelListState::Failed, Vec::new());
    assert!(t.view().starts_with("Can't use chat"));

    t.set_models(ModelListState::Loading, Vec::new());
    assert!(!t.view().contains("gpt"));
}

#[test]
fn test_model_options_mirror_availability() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);

    let options = &t.model_dropdown().options;
    assert_eq!(options.len(), 2);
    assert!(!options[0].unavailable);
    assert!(options[1].unavailable);

    t.model_dropdown.open();
    assert!(t.model_dropdown.select(1).is_none());
    assert!(t.model_dropdown.is_open());
    t.model_dropdown.select(0);
    assert_eq!(*calls.models.lock().unwrap(), vec!["gpt"]);
}

#[test]
fn test_menus_open_upwards_when_asked() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);
    t.set_flags(ToolbarFlags {
        dropdown_goes_up: true,
        ..editable(false)
    });
    assert_eq!(t.model_dropdown().direction, Direction::Up);
    assert_eq!(t.overflow().direction, Direction::Up);
    assert!(t.overflow().right_align);
    assert!(!t.overflow().close_on_select);
}

#[test]
fn test_keyboard_activation() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);

    assert!(t.update(&key(KeyCode::Enter)).is_none());
    assert_eq!(t.focused_control(), None);

    Component::focus(&mut t);
    assert_eq!(t.focused_control(), Some(Control::ModelSelector));
    t.update(&key(KeyCode::Tab));
    assert_eq!(t.focused_control(), Some(Control::SuggestQuestion));
    t.update(&key(KeyCode::Enter));
    assert_eq!(calls.suggest.load(Ordering::SeqCst), 1);

    t.update(&key(KeyCode::BackTab));
    t.update(&key(KeyCode::BackTab));
    assert_eq!(t.focused_control(), Some(Control::Delete));
    t.update(&key(KeyCode::Enter));
    assert_eq!(calls.remove.load(Ordering::SeqCst), 1);

    // No suggestion while one is loading.
    t.set_flags(ToolbarFlags {
        suggest_loading: true,
        ..editable(false)
    });
    t.update(&key(KeyCode::Tab));
    t.update(&key(KeyCode::Tab));
    assert_eq!(t.focused_control(), Some(Control::SuggestQuestion));
    t.update(&key(KeyCode::Enter));
    assert_eq!(calls.suggest.load(Ordering::SeqCst), 1);
}

#[test]
fn test_overflow_menu_slider_and_toggles() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);
    t.set_flags(ToolbarFlags {
        temperature: Some(0.5),
        ..editable(false)
    });

    Component::focus(&mut t);
    for _ in 0..3 {
        t.update(&key(KeyCode::Tab));
    }
    assert_eq!(t.focused_control(), Some(Control::Overflow));
    t.update(&key(KeyCode::Enter));
    assert!(t.overflow().is_open());
    assert_eq!(registry.total_active(), 4);

    t.update(&key(KeyCode::Right));
    assert_eq!(*calls.randomness.lock().unwrap(), vec![55]);
    assert_eq!(t.slider().value(), 55);
    assert!(t.overflow().options[0].label.ends_with("55"));

    t.update(&key(KeyCode::Down));
    t.update(&key(KeyCode::Enter));
    assert_eq!(calls.use_web.load(Ordering::SeqCst), 1);
    assert!(t.overflow().is_open(), "menu stays open after a choice");

    t.update(&key(KeyCode::Down));
    t.update(&key(KeyCode::Enter));
    assert_eq!(calls.detached.load(Ordering::SeqCst), 1);

    t.update(&key(KeyCode::Esc));
    assert!(!t.overflow().is_open());
    assert_eq!(registry.total_active(), 0);
}

#[test]
fn test_indicators_render() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);
    assert_eq!(t.overflow().value, "Menu");
    assert!(!t.view().contains(DOT));

    t.set_flags(ToolbarFlags {
        use_web: true,
        has_images: true,
        ..editable(false)
    });
    assert_eq!(t.overflow().value, format!("Menu{}", DOT));
    assert!(t.view().contains(&format!("[img]{}", DOT)));
}

#[test]
fn test_detached_row_pushes_trailing_controls_right() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);
    t.width = 40;
    t.set_flags(ToolbarFlags {
        show_use_web_hint: true,
        ..editable(true)
    });
    let row = t.view();
    assert!(row.starts_with("Use Web [ ] ctrl+i  gpt ▾"));
    assert!(row.ends_with("[img]  ✕"));
    assert_eq!(geometry::display_width(&row), 40);
}

#[test]
fn test_blur_releases_menus() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);
    Component::focus(&mut t);
    t.activate(Control::ModelSelector);
    assert!(t.model_dropdown().is_open());
    assert!(registry.total_active() > 0);
    t.blur();
    assert!(!t.model_dropdown().is_open());
    assert_eq!(registry.total_active(), 0);
}

#[test]
fn test_attach_hidden_without_image_support() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);
    t.set_selected_model(Some(SelectedModel {
        name: "o1".to_string(),
        accepts_images: false,
    }));
    assert!(t.attach_image().is_none());
    assert!(!t.is_picking());
}

#[tokio::test]
async fn test_attach_image_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cat.png"), b"abc").unwrap();

    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls).with_picker_directory(dir.path());

    let read_dir = t.attach_image().expect("picker opens");
    assert!(t.is_picking());
    let listing = read_dir.await.unwrap();
    t.update(&listing);
    assert_eq!(t.picker().files().len(), 1);

    let chosen = t.update(&key(KeyCode::Enter)).expect("image chosen");
    let chosen = chosen.await.unwrap();
    let read = t.update(&chosen).expect("read starts");
    assert!(!t.is_picking());
    assert!(t.attach_in_flight());

    let attached = read.await.unwrap();
    assert!(t.update(&attached).is_none());
    assert!(!t.attach_in_flight());
    assert!(t.picker().selected_path().is_none());
    assert_eq!(
        *calls.images.lock().unwrap(),
        vec![vec!["data:image/png;base64,YWJj".to_string()]]
    );
}

#[tokio::test]
async fn test_single_read_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);

    let selected: Msg = Box::new(FileSelectedMsg {
        id: t.picker().id(),
        path: dir.path().join("gone.png"),
    });
    let read = t.update(&selected).expect("first read starts");
    assert!(t.update(&selected).is_none());

    // A failed read is logged and leaves the item's images alone.
    let failed = read.await.unwrap();
    assert!(failed.downcast_ref::<ImageAttachFailedMsg>().is_some());
    assert!(t.update(&failed).is_none());
    assert!(!t.attach_in_flight());
    assert!(calls.images.lock().unwrap().is_empty());
}

#[test]
fn test_esc_closes_picker() {
    let registry = Registry::new();
    let calls = Calls::default();
    let mut t = toolbar(&registry, &calls);
    let _ = t.attach_image();
    assert!(t.is_picking());
    t.update(&key(KeyCode::Esc));
    assert!(!t.is_picking());
}

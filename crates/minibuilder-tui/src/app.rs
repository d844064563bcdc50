use minibuilder_core::{
    CodeChallenge, Config, Effect, Event, ExtractClient, ExtractError, ExtractRequest, FieldKey,
    Session, Verifier,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::{debug, info};

/// Lines one input field occupies in the form: label, value, spacer
pub const FIELD_LINES: u16 = 3;

/// Terminal coordinates are u16; anything larger pins to the edge
pub fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// First line (the label) of the field at `index` in the form
pub fn field_row(index: usize) -> u16 {
    to_u16(index).saturating_mul(FIELD_LINES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Description,
    Roles,
    Features,
    Form,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Description => FocusPane::Roles,
            FocusPane::Roles => FocusPane::Features,
            FocusPane::Features => FocusPane::Form,
            FocusPane::Form => FocusPane::Description,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusPane::Description => FocusPane::Form,
            FocusPane::Roles => FocusPane::Description,
            FocusPane::Features => FocusPane::Roles,
            FocusPane::Form => FocusPane::Features,
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text buffer with a character cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub session: Session,

    // Description editor
    pub description: TextInput,

    // Verification challenge popup
    pub challenge: CodeChallenge,
    pub show_challenge: bool,
    pub challenge_input: TextInput,
    pub challenge_feedback: Option<String>,

    // Mock form state
    pub features_state: ListState,
    pub field_cursor: usize,
    pub editing_field: Option<FieldKey>,
    pub field_input: TextInput,

    // Scrolling
    pub results_scroll: u16,
    pub results_height: u16,
    pub results_content_lines: u16,
    pub back_to_top_threshold: u16,
    pub modal_scroll: u16,
    pub modal_content_lines: u16,
    pub scroll_locked: bool,

    // Animation state
    pub animation_frame: u8,

    // Extraction
    pub client: ExtractClient,
    pub extract_task: Option<tokio::task::JoinHandle<Event>>,

    // Areas for mouse hit-testing (updated during render)
    pub description_area: Option<Rect>,
    pub results_area: Option<Rect>,
    pub features_area: Option<Rect>,
    pub modal_area: Option<Rect>,
    pub top_button_area: Option<Rect>,
    pub blueprint_hint_area: Option<Rect>,
    pub role_tab_areas: Vec<(Rect, usize)>,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = ExtractClient::new(&config.endpoint, config.timeout())?;
        info!(endpoint = client.endpoint(), timeout_secs = config.timeout_secs, "app starting");

        Ok(Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Description,
            session: Session::new(),

            description: TextInput::default(),

            challenge: CodeChallenge::new(config.verification_ttl()),
            show_challenge: false,
            challenge_input: TextInput::default(),
            challenge_feedback: None,

            features_state: ListState::default(),
            field_cursor: 0,
            editing_field: None,
            field_input: TextInput::default(),

            results_scroll: 0,
            results_height: 0,
            results_content_lines: 0,
            back_to_top_threshold: config.back_to_top_threshold,
            modal_scroll: 0,
            modal_content_lines: 0,
            scroll_locked: false,

            animation_frame: 0,

            client,
            extract_task: None,

            description_area: None,
            results_area: None,
            features_area: None,
            modal_area: None,
            top_button_area: None,
            blueprint_hint_area: None,
            role_tab_areas: Vec::new(),
        })
    }

    /// Feed an event through the session and carry out its effects
    pub fn dispatch(&mut self, event: Event) {
        let effects = self.session.update(event);
        self.apply_effects(effects);
    }

    pub fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            debug!(?effect, "applying effect");
            match effect {
                Effect::Extract(request) => self.spawn_extract(request),
                Effect::ResetVerification => {
                    self.challenge.invalidate();
                    self.challenge_input.clear();
                    self.challenge_feedback = None;
                }
                Effect::ResultsReady => {
                    self.focus = FocusPane::Roles;
                    self.input_mode = InputMode::Normal;
                    self.results_scroll = 0;
                    self.reset_form_cursor();
                }
                Effect::ModalOpened => {
                    self.scroll_locked = true;
                    self.modal_scroll = 0;
                }
                Effect::ModalClosed => {
                    self.scroll_locked = false;
                }
            }
        }
    }

    fn spawn_extract(&mut self, request: ExtractRequest) {
        let client = self.client.clone();
        self.extract_task = Some(tokio::spawn(async move { client.run(request).await }));
    }

    /// Hand a finished extraction back to the session
    pub async fn poll_extract(&mut self) {
        if !self.extract_task.as_ref().is_some_and(|task| task.is_finished()) {
            return;
        }
        let Some(task) = self.extract_task.take() else {
            return;
        };
        let event = match task.await {
            Ok(event) => event,
            Err(e) => Event::Completed {
                seq: self.session.seq(),
                result: Err(ExtractError::Transport(format!("extraction task failed: {}", e))),
            },
        };
        self.dispatch(event);
    }

    pub async fn on_tick(&mut self) {
        self.poll_extract().await;
        self.tick_animation();
        self.check_verification_expiry();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn check_verification_expiry(&mut self) {
        if self.session.has_verification() && !self.session.is_pending() && self.challenge.obtain().is_none() {
            info!("verification token expired");
            self.dispatch(Event::VerificationExpired);
        }
    }

    // Submission
    pub fn submit(&mut self) {
        if self.session.is_pending() {
            return;
        }
        // Always read the latest token from the widget
        match self.challenge.obtain() {
            Some(token) => self.dispatch(Event::Verified(token)),
            None => self.dispatch(Event::VerificationExpired),
        }
        let description = self.description.as_str().to_string();
        self.dispatch(Event::Submit { description });
        if self.session.is_pending() {
            self.input_mode = InputMode::Normal;
            self.editing_field = None;
        }
    }

    // Verification challenge
    pub fn open_challenge(&mut self) {
        self.show_challenge = true;
        self.challenge_input.clear();
        self.challenge_feedback = None;
    }

    pub fn close_challenge(&mut self) {
        self.show_challenge = false;
        self.challenge_input.clear();
    }

    pub fn answer_challenge(&mut self) {
        let answer = self.challenge_input.as_str().to_string();
        self.challenge_input.clear();
        if self.challenge.answer(&answer) {
            if let Some(token) = self.challenge.obtain() {
                self.dispatch(Event::Verified(token));
            }
            self.challenge_feedback = None;
            self.show_challenge = false;
        } else {
            self.challenge_feedback = Some("Incorrect code. Try the new one.".to_string());
        }
    }

    // Role / feature navigation
    pub fn role_count(&self) -> usize {
        self.session.blueprint().map(|bp| bp.roles.len()).unwrap_or(0)
    }

    pub fn feature_count(&self) -> usize {
        self.session.current_role().map(|r| r.features.len()).unwrap_or(0)
    }

    pub fn select_role(&mut self, index: usize) {
        if index < self.role_count() {
            self.dispatch(Event::SelectRole(index));
            self.reset_form_cursor();
        }
    }

    pub fn next_role(&mut self) {
        let len = self.role_count();
        if len > 0 {
            let i = self.session.selection().role_index();
            self.select_role((i + 1).min(len - 1));
        }
    }

    pub fn prev_role(&mut self) {
        let i = self.session.selection().role_index();
        self.select_role(i.saturating_sub(1));
    }

    pub fn select_feature(&mut self, index: usize) {
        if index < self.feature_count() {
            self.dispatch(Event::SelectFeature(index));
            self.reset_form_cursor();
        }
    }

    pub fn next_feature(&mut self) {
        let len = self.feature_count();
        if len > 0 {
            let i = self.session.selection().feature_index().min(len - 1);
            self.select_feature((i + 1).min(len - 1));
        }
    }

    pub fn prev_feature(&mut self) {
        let len = self.feature_count();
        if len > 0 {
            let i = self.session.selection().feature_index().min(len - 1);
            self.select_feature(i.saturating_sub(1));
        }
    }

    fn reset_form_cursor(&mut self) {
        self.field_cursor = 0;
        self.editing_field = None;
        self.results_scroll = 0;
    }

    // Form fields
    pub fn field_down(&mut self) {
        let len = self.session.current_field_keys().len();
        if len > 0 {
            self.field_cursor = (self.field_cursor + 1).min(len - 1);
            self.scroll_to_field();
        }
    }

    pub fn field_up(&mut self) {
        self.field_cursor = self.field_cursor.saturating_sub(1);
        self.scroll_to_field();
    }

    pub fn begin_field_edit(&mut self) {
        let keys = self.session.current_field_keys();
        if let Some(key) = keys.get(self.field_cursor) {
            self.field_input = TextInput::with_text(self.session.field_value(key));
            self.editing_field = Some(key.clone());
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn end_field_edit(&mut self) {
        self.editing_field = None;
        self.input_mode = InputMode::Normal;
    }

    /// Push the edit buffer into the field store
    pub fn sync_field(&mut self) {
        if let Some(key) = self.editing_field.clone() {
            let value = self.field_input.as_str().to_string();
            self.dispatch(Event::SetField { key, value });
        }
    }

    fn scroll_to_field(&mut self) {
        let start = field_row(self.field_cursor);
        let end = start.saturating_add(FIELD_LINES - 1);
        if start < self.results_scroll {
            self.results_scroll = start;
        } else if self.results_height > 0 && end > self.results_scroll.saturating_add(self.results_height) {
            self.results_scroll = end.saturating_sub(self.results_height);
        }
    }

    // Scrolling
    pub fn scroll_down(&mut self, lines: u16) {
        if self.scroll_locked {
            let max = self.modal_content_lines.saturating_sub(1);
            self.modal_scroll = self.modal_scroll.saturating_add(lines).min(max);
        } else {
            let max = self.results_content_lines.saturating_sub(self.results_height);
            self.results_scroll = self.results_scroll.saturating_add(lines).min(max);
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if self.scroll_locked {
            self.modal_scroll = self.modal_scroll.saturating_sub(lines);
        } else {
            self.results_scroll = self.results_scroll.saturating_sub(lines);
        }
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.results_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.results_height / 2).max(1));
    }

    pub fn show_back_to_top(&self) -> bool {
        self.results_scroll > 0 && self.results_scroll >= self.back_to_top_threshold
    }

    pub fn back_to_top(&mut self) {
        self.results_scroll = 0;
        self.field_cursor = 0;
    }

    // Blueprint modal
    pub fn open_blueprint(&mut self) {
        self.dispatch(Event::OpenBlueprint);
    }

    pub fn close_blueprint(&mut self) {
        self.dispatch(Event::CloseBlueprint);
    }

    pub fn blueprint_json(&self) -> Option<String> {
        self.session.blueprint().and_then(|bp| bp.to_pretty_json().ok())
    }
}

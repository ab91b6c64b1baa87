use experience_common::Color;

/// Location hash that switches the debug panel on.
pub const DEBUG_HASH: &str = "#debug";
pub const PANEL_TITLE: &str = "Debug Panel";
pub const PANEL_WIDTH: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderId(u32);

/// Current value of a control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Number(f32),
    Color(Color),
    Bool(bool),
    /// A button press. Buttons hold no state.
    Trigger,
}

impl ControlValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ControlKind {
    Slider { min: f32, max: f32, step: f32 },
    Color,
    Toggle,
    Button,
}

#[derive(Debug, Clone)]
struct Control {
    id: ControlId,
    folder: Option<FolderId>,
    label: String,
    kind: ControlKind,
    value: ControlValue,
}

#[derive(Debug, Clone)]
struct Folder {
    id: FolderId,
    title: String,
    open: bool,
}

/// A user edit waiting to be applied by whoever owns the tweaked value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlChange {
    pub id: ControlId,
    pub value: ControlValue,
}

/// Tweakable-parameter panel, present only in debug mode.
///
/// An inactive panel accepts every call and does nothing: `add_*` return
/// `None`, so callers can register controls unconditionally.
#[derive(Debug)]
pub struct DebugPanel {
    active: bool,
    title: String,
    width: f32,
    folders: Vec<Folder>,
    controls: Vec<Control>,
    changes: Vec<ControlChange>,
    next_id: u32,
    destroyed: bool,
}

impl DebugPanel {
    /// Active iff `hash` is exactly `#debug`.
    pub fn from_hash(hash: &str) -> Self {
        let panel = Self::new(hash == DEBUG_HASH);
        if panel.active {
            tracing::info!("debug panel enabled");
        }
        panel
    }

    pub fn new(active: bool) -> Self {
        Self {
            active,
            title: PANEL_TITLE.to_string(),
            width: PANEL_WIDTH,
            folders: Vec::new(),
            controls: Vec::new(),
            changes: Vec::new(),
            next_id: 0,
            destroyed: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active && !self.destroyed
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Add a folder, closed until the user opens it.
    pub fn add_folder(&mut self, title: impl Into<String>) -> Option<FolderId> {
        if !self.is_active() {
            return None;
        }
        let id = FolderId(self.bump());
        self.folders.push(Folder {
            id,
            title: title.into(),
            open: false,
        });
        Some(id)
    }

    pub fn add_slider(
        &mut self,
        folder: Option<FolderId>,
        label: impl Into<String>,
        value: f32,
        min: f32,
        max: f32,
        step: f32,
    ) -> Option<ControlId> {
        self.push(
            folder,
            label.into(),
            ControlKind::Slider { min, max, step },
            ControlValue::Number(value.clamp(min, max)),
        )
    }

    pub fn add_color(
        &mut self,
        folder: Option<FolderId>,
        label: impl Into<String>,
        value: Color,
    ) -> Option<ControlId> {
        self.push(folder, label.into(), ControlKind::Color, ControlValue::Color(value))
    }

    pub fn add_toggle(
        &mut self,
        folder: Option<FolderId>,
        label: impl Into<String>,
        value: bool,
    ) -> Option<ControlId> {
        self.push(folder, label.into(), ControlKind::Toggle, ControlValue::Bool(value))
    }

    pub fn add_button(
        &mut self,
        folder: Option<FolderId>,
        label: impl Into<String>,
    ) -> Option<ControlId> {
        self.push(folder, label.into(), ControlKind::Button, ControlValue::Trigger)
    }

    pub fn value(&self, id: ControlId) -> Option<ControlValue> {
        self.control(id).map(|c| c.value)
    }

    /// Edit a control as the user would. Slider values are clamped to their
    /// range. Returns false for unknown ids or a value of the wrong type.
    pub fn set_value(&mut self, id: ControlId, value: ControlValue) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(control) = self.controls.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        let value = match (control.kind, value) {
            (ControlKind::Slider { min, max, .. }, ControlValue::Number(v)) => {
                ControlValue::Number(v.clamp(min, max))
            }
            (ControlKind::Color, v @ ControlValue::Color(_)) => v,
            (ControlKind::Toggle, v @ ControlValue::Bool(_)) => v,
            (ControlKind::Button, ControlValue::Trigger) => ControlValue::Trigger,
            _ => return false,
        };
        control.value = value;
        self.changes.push(ControlChange { id, value });
        true
    }

    /// Press a button control.
    pub fn press(&mut self, id: ControlId) -> bool {
        self.set_value(id, ControlValue::Trigger)
    }

    /// Edits made since the last call, in the order they happened.
    pub fn take_changes(&mut self) -> Vec<ControlChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn set_folder_open(&mut self, id: FolderId, open: bool) {
        if let Some(f) = self.folders.iter_mut().find(|f| f.id == id) {
            f.open = open;
        }
    }

    pub fn is_folder_open(&self, id: FolderId) -> Option<bool> {
        self.folders.iter().find(|f| f.id == id).map(|f| f.open)
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Id of the first control with this label.
    pub fn find_control(&self, label: &str) -> Option<ControlId> {
        self.controls.iter().find(|c| c.label == label).map(|c| c.id)
    }

    /// Draw the panel. Edits are recorded for `take_changes`.
    pub fn ui(&mut self, ctx: &egui::Context) {
        if !self.is_active() {
            return;
        }
        let Self {
            title,
            width,
            folders,
            controls,
            changes,
            ..
        } = self;
        egui::SidePanel::right("debug_panel")
            .resizable(false)
            .exact_width(*width)
            .show(ctx, |ui| {
                ui.heading(title.as_str());
                ui.separator();
                for control in controls.iter_mut().filter(|c| c.folder.is_none()) {
                    draw_control(ui, control, changes);
                }
                for folder in folders.iter_mut() {
                    let response = egui::CollapsingHeader::new(folder.title.as_str())
                        .id_salt(("debug_folder", folder.id.0))
                        .default_open(folder.open)
                        .show(ui, |ui| {
                            for control in
                                controls.iter_mut().filter(|c| c.folder == Some(folder.id))
                            {
                                draw_control(ui, control, changes);
                            }
                        });
                    folder.open = response.body_returned.is_some();
                }
            });
    }

    /// Remove the panel and all its controls.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.controls.clear();
        self.folders.clear();
        self.changes.clear();
        if self.active {
            tracing::debug!("debug panel destroyed");
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.iter().find(|c| c.id == id)
    }

    fn push(
        &mut self,
        folder: Option<FolderId>,
        label: String,
        kind: ControlKind,
        value: ControlValue,
    ) -> Option<ControlId> {
        if !self.is_active() {
            return None;
        }
        let id = ControlId(self.bump());
        self.controls.push(Control {
            id,
            folder,
            label,
            kind,
            value,
        });
        Some(id)
    }

    fn bump(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn draw_control(ui: &mut egui::Ui, control: &mut Control, changes: &mut Vec<ControlChange>) {
    let changed = match (control.kind, &mut control.value) {
        (ControlKind::Slider { min, max, step }, ControlValue::Number(v)) => ui
            .add(
                egui::Slider::new(v, min..=max)
                    .step_by(step as f64)
                    .text(control.label.as_str()),
            )
            .changed(),
        (ControlKind::Color, ControlValue::Color(c)) => {
            let mut rgb = c.to_array();
            let changed = ui
                .horizontal(|ui| {
                    let r = ui.color_edit_button_rgb(&mut rgb).changed();
                    ui.label(control.label.as_str());
                    r
                })
                .inner;
            if changed {
                *c = Color::from(rgb);
            }
            changed
        }
        (ControlKind::Toggle, ControlValue::Bool(b)) => {
            ui.checkbox(b, control.label.as_str()).changed()
        }
        (ControlKind::Button, _) => ui.button(control.label.as_str()).clicked(),
        _ => false,
    };
    if changed {
        changes.push(ControlChange {
            id: control.id,
            value: control.value,
        });
    }
}

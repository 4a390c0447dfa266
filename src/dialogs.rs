//! Modal dialogs for codebook and segment edits. Each dialog owns its state
//! behind a small state enum, is opened with the data it needs, and hands
//! the result back from `draw` exactly once when the user confirms.

use eframe::egui::{self, Button, Modal, Ui, Widget};

use crate::colors;
use crate::types::Msecs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePurpose {
    AddCode,
    AddCategory,
    RenameCode(i64),
    RenameCategory(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameSubmit {
    pub purpose: NamePurpose,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NameInputState {
    Closed,
    Opened,
    DuplicateError,
}

/// Asks for a code or category name. Names already in use are rejected
/// before the caller ever sees them.
pub struct NameInputDialog {
    state: NameInputState,
    purpose: NamePurpose,
    name: String,
    existing_names: Vec<String>,
}

impl NameInputDialog {
    pub fn new() -> Self {
        NameInputDialog {
            state: NameInputState::Closed,
            purpose: NamePurpose::AddCode,
            name: String::new(),
            existing_names: Vec::new(),
        }
    }

    pub fn open(&mut self, purpose: NamePurpose, initial_name: &str, existing_names: Vec<String>) {
        self.purpose = purpose;
        self.name = initial_name.to_string();
        self.existing_names = existing_names;
        self.state = NameInputState::Opened;
    }

    pub fn draw(&mut self, ctx: &egui::Context, max_width: f32) -> Option<NameSubmit> {
        if self.state == NameInputState::Closed {
            return None;
        }

        let mut result = None;
        Modal::new("name input".into()).show(ctx, |ui| {
            ui.set_max_width(max_width);
            match self.state {
                NameInputState::Closed => unreachable!(),
                NameInputState::Opened => result = self.draw_opened(ui, max_width),
                NameInputState::DuplicateError => self.draw_duplicate_error(ui, max_width),
            }
        });

        result
    }

    fn draw_opened(&mut self, ui: &mut Ui, max_width: f32) -> Option<NameSubmit> {
        let title = match self.purpose {
            NamePurpose::AddCode => "Add code",
            NamePurpose::AddCategory => "Add category",
            NamePurpose::RenameCode(_) => "Rename code",
            NamePurpose::RenameCategory(_) => "Rename category",
        };
        ui.label(title);
        draw_short_separator(ui, max_width);

        ui.horizontal(|ui| {
            ui.label("Name:");
            ui.text_edit_singleline(&mut self.name);
        });

        draw_short_separator(ui, max_width);
        let mut result = None;
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                let name = self.name.trim().to_string();
                if name.is_empty() {
                    return;
                }
                if self.existing_names.iter().any(|n| *n == name) {
                    self.state = NameInputState::DuplicateError;
                    return;
                }
                self.state = NameInputState::Closed;
                result = Some(NameSubmit {
                    purpose: self.purpose,
                    name,
                });
            }
            if ui.button("Cancel").clicked() {
                self.state = NameInputState::Closed;
            }
        });
        result
    }

    fn draw_duplicate_error(&mut self, ui: &mut Ui, max_width: f32) {
        let kind = match self.purpose {
            NamePurpose::AddCode | NamePurpose::RenameCode(_) => "code",
            NamePurpose::AddCategory | NamePurpose::RenameCategory(_) => "category",
        };
        ui.label(format!("A {kind} with this name already exists"));
        draw_short_separator(ui, max_width);
        if ui.button("Ok").clicked() {
            self.state = NameInputState::Opened;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoTarget {
    Code(i64),
    Category(i64),
    Segment(i64),
    Annotation {
        file_id: i64,
        start: usize,
        end: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoSubmit {
    pub target: MemoTarget,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MemoState {
    Closed,
    Opened,
}

/// Free-text memo editor for codes, categories, segments and annotations.
pub struct MemoDialog {
    state: MemoState,
    target: MemoTarget,
    subject: String,
    text: String,
}

impl MemoDialog {
    pub fn new() -> Self {
        MemoDialog {
            state: MemoState::Closed,
            target: MemoTarget::Code(0),
            subject: String::new(),
            text: String::new(),
        }
    }

    /// `subject` is shown in the title, e.g. the code's name.
    pub fn open(&mut self, target: MemoTarget, subject: &str, text: &str) {
        self.target = target;
        self.subject = subject.to_string();
        self.text = text.to_string();
        self.state = MemoState::Opened;
    }

    pub fn draw(
        &mut self,
        ctx: &egui::Context,
        max_width: f32,
        max_height: f32,
    ) -> Option<MemoSubmit> {
        if self.state == MemoState::Closed {
            return None;
        }

        let mut result = None;
        Modal::new("memo edit".into()).show(ctx, |ui| {
            ui.set_max_width(max_width);
            ui.set_max_height(max_height);
            let title = match self.target {
                MemoTarget::Code(_) => "Code memo",
                MemoTarget::Category(_) => "Category memo",
                MemoTarget::Segment(_) => "Segment memo",
                MemoTarget::Annotation { .. } => "Annotation",
            };
            ui.label(format!("{}: {}", title, self.subject));
            draw_short_separator(ui, max_width);

            ui.text_edit_multiline(&mut self.text);

            draw_short_separator(ui, max_width);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    self.state = MemoState::Closed;
                    result = Some(MemoSubmit {
                        target: self.target,
                        text: std::mem::take(&mut self.text),
                    });
                }
                if ui.button("Cancel").clicked() {
                    self.state = MemoState::Closed;
                }
            });
        });

        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteCode(i64),
    DeleteCategory(i64),
    DeleteSegment(i64),
    MergeCodes { code_id: i64, onto_code_id: i64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConfirmState {
    Closed,
    Opened,
}

/// Yes/no question guarding destructive codebook operations.
pub struct ConfirmDialog {
    state: ConfirmState,
    question: String,
    action: Option<ConfirmAction>,
}

impl ConfirmDialog {
    pub fn new() -> Self {
        ConfirmDialog {
            state: ConfirmState::Closed,
            question: String::new(),
            action: None,
        }
    }

    pub fn open(&mut self, question: String, action: ConfirmAction) {
        self.question = question;
        self.action = Some(action);
        self.state = ConfirmState::Opened;
    }

    pub fn draw(&mut self, ctx: &egui::Context, max_width: f32) -> Option<ConfirmAction> {
        if self.state == ConfirmState::Closed {
            return None;
        }

        let mut result = None;
        Modal::new("confirm action".into()).show(ctx, |ui| {
            ui.set_max_width(max_width);
            ui.label(&self.question);
            draw_short_separator(ui, max_width);
            if ui.button("Yes").clicked() {
                self.state = ConfirmState::Closed;
                result = self.action.take();
            }
            if ui.button("No, Cancel").clicked() {
                self.state = ConfirmState::Closed;
                self.action = None;
            }
        });

        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEditTarget {
    SegmentStart(i64),
    SegmentEnd(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSubmit {
    pub target: TimeEditTarget,
    pub msecs: Msecs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimeInputState {
    Closed,
    Opened,
    RangeError,
}

/// Millisecond input for moving a segment boundary, bounded so a segment
/// can never be turned inside out.
pub struct TimeInputDialog {
    state: TimeInputState,
    target: TimeEditTarget,
    input: String,
    min: Msecs,
    max: Msecs,
}

impl TimeInputDialog {
    pub fn new() -> Self {
        TimeInputDialog {
            state: TimeInputState::Closed,
            target: TimeEditTarget::SegmentStart(0),
            input: String::new(),
            min: 0,
            max: 0,
        }
    }

    pub fn open(&mut self, target: TimeEditTarget, current: Msecs, min: Msecs, max: Msecs) {
        self.target = target;
        self.input = current.to_string();
        self.min = min;
        self.max = max;
        self.state = TimeInputState::Opened;
    }

    pub fn draw(&mut self, ctx: &egui::Context, max_width: f32) -> Option<TimeSubmit> {
        if self.state == TimeInputState::Closed {
            return None;
        }

        let mut result = None;
        Modal::new("time edit".into()).show(ctx, |ui| {
            ui.set_max_width(max_width);
            match self.state {
                TimeInputState::Closed => unreachable!(),
                TimeInputState::Opened => result = self.draw_opened(ui, max_width),
                TimeInputState::RangeError => self.draw_range_error(ui, max_width),
            }
        });

        result
    }

    fn draw_opened(&mut self, ui: &mut Ui, max_width: f32) -> Option<TimeSubmit> {
        let title = match self.target {
            TimeEditTarget::SegmentStart(_) => "Segment start (milliseconds)",
            TimeEditTarget::SegmentEnd(_) => "Segment end (milliseconds)",
        };
        ui.label(title);
        draw_short_separator(ui, max_width);

        ui.text_edit_singleline(&mut self.input);

        draw_short_separator(ui, max_width);
        let mut result = None;
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                match self.input.trim().parse::<Msecs>() {
                    Ok(msecs) if msecs >= self.min && msecs <= self.max => {
                        self.state = TimeInputState::Closed;
                        result = Some(TimeSubmit {
                            target: self.target,
                            msecs,
                        });
                    }
                    _ => self.state = TimeInputState::RangeError,
                }
            }
            if ui.button("Cancel").clicked() {
                self.state = TimeInputState::Closed;
            }
        });
        result
    }

    fn draw_range_error(&mut self, ui: &mut Ui, max_width: f32) {
        ui.label(format!(
            "Enter a number of milliseconds between {} and {}",
            self.min, self.max
        ));
        draw_short_separator(ui, max_width);
        if ui.button("Ok").clicked() {
            self.state = TimeInputState::Opened;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorSubmit {
    pub code_id: i64,
    pub color: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ColorState {
    Closed,
    Opened,
}

/// Palette picker for a code's color.
pub struct ColorDialog {
    state: ColorState,
    code_id: i64,
    code_name: String,
}

impl ColorDialog {
    pub fn new() -> Self {
        ColorDialog {
            state: ColorState::Closed,
            code_id: 0,
            code_name: String::new(),
        }
    }

    pub fn open(&mut self, code_id: i64, code_name: &str) {
        self.code_id = code_id;
        self.code_name = code_name.to_string();
        self.state = ColorState::Opened;
    }

    pub fn draw(&mut self, ctx: &egui::Context, max_width: f32) -> Option<ColorSubmit> {
        if self.state == ColorState::Closed {
            return None;
        }

        let mut result = None;
        Modal::new("color picker".into()).show(ctx, |ui| {
            ui.set_max_width(max_width);
            ui.label(format!("Color for {}", self.code_name));
            draw_short_separator(ui, max_width);

            for row in colors::CODE_PALETTE.chunks(8) {
                ui.horizontal(|ui| {
                    for hex in row {
                        let swatch = Button::new("      ").fill(colors::color_from_hex(hex));
                        if swatch.ui(ui).clicked() {
                            self.state = ColorState::Closed;
                            result = Some(ColorSubmit {
                                code_id: self.code_id,
                                color: hex.to_string(),
                            });
                        }
                    }
                });
            }

            draw_short_separator(ui, max_width);
            if ui.button("Cancel").clicked() {
                self.state = ColorState::Closed;
            }
        });

        result
    }
}

fn draw_short_separator(ui: &mut Ui, max_width: f32) {
    ui.set_max_width(10.0);
    ui.separator();
    ui.set_max_width(max_width);
}

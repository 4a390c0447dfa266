use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use eframe::egui::text::{LayoutJob, TextFormat};
use eframe::egui::text_edit::TextEditState;
use eframe::egui::{
    self, Button, ComboBox, FontId, Key, Label, Modal, PointerButton, Pos2, Rect, ScrollArea,
    Sense, Slider, Stroke, TextEdit, Ui, UiBuilder, Vec2, Widget,
};
use uuid::Uuid;

use qoda::{
    codebook, colors, dialogs, graph_layout, persistent, player, refresh, segments, store,
    task_timer, transcript, types,
};

use codebook::{CodebookSnapshot, DropTarget, MutationOutcome, TreeItem};
use dialogs::{
    ColorDialog, ConfirmAction, ConfirmDialog, MemoDialog, MemoSubmit, MemoTarget, NameInputDialog,
    NamePurpose, NameSubmit, TimeEditTarget, TimeInputDialog, TimeSubmit,
};
use graph_layout::{FocusItem, GraphLayout, GraphOptions, NodeBox, NodeKind};
use persistent::Settings;
use player::{MediaPlayer, PlaybackController, SimulatedPlayer};
use refresh::{RefreshBus, Refreshable};
use segments::{LinkHandshake, PendingPhase, PendingSegment, SegmentDisplay, TextSelection};
use store::{CodebookStore, InsertOutcome, MemoryStore};
use task_timer::TaskTimer;
use types::{
    current_date_string, msecs_to_time_label, Annotation, CodedText, Segment, TimeMarker,
};

fn main() -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("qoda", options, Box::new(|_cc| Ok(Box::<App>::default())))
}

const TRANSCRIPT_EDITOR_ID: &str = "transcript editor";

const SPEAKER_KEYS: [Key; 8] = [
    Key::Num1,
    Key::Num2,
    Key::Num3,
    Key::Num4,
    Key::Num5,
    Key::Num6,
    Key::Num7,
    Key::Num8,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ActiveView {
    Coding,
    Graph,
}

struct App {
    layout: Layout,
    settings: Settings,
    store: MemoryStore,
    bus: RefreshBus,
    active_view: ActiveView,

    coding: CodingView,
    graph: GraphView,

    name_dialog: NameInputDialog,
    memo_dialog: MemoDialog,
    confirm_dialog: ConfirmDialog,
    time_dialog: TimeInputDialog,
    color_dialog: ColorDialog,
}

struct Layout {
    top_bar_height: f32,
    tree_width: f32,
    media_controls_height: f32,
    segment_stripes_height: f32,
    graph_controls_height: f32,
    graph_font_scale: f32,
}

/// State of the transcript coding screen: the loaded transcript, its
/// timestamps and segments, and the selection/link bookkeeping.
struct CodingView {
    token: Uuid,
    snapshot: CodebookSnapshot,
    owner: String,

    file_id: i64,
    next_file_id: i64,
    file_name: String,
    transcript_text: String,
    markers: Vec<TimeMarker>,
    speakers: Vec<String>,

    player: SimulatedPlayer,
    controller: PlaybackController,

    segment_displays: Vec<SegmentDisplay>,
    coded_text: Vec<CodedText>,
    annotations: Vec<Annotation>,
    pending: PendingSegment,
    handshake: LinkHandshake,

    selected_item: Option<TreeItem>,
    moving_item: Option<TreeItem>,
    clicked_segment: Option<i64>,
    selection: Option<TextSelection>,
    cursor_offset: usize,
    scroll_to_offset: Option<usize>,
    status: String,
}

/// State of the graph screen. The layout is only rebuilt when the user
/// presses View; dragged node positions live in `overrides` on top of it.
struct GraphView {
    token: Uuid,
    snapshot: CodebookSnapshot,
    focus: Option<FocusItem>,
    layout: Option<GraphLayout>,
    overrides: HashMap<(NodeKind, i64), (f32, f32)>,
}

impl Refreshable for CodingView {
    fn reload_codes(&mut self, store: &dyn CodebookStore) {
        self.snapshot.reload(store);
    }

    fn reload_segments(&mut self, store: &dyn CodebookStore) {
        let rows = store.list_segments(self.file_id, &self.owner);
        self.segment_displays = segments::build_displays(&rows, &self.snapshot.codes);
        self.coded_text = store.list_coded_text(self.file_id, &self.owner);
        self.annotations = store.list_annotations(self.file_id, &self.owner);
    }
}

impl Refreshable for GraphView {
    fn reload_codes(&mut self, store: &dyn CodebookStore) {
        self.snapshot.reload(store);
    }

    fn reload_segments(&mut self, _store: &dyn CodebookStore) {}
}

impl Default for App {
    fn default() -> Self {
        let mut settings = Settings::default();
        if let Err(e) = persistent::load_settings(&mut settings) {
            println!("Error loading settings: {e}");
        }

        let mut bus = RefreshBus::default();
        let coding_token = bus.register("coding view");
        let graph_token = bus.register("graph view");

        let mut res = Self {
            layout: Layout {
                top_bar_height: 30.0,
                tree_width: 260.0,
                media_controls_height: 34.0,
                segment_stripes_height: 90.0,
                graph_controls_height: 34.0,
                graph_font_scale: 1.6,
            },
            settings,
            store: MemoryStore::new(),
            bus,
            active_view: ActiveView::Coding,
            coding: CodingView {
                token: coding_token,
                snapshot: CodebookSnapshot::default(),
                owner: String::new(),
                file_id: 0,
                next_file_id: 1,
                file_name: String::new(),
                transcript_text: String::new(),
                markers: vec![],
                speakers: vec![],
                player: SimulatedPlayer::new(0),
                controller: PlaybackController::default(),
                segment_displays: vec![],
                coded_text: vec![],
                annotations: vec![],
                pending: PendingSegment::default(),
                handshake: LinkHandshake::default(),
                selected_item: None,
                moving_item: None,
                clicked_segment: None,
                selection: None,
                cursor_offset: 0,
                scroll_to_offset: None,
                status: String::new(),
            },
            graph: GraphView {
                token: graph_token,
                snapshot: CodebookSnapshot::default(),
                focus: None,
                layout: None,
                overrides: HashMap::new(),
            },
            name_dialog: NameInputDialog::new(),
            memo_dialog: MemoDialog::new(),
            confirm_dialog: ConfirmDialog::new(),
            time_dialog: TimeInputDialog::new(),
            color_dialog: ColorDialog::new(),
        };
        res.coding.owner = res.settings.coder_name.clone();
        res.coding.reload_codes(&res.store);
        res.graph.reload_codes(&res.store);

        // If a transcript path is provided as the first argument, try to load it.
        if let Some(first_arg) = std::env::args().nth(1) {
            println!("Trying to open transcript: {first_arg}");
            match res.load_transcript(&PathBuf::from(first_arg)) {
                Ok(()) => println!("Transcript loaded successfully."),
                Err(e) => println!("Error loading transcript: {e}"),
            }
        }

        res
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(eframe::egui::Frame::new())
            .show(ctx, |ui| {
                ctx.options_mut(|o| o.line_scroll_speed = 100.0);
                ctx.style_mut(|s| {
                    s.interaction.tooltip_delay = 0.0;
                    s.interaction.tooltip_grace_time = 0.0;
                    s.interaction.show_tooltips_only_when_still = false;
                });

                let window_width = ui.max_rect().width();
                let window_height = ui.max_rect().height();

                self.poll_playback();
                self.apply_refresh();
                self.handle_keys(ctx);

                self.draw_top_bar(ui);

                match self.active_view {
                    ActiveView::Coding => self.draw_coding_view(ui, window_width, window_height),
                    ActiveView::Graph => self.draw_graph_view(ui, window_width, window_height),
                }

                self.draw_clicked_segment(ctx, window_width - 100.0);

                if let Some(submit) = self.name_dialog.draw(ctx, window_width - 100.0) {
                    self.apply_name_submit(submit);
                }
                if let Some(submit) =
                    self.memo_dialog
                        .draw(ctx, window_width - 100.0, window_height - 100.0)
                {
                    self.apply_memo_submit(submit);
                }
                if let Some(action) = self.confirm_dialog.draw(ctx, window_width - 100.0) {
                    self.apply_confirm(action);
                }
                if let Some(submit) = self.time_dialog.draw(ctx, window_width - 100.0) {
                    self.apply_time_submit(submit);
                }
                if let Some(submit) = self.color_dialog.draw(ctx, window_width - 100.0) {
                    let outcome =
                        codebook::set_code_color(&mut self.store, submit.code_id, &submit.color);
                    self.report_outcome(outcome);
                }

                // If Ctrl+Q clicked, quit the app
                if ctx.input(|i| i.key_down(Key::Q) && i.modifiers.ctrl) {
                    std::process::exit(0);
                }

                if self.coding.player.is_playing() {
                    ctx.request_repaint_after(Duration::from_millis(100));
                }
            });
    }
}

impl App {
    fn draw_top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open transcript").clicked() {
                if let Some(path) = rfd::FileDialog::new().pick_file() {
                    println!("Loading transcript: {path:?}...");
                    match self.load_transcript(&path) {
                        Ok(()) => println!("Successfully loaded transcript."),
                        Err(e) => println!("Error loading transcript: {e}"),
                    }
                }
            }

            let coding_fill = if self.active_view == ActiveView::Coding {
                colors::DARK_BLUE
            } else {
                colors::GRAY_50
            };
            if Button::new("Coding").fill(coding_fill).ui(ui).clicked() {
                self.active_view = ActiveView::Coding;
            }
            let graph_fill = if self.active_view == ActiveView::Graph {
                colors::DARK_BLUE
            } else {
                colors::GRAY_50
            };
            if Button::new("Graph").fill(graph_fill).ui(ui).clicked() {
                self.active_view = ActiveView::Graph;
            }

            ui.label("Coder:");
            let coder_edit = TextEdit::singleline(&mut self.settings.coder_name)
                .desired_width(120.0)
                .ui(ui);
            if coder_edit.lost_focus() {
                self.on_coder_changed();
            }

            if ui
                .checkbox(&mut self.settings.scroll_transcript, "Scroll transcript")
                .changed()
            {
                self.persist_settings();
            }

            ui.with_layout(
                egui::Layout::right_to_left(eframe::emath::Align::RIGHT),
                |ui| {
                    let file_label = if self.coding.file_name.is_empty() {
                        "No transcript loaded".to_string()
                    } else {
                        self.coding.file_name.clone()
                    };
                    ui.label(file_label);
                },
            );
        });
    }

    fn draw_coding_view(&mut self, ui: &mut Ui, window_width: f32, window_height: f32) {
        let tree_area = Rect::from_min_size(
            Pos2::new(0.0, self.layout.top_bar_height),
            Vec2::new(
                self.layout.tree_width,
                window_height - self.layout.top_bar_height,
            ),
        );
        self.draw_code_tree(tree_area, ui);

        let controls_area = Rect::from_min_size(
            Pos2::new(tree_area.max.x, self.layout.top_bar_height),
            Vec2::new(
                window_width - tree_area.max.x,
                self.layout.media_controls_height,
            ),
        );
        self.draw_media_controls(controls_area, ui);

        let stripes_area = Rect::from_min_size(
            Pos2::new(tree_area.max.x, controls_area.max.y),
            Vec2::new(
                window_width - tree_area.max.x,
                self.layout.segment_stripes_height,
            ),
        );
        self.draw_segment_stripes(stripes_area, ui);

        let transcript_area = Rect::from_min_size(
            Pos2::new(tree_area.max.x, stripes_area.max.y),
            Vec2::new(
                window_width - tree_area.max.x,
                window_height - stripes_area.max.y,
            ),
        );
        self.draw_transcript(transcript_area, ui);
    }

    fn draw_code_tree(&mut self, area: Rect, ui: &mut Ui) {
        ui.painter().rect_filled(area, 0.0, colors::GRAY_30);

        ui.allocate_new_ui(UiBuilder::new().max_rect(area.shrink(4.0)), |ui| {
            ui.label(self.coding.status.clone());

            ui.horizontal_wrapped(|ui| {
                if ui.button("Add code").clicked() {
                    self.name_dialog
                        .open(NamePurpose::AddCode, "", self.code_names());
                }
                if ui.button("Add category").clicked() {
                    self.name_dialog
                        .open(NamePurpose::AddCategory, "", self.category_names());
                }
                if ui.button("Rename").clicked() {
                    self.open_rename_dialog();
                }
                if ui.button("Color").clicked() {
                    self.open_color_dialog();
                }
                if ui.button("Memo").clicked() {
                    self.open_item_memo_dialog();
                }
                if ui.button("Move").clicked() {
                    self.arm_move();
                }
                if ui.button("To top level").clicked() {
                    self.move_selected_to_top_level();
                }
                if ui.button("Delete").clicked() {
                    self.open_delete_confirm();
                }
            });

            let rows = codebook::display_tree(
                &self.coding.snapshot.categories,
                &self.coding.snapshot.codes,
            );
            ScrollArea::vertical()
                .id_salt("code tree")
                .auto_shrink(false)
                .show(ui, |ui| {
                    for row in rows {
                        ui.horizontal(|ui| {
                            ui.add_space(row.level as f32 * 14.0);
                            let mut name = row.name.clone();
                            if row.has_memo {
                                name.push_str(" *");
                            }
                            let fill = match &row.color {
                                Some(hex) => colors::color_from_hex(hex),
                                None => colors::GRAY_50,
                            };
                            let mut button = Button::new(name)
                                .fill(fill)
                                .wrap_mode(egui::TextWrapMode::Truncate);
                            if self.coding.selected_item == Some(row.item) {
                                button = button.stroke(Stroke::new(2.0, colors::DARK_YELLOW));
                            }
                            if button.ui(ui).clicked() {
                                self.on_tree_row_clicked(row.item);
                            }
                        });
                    }
                });
        });
    }

    fn on_tree_row_clicked(&mut self, item: TreeItem) {
        if let Some(moving) = self.coding.moving_item.take() {
            self.apply_move(moving, item);
            return;
        }
        self.coding.selected_item = Some(item);
    }

    fn apply_move(&mut self, moving: TreeItem, target: TreeItem) {
        let target = match target {
            TreeItem::Category(id) => DropTarget::Category(id),
            TreeItem::Code(id) => DropTarget::Code(id),
        };
        let outcome = match moving {
            TreeItem::Category(id) => codebook::reparent_category(&mut self.store, id, target),
            TreeItem::Code(id) => codebook::reparent_code(&mut self.store, id, target),
        };
        self.report_outcome(outcome);
    }

    fn arm_move(&mut self) {
        match self.coding.selected_item {
            Some(item) => {
                self.coding.moving_item = Some(item);
                self.coding.status = format!("Click the new parent for '{}'", self.item_name(item));
            }
            None => self.coding.status = "Select an item to move first".to_string(),
        }
    }

    fn move_selected_to_top_level(&mut self) {
        let Some(item) = self.coding.selected_item else {
            self.coding.status = "Select an item first".to_string();
            return;
        };
        let outcome = match item {
            TreeItem::Category(id) => {
                codebook::reparent_category(&mut self.store, id, DropTarget::TopLevel)
            }
            TreeItem::Code(id) => {
                codebook::reparent_code(&mut self.store, id, DropTarget::TopLevel)
            }
        };
        self.report_outcome(outcome);
    }

    fn open_rename_dialog(&mut self) {
        match self.coding.selected_item {
            Some(TreeItem::Code(id)) => {
                let name = self.item_name(TreeItem::Code(id));
                self.name_dialog
                    .open(NamePurpose::RenameCode(id), &name, self.code_names());
            }
            Some(TreeItem::Category(id)) => {
                let name = self.item_name(TreeItem::Category(id));
                self.name_dialog.open(
                    NamePurpose::RenameCategory(id),
                    &name,
                    self.category_names(),
                );
            }
            None => self.coding.status = "Select an item to rename first".to_string(),
        }
    }

    fn open_color_dialog(&mut self) {
        match self.coding.selected_item {
            Some(TreeItem::Code(id)) => {
                let name = self.item_name(TreeItem::Code(id));
                self.color_dialog.open(id, &name);
            }
            _ => self.coding.status = "Select a code to recolor first".to_string(),
        }
    }

    fn open_item_memo_dialog(&mut self) {
        match self.coding.selected_item {
            Some(TreeItem::Code(id)) => {
                let (name, memo) = match self.coding.snapshot.code(id) {
                    Some(code) => (code.name.clone(), code.memo.clone()),
                    None => return,
                };
                self.memo_dialog.open(MemoTarget::Code(id), &name, &memo);
            }
            Some(TreeItem::Category(id)) => {
                let (name, memo) = match self.coding.snapshot.category(id) {
                    Some(category) => (category.name.clone(), category.memo.clone()),
                    None => return,
                };
                self.memo_dialog
                    .open(MemoTarget::Category(id), &name, &memo);
            }
            None => self.coding.status = "Select an item first".to_string(),
        }
    }

    fn open_delete_confirm(&mut self) {
        match self.coding.selected_item {
            Some(TreeItem::Code(id)) => {
                let name = self.item_name(TreeItem::Code(id));
                self.confirm_dialog.open(
                    format!("Delete code '{name}'? Its segments and coded text go with it."),
                    ConfirmAction::DeleteCode(id),
                );
            }
            Some(TreeItem::Category(id)) => {
                let name = self.item_name(TreeItem::Category(id));
                self.confirm_dialog.open(
                    format!("Delete category '{name}'? Its children move to the top level."),
                    ConfirmAction::DeleteCategory(id),
                );
            }
            None => self.coding.status = "Select an item to delete first".to_string(),
        }
    }

    fn item_name(&self, item: TreeItem) -> String {
        match item {
            TreeItem::Code(id) => self
                .coding
                .snapshot
                .code(id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            TreeItem::Category(id) => self
                .coding
                .snapshot
                .category(id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        }
    }

    fn code_names(&self) -> Vec<String> {
        self.coding
            .snapshot
            .codes
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    fn category_names(&self) -> Vec<String> {
        self.coding
            .snapshot
            .categories
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    fn report_outcome(&mut self, outcome: MutationOutcome) {
        match outcome {
            MutationOutcome::Applied => {
                self.coding.status.clear();
                self.bus.broadcast();
            }
            MutationOutcome::DuplicateName => {
                self.coding.status = "That name is already in use".to_string();
            }
            MutationOutcome::Missing => {
                self.coding.status = "That item no longer exists".to_string();
            }
            MutationOutcome::TargetIsCode => {
                self.coding.status = "A category cannot go under a code".to_string();
            }
            MutationOutcome::IntoItself => {
                self.coding.status = "An item cannot go under itself".to_string();
            }
            MutationOutcome::WouldMerge {
                code_id,
                onto_code_id,
            } => {
                let from = self.item_name(TreeItem::Code(code_id));
                let onto = self.item_name(TreeItem::Code(onto_code_id));
                self.confirm_dialog.open(
                    format!(
                        "Merge code '{from}' into '{onto}'? Its segments and coded text move over."
                    ),
                    ConfirmAction::MergeCodes {
                        code_id,
                        onto_code_id,
                    },
                );
            }
        }
    }

    fn draw_media_controls(&mut self, area: Rect, ui: &mut Ui) {
        ui.allocate_new_ui(UiBuilder::new().max_rect(area.shrink(4.0)), |ui| {
            ui.horizontal(|ui| {
                let play_label = if self.coding.player.is_playing() {
                    "Pause"
                } else {
                    "Play"
                };
                if ui.button(play_label).clicked() {
                    self.coding.controller.play_pause(&mut self.coding.player);
                }
                if ui.button("Stop").clicked() {
                    self.coding.controller.stop(&mut self.coding.player);
                }
                if ui.button("Rewind 3s").clicked() {
                    self.coding.controller.rewind(&mut self.coding.player);
                }

                let duration = self.coding.player.duration_ms();
                let position = self.coding.controller.position_ms();
                let mut fraction = if duration > 0 {
                    position as f32 / duration as f32
                } else {
                    0.0
                };
                let slider = Slider::new(&mut fraction, 0.0..=1.0).show_value(false);
                if ui.add(slider).changed() {
                    self.coding.player.seek_fraction(fraction);
                }
                ui.label(format!(
                    "{} / {}",
                    msecs_to_time_label(position),
                    msecs_to_time_label(duration)
                ));

                if ui.button(self.coding.pending.button_label()).clicked() {
                    self.coding
                        .pending
                        .mark(position, msecs_to_time_label(position));
                }
                match self.coding.pending.phase() {
                    PendingPhase::Empty => {}
                    PendingPhase::StartSet => {
                        ui.label(format!("Pending: {} -", self.coding.pending.start_label));
                    }
                    PendingPhase::Complete => {
                        ui.label(format!(
                            "Pending: {} - {}",
                            self.coding.pending.start_label, self.coding.pending.end_label
                        ));
                    }
                }
                if ui.button("Assign to code").clicked() {
                    self.assign_pending_segment();
                }
            });
        });
    }

    fn assign_pending_segment(&mut self) {
        let Some((start_ms, end_ms)) = self.coding.pending.bounds() else {
            self.coding.status = "Mark a start and an end first".to_string();
            return;
        };
        let Some(TreeItem::Code(code_id)) = self.coding.selected_item else {
            self.coding.status = "Select a code for the segment".to_string();
            return;
        };
        self.store.insert_segment(Segment {
            id: 0,
            file_id: self.coding.file_id,
            start_ms,
            end_ms,
            code_id,
            owner: self.settings.coder_name.clone(),
            memo: String::new(),
            date: current_date_string(),
        });
        self.coding.pending.clear();
        self.coding.status.clear();
        self.bus.broadcast();
    }

    fn draw_segment_stripes(&mut self, area: Rect, ui: &mut Ui) {
        ui.painter().rect_filled(area, 0.0, colors::GRAY_30);

        let duration = self.coding.player.duration_ms();
        if duration <= 0 {
            ui.put(area, Label::new("Open a transcript to see its segments."));
            return;
        }
        let scaler = area.width() / duration as f32;

        let position_x = area.min.x + self.coding.controller.position_ms() as f32 * scaler;
        ui.painter().line_segment(
            [
                Pos2::new(position_x, area.min.y),
                Pos2::new(position_x, area.max.y),
            ],
            Stroke::new(1.0, colors::MILD_RED),
        );

        let displays = self.coding.segment_displays.clone();
        for display in &displays {
            let segment = &display.segment;
            let x = area.min.x + segment.start_ms as f32 * scaler;
            let width = ((segment.end_ms - segment.start_ms) as f32 * scaler).max(2.0);
            let y = area.min.y + segments::lane_y(display.lane);
            let rect = Rect::from_min_size(Pos2::new(x, y), Vec2::new(width, 8.0));
            let stripe = ui.put(
                rect,
                Button::new("")
                    .fill(colors::color_from_hex(&display.color))
                    .sense(Sense::click()),
            );
            if stripe.clicked() {
                self.coding.clicked_segment = Some(segment.id);
            }
            stripe.on_hover_ui_at_pointer(|ui| {
                ui.label(format!(
                    "{}: {} - {}",
                    display.code_name,
                    msecs_to_time_label(segment.start_ms),
                    msecs_to_time_label(segment.end_ms)
                ));
                if !segment.memo.is_empty() {
                    ui.label(segment.memo.clone());
                }
            });
        }

        // The segment being marked out right now, above the lanes.
        let pending_range = match self.coding.pending.phase() {
            PendingPhase::Empty => None,
            PendingPhase::StartSet => self
                .coding
                .pending
                .start_ms
                .map(|start| (start, self.coding.controller.position_ms())),
            PendingPhase::Complete => self.coding.pending.bounds(),
        };
        if let Some((from, to)) = pending_range {
            let (from, to) = (from.min(to), from.max(to));
            let rect = Rect::from_min_max(
                Pos2::new(area.min.x + from as f32 * scaler, area.min.y),
                Pos2::new(area.min.x + to as f32 * scaler, area.min.y + 4.0),
            );
            ui.painter().rect_filled(rect, 0.0, colors::DARK_YELLOW);
        }
    }

    fn draw_transcript(&mut self, area: Rect, ui: &mut Ui) {
        let row_height = ui.fonts(|fs| {
            fs.layout_no_wrap("A".to_string(), FontId::default(), colors::BLACK)
                .rect
                .height()
        }) * 1.4;

        let coded = self.coding.coded_text.clone();
        let annotations = self.coding.annotations.clone();
        let code_colors: Vec<(i64, String)> = self
            .coding
            .snapshot
            .codes
            .iter()
            .map(|c| (c.id, c.color.clone()))
            .collect();
        let mut layouter = |ui: &Ui, buf: &str, wrap_width: f32| {
            let mut job = transcript_layout_job(buf, &coded, &annotations, &code_colors);
            job.wrap.max_width = wrap_width;
            ui.fonts(|f| f.layout_job(job))
        };

        ui.allocate_new_ui(UiBuilder::new().max_rect(area.shrink(4.0)), |ui| {
            ui.horizontal(|ui| {
                if ui.button("Mark").clicked() {
                    self.mark_selection();
                }
                if ui.button("Unmark").clicked() {
                    self.unmark_at_cursor();
                }
                if ui.button("Annotate").clicked() {
                    self.annotate_selection();
                }
                if ui.button("Mark for link").clicked() {
                    self.arm_text_selection();
                }
                if ui.button("Link to marked segment").clicked() {
                    self.link_selection_to_marked_segment();
                }
                if ui.button("Play from cursor").clicked() {
                    self.play_from_cursor();
                }
            });

            let mut scroll = ScrollArea::vertical()
                .id_salt("transcript scroll")
                .auto_shrink(false);
            if let Some(offset) = self.coding.scroll_to_offset.take() {
                let line = line_of_char_offset(&self.coding.transcript_text, offset);
                scroll = scroll.vertical_scroll_offset(line as f32 * row_height);
            }
            scroll.show(ui, |ui| {
                let output = TextEdit::multiline(&mut self.coding.transcript_text)
                    .id(egui::Id::new(TRANSCRIPT_EDITOR_ID))
                    .desired_width(f32::INFINITY)
                    .desired_rows(20)
                    .layouter(&mut layouter)
                    .show(ui);

                if let Some(range) = output.state.cursor.char_range() {
                    let start = range.primary.index.min(range.secondary.index);
                    let end = range.primary.index.max(range.secondary.index);
                    self.coding.cursor_offset = range.primary.index;
                    if start != end {
                        let selected: String = self
                            .coding
                            .transcript_text
                            .chars()
                            .skip(start)
                            .take(end - start)
                            .collect();
                        self.coding.selection = Some(TextSelection {
                            file_id: self.coding.file_id,
                            start,
                            end,
                            selected,
                        });
                    }
                }
                if output.response.changed() {
                    self.refresh_markers();
                }
            });
        });
    }

    fn mark_selection(&mut self) {
        let Some(selection) = self.coding.selection.clone() else {
            self.coding.status = "Select some text first".to_string();
            return;
        };
        let Some(TreeItem::Code(code_id)) = self.coding.selected_item else {
            self.coding.status = "Select a code first".to_string();
            return;
        };
        let row = CodedText {
            id: 0,
            code_id,
            file_id: selection.file_id,
            selected: selection.selected,
            start: selection.start,
            end: selection.end,
            owner: self.settings.coder_name.clone(),
            memo: String::new(),
            date: current_date_string(),
            segment_id: None,
        };
        match self.store.insert_coded_text(row) {
            InsertOutcome::Added(_) => {
                self.coding.status.clear();
                self.bus.broadcast();
            }
            InsertOutcome::AlreadyExists => {
                self.coding.status = "That text is already coded with this code".to_string();
            }
        }
    }

    /// Remove the most recently added coded span under the cursor.
    fn unmark_at_cursor(&mut self) {
        let offset = self.coding.cursor_offset;
        let row = self
            .coding
            .coded_text
            .iter()
            .rev()
            .find(|r| r.start <= offset && offset <= r.end)
            .cloned();
        match row {
            Some(row) => {
                self.store
                    .delete_coded_text(row.code_id, row.start, row.end, &row.owner);
                self.bus.broadcast();
            }
            None => self.coding.status = "No coded text at the cursor".to_string(),
        }
    }

    fn annotate_selection(&mut self) {
        let Some(selection) = self.coding.selection.clone() else {
            self.coding.status = "Select some text first".to_string();
            return;
        };
        let existing = self
            .coding
            .annotations
            .iter()
            .find(|a| a.start == selection.start)
            .map(|a| a.memo.clone())
            .unwrap_or_default();
        let subject: String = selection.selected.chars().take(40).collect();
        self.memo_dialog.open(
            MemoTarget::Annotation {
                file_id: selection.file_id,
                start: selection.start,
                end: selection.end,
            },
            &subject,
            &existing,
        );
    }

    fn arm_text_selection(&mut self) {
        let Some(selection) = self.coding.selection.clone() else {
            self.coding.status = "Select some text first".to_string();
            return;
        };
        if self.coding.handshake.arm_text(selection) {
            self.coding.status = "Text marked, now pick a segment to link".to_string();
        } else {
            self.coding.status = "Select some text first".to_string();
        }
    }

    fn link_selection_to_marked_segment(&mut self) {
        let Some(segment_id) = self.coding.handshake.armed_segment() else {
            self.coding.status = "No segment marked for linking".to_string();
            return;
        };
        let Some(segment) = self.segment_by_id(segment_id) else {
            self.coding.status = "The marked segment no longer exists".to_string();
            self.coding.handshake.disarm();
            return;
        };
        let Some(selection) = self.coding.selection.clone() else {
            self.coding.status = "Select some text first".to_string();
            return;
        };
        let owner = self.settings.coder_name.clone();
        if let Some(row) = self
            .coding
            .handshake
            .commit_armed_segment(&segment, &selection, &owner)
        {
            self.insert_link_row(row);
        }
    }

    fn insert_link_row(&mut self, row: CodedText) {
        match self.store.insert_coded_text(row) {
            InsertOutcome::Added(_) => {
                self.coding.status = "Linked the text to the segment".to_string();
                self.bus.broadcast();
            }
            InsertOutcome::AlreadyExists => {
                self.coding.status = "That text is already coded with this code".to_string();
            }
        }
    }

    fn segment_by_id(&self, segment_id: i64) -> Option<Segment> {
        self.coding
            .segment_displays
            .iter()
            .find(|d| d.segment.id == segment_id)
            .map(|d| d.segment.clone())
    }

    fn play_from_cursor(&mut self) {
        match transcript::time_at_offset(&self.coding.markers, self.coding.cursor_offset) {
            Some(msecs) => {
                let duration = self.coding.player.duration_ms();
                if duration > 0 {
                    self.coding
                        .player
                        .seek_fraction(msecs as f32 / duration as f32);
                    self.coding.player.play();
                }
            }
            None => self.coding.status = "No timestamp at the cursor".to_string(),
        }
    }

    fn draw_clicked_segment(&mut self, ctx: &egui::Context, max_width: f32) {
        let Some(segment_id) = self.coding.clicked_segment else {
            return;
        };
        let Some(display) = self
            .coding
            .segment_displays
            .iter()
            .find(|d| d.segment.id == segment_id)
            .cloned()
        else {
            self.coding.clicked_segment = None;
            return;
        };
        let segment = display.segment.clone();
        let duration = self.coding.player.duration_ms();
        let owner = self.settings.coder_name.clone();
        let mut close = false;

        Modal::new("clicked segment".into()).show(ctx, |ui| {
            ui.vertical(|ui| {
                ui.set_max_width(max_width);

                let draw_separator = |ui: &mut Ui| {
                    ui.set_max_width(10.0);
                    ui.separator();
                    ui.set_max_width(max_width);
                };

                let close_button = ui.button("Close");
                draw_separator(ui);
                ui.label(display.code_name.clone());
                ui.label(format!(
                    "{} - {}",
                    msecs_to_time_label(segment.start_ms),
                    msecs_to_time_label(segment.end_ms)
                ));
                if !segment.memo.is_empty() {
                    ui.label(segment.memo.clone());
                }
                draw_separator(ui);

                ui.horizontal(|ui| {
                    if ui.button("Play").clicked() {
                        self.coding
                            .controller
                            .play_segment(&mut self.coding.player, &segment);
                        close = true;
                    }
                    if ui.button("Edit start").clicked() {
                        let (min, max) = segments::start_edit_range(&segment);
                        self.time_dialog.open(
                            TimeEditTarget::SegmentStart(segment.id),
                            segment.start_ms,
                            min,
                            max,
                        );
                        close = true;
                    }
                    if ui.button("Edit end").clicked() {
                        let (min, max) = segments::end_edit_range(&segment, duration);
                        self.time_dialog.open(
                            TimeEditTarget::SegmentEnd(segment.id),
                            segment.end_ms,
                            min,
                            max,
                        );
                        close = true;
                    }
                    if ui.button("Memo").clicked() {
                        self.memo_dialog.open(
                            MemoTarget::Segment(segment.id),
                            &display.code_name,
                            &segment.memo,
                        );
                        close = true;
                    }
                });

                ui.horizontal(|ui| {
                    if ui.button("Mark for link").clicked() {
                        self.coding.handshake.arm_segment(segment.id);
                        self.coding.status = "Segment marked, now select text to link".to_string();
                        close = true;
                    }
                    if ui.button("Link to marked text").clicked() {
                        match self.coding.handshake.commit_armed_text(&segment, &owner) {
                            Some(row) => self.insert_link_row(row),
                            None => {
                                self.coding.status = "No text marked for linking".to_string();
                            }
                        }
                        close = true;
                    }
                    if ui.button("Delete").clicked() {
                        self.confirm_dialog.open(
                            format!(
                                "Delete the '{}' segment at {}?",
                                display.code_name,
                                msecs_to_time_label(segment.start_ms)
                            ),
                            ConfirmAction::DeleteSegment(segment.id),
                        );
                        close = true;
                    }
                });

                if close_button.clicked() {
                    close = true;
                }
            })
        });

        // Esc closes the popup
        ctx.input(|i| {
            if i.key_down(Key::Escape) {
                close = true;
            }
        });

        if close {
            self.coding.clicked_segment = None;
        }
    }

    fn draw_graph_view(&mut self, ui: &mut Ui, window_width: f32, window_height: f32) {
        let controls_area = Rect::from_min_size(
            Pos2::new(0.0, self.layout.top_bar_height),
            Vec2::new(window_width, self.layout.graph_controls_height),
        );
        let canvas_area = Rect::from_min_size(
            Pos2::new(0.0, controls_area.max.y),
            Vec2::new(window_width, window_height - controls_area.max.y),
        );

        ui.allocate_new_ui(UiBuilder::new().max_rect(controls_area.shrink(4.0)), |ui| {
            ui.horizontal(|ui| {
                let focus_label = match self.graph.focus {
                    None => "All".to_string(),
                    Some(FocusItem::Category(id)) => self
                        .graph
                        .snapshot
                        .category(id)
                        .map_or("Deleted".to_string(), |c| c.name.clone()),
                    Some(FocusItem::Code(id)) => self
                        .graph
                        .snapshot
                        .code(id)
                        .map_or("Deleted".to_string(), |c| c.name.clone()),
                };
                ComboBox::new("graph focus", "")
                    .selected_text(format!("Focus: {focus_label}"))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.graph.focus, None, "All");
                        for category in &self.graph.snapshot.categories {
                            ui.selectable_value(
                                &mut self.graph.focus,
                                Some(FocusItem::Category(category.id)),
                                category.name.clone(),
                            );
                        }
                        for code in &self.graph.snapshot.codes {
                            ui.selectable_value(
                                &mut self.graph.focus,
                                Some(FocusItem::Code(code.id)),
                                code.name.clone(),
                            );
                        }
                    });

                if ui
                    .checkbox(&mut self.settings.black_and_white_graph, "Black and white")
                    .changed()
                {
                    self.persist_settings();
                }
                if ui
                    .checkbox(
                        &mut self.settings.larger_category_font,
                        "Large category font",
                    )
                    .changed()
                {
                    self.persist_settings();
                }

                if ui.button("View").clicked() {
                    self.rebuild_graph(canvas_area.width(), canvas_area.height());
                }
            });
        });

        self.draw_graph_canvas(canvas_area, ui);
    }

    fn rebuild_graph(&mut self, width: f32, height: f32) {
        let timer = TaskTimer::new("Graph layout");
        let options = GraphOptions {
            black_and_white: self.settings.black_and_white_graph,
            larger_category_font: self.settings.larger_category_font,
        };
        let layout = graph_layout::build_layout(
            &self.graph.snapshot.categories,
            &self.graph.snapshot.codes,
            self.graph.focus,
            width,
            height,
            &options,
        );
        timer.stop();
        if !layout.converged {
            println!(
                "WARN: graph layout hit the pass cap after {} passes",
                layout.passes
            );
        }
        self.graph.overrides.clear();
        self.graph.layout = Some(layout);
    }

    fn draw_graph_canvas(&mut self, area: Rect, ui: &mut Ui) {
        ui.painter().rect_filled(area, 0.0, colors::WHITE);

        let Some(layout) = self.graph.layout.clone() else {
            ui.put(
                Rect::from_center_size(area.center(), Vec2::new(300.0, 50.0)),
                Label::new("Press View to draw the graph."),
            );
            return;
        };

        let scale = self.layout.graph_font_scale;
        let mut boxes: Vec<NodeBox> = Vec::with_capacity(layout.nodes.len());
        for node in &layout.nodes {
            let galley = ui.fonts(|fs| {
                fs.layout_no_wrap(
                    node.name.clone(),
                    FontId::proportional(node.font_size * scale),
                    colors::BLACK,
                )
            });
            let size = galley.rect.size() + Vec2::new(12.0, 8.0);
            let (x, y) = self
                .graph
                .overrides
                .get(&(node.kind, node.id))
                .copied()
                .unwrap_or((node.x, node.y));
            boxes.push(NodeBox {
                x: area.min.x + x,
                y: area.min.y + y,
                width: size.x,
                height: size.y,
            });
        }

        // Edges first so the node boxes cover the line ends.
        for edge in &layout.edges {
            let (from, to) = graph_layout::link_endpoints(&boxes[edge.child], &boxes[edge.parent]);
            ui.painter().line_segment(
                [Pos2::new(from.0, from.1), Pos2::new(to.0, to.1)],
                Stroke::new(1.5, colors::GRAY_180),
            );
        }

        for (i, node) in layout.nodes.iter().enumerate() {
            let rect = Rect::from_min_size(
                Pos2::new(boxes[i].x, boxes[i].y),
                Vec2::new(boxes[i].width, boxes[i].height),
            );
            let text = egui::RichText::new(node.name.clone())
                .size(node.font_size * scale)
                .color(colors::BLACK);
            let node_button = ui.put(
                rect,
                Button::new(text)
                    .fill(colors::color_from_hex(&node.color))
                    .sense(Sense::click_and_drag()),
            );
            if node_button.dragged_by(PointerButton::Primary) {
                let delta = node_button.drag_delta();
                let entry = self
                    .graph
                    .overrides
                    .entry((node.kind, node.id))
                    .or_insert((node.x, node.y));
                entry.0 += delta.x;
                entry.1 += delta.y;
            }
            let memo = match node.kind {
                NodeKind::Category => self
                    .graph
                    .snapshot
                    .category(node.id)
                    .map(|c| c.memo.clone()),
                NodeKind::Code => self.graph.snapshot.code(node.id).map(|c| c.memo.clone()),
            }
            .unwrap_or_default();
            if !memo.is_empty() {
                node_button.on_hover_ui_at_pointer(|ui| {
                    ui.label(memo.clone());
                });
            }
        }
    }

    fn poll_playback(&mut self) {
        let Some(outcome) = self
            .coding
            .controller
            .poll(&mut self.coding.player, &self.coding.markers)
        else {
            return;
        };
        if outcome.segment_ended {
            self.coding.status = "Segment finished".to_string();
        }
        if self.settings.scroll_transcript {
            if let Some(offset) = outcome.scroll_to {
                self.coding.scroll_to_offset = Some(offset);
            }
        }
    }

    fn apply_refresh(&mut self) {
        if self.bus.needs_refresh(self.coding.token) {
            self.coding.reload_codes(&self.store);
            self.coding.reload_segments(&self.store);
        }
        if self.bus.needs_refresh(self.graph.token) {
            self.graph.reload_codes(&self.store);
            self.graph.reload_segments(&self.store);
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(Key::T)) {
            let stamp = transcript::insertion_timestamp(self.coding.controller.position_ms());
            self.insert_text_at_cursor(ctx, &stamp);
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(Key::R)) {
            self.coding.controller.rewind(&mut self.coding.player);
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(Key::S)) {
            self.coding.controller.play_pause(&mut self.coding.player);
        }
        for (i, key) in SPEAKER_KEYS.iter().enumerate() {
            if ctx.input(|inp| inp.modifiers.ctrl && inp.key_pressed(*key)) {
                if let Some(name) = self.coding.speakers.get(i).cloned() {
                    self.insert_text_at_cursor(ctx, &format!("\n{name}: "));
                }
            }
        }
    }

    fn insert_text_at_cursor(&mut self, ctx: &egui::Context, insert: &str) {
        let id = egui::Id::new(TRANSCRIPT_EDITOR_ID);
        let char_count = self.coding.transcript_text.chars().count();
        let char_index = TextEditState::load(ctx, id)
            .and_then(|state| state.cursor.char_range())
            .map(|range| range.primary.index)
            .unwrap_or(char_count)
            .min(char_count);
        let byte_index = char_to_byte(&self.coding.transcript_text, char_index);
        self.coding.transcript_text.insert_str(byte_index, insert);

        // Put the cursor right after the inserted text.
        if let Some(mut state) = TextEditState::load(ctx, id) {
            let cursor = egui::text::CCursor::new(char_index + insert.chars().count());
            state
                .cursor
                .set_char_range(Some(egui::text::CCursorRange::one(cursor)));
            state.store(ctx, id);
        }
        self.refresh_markers();
    }

    fn refresh_markers(&mut self) {
        self.coding.markers = transcript::extract_timestamps(&self.coding.transcript_text);
        self.coding.speakers = transcript::speaker_names(&self.coding.transcript_text);
    }

    fn load_transcript(&mut self, path: &PathBuf) -> Result<()> {
        let text = std::fs::read_to_string(path)?;

        let timer = TaskTimer::new("Parsing transcript");
        let markers = transcript::extract_timestamps(&text);
        let speakers = transcript::speaker_names(&text);
        timer.stop();
        println!(
            "Transcript has {} timestamps and {} speakers",
            markers.len(),
            speakers.len()
        );

        // Without a real media file the duration is estimated from the last
        // timestamp.
        let duration = markers
            .last()
            .map(|m| m.msecs + 30_000)
            .unwrap_or(0)
            .max(60_000);

        self.coding.file_id = self.coding.next_file_id;
        self.coding.next_file_id += 1;
        self.coding.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.coding.transcript_text = text;
        self.coding.markers = markers;
        self.coding.speakers = speakers;
        self.coding.player = SimulatedPlayer::new(duration);
        self.coding.controller = PlaybackController::default();
        self.coding.pending.clear();
        self.coding.handshake.disarm();
        self.coding.clicked_segment = None;
        self.coding.selection = None;
        self.coding.cursor_offset = 0;
        self.coding.scroll_to_offset = None;
        self.coding.status.clear();
        self.coding.reload_segments(&self.store);
        self.active_view = ActiveView::Coding;
        Ok(())
    }

    fn on_coder_changed(&mut self) {
        if self.settings.coder_name.is_empty() {
            self.settings.coder_name = "default".to_string();
        }
        self.coding.owner = self.settings.coder_name.clone();
        self.persist_settings();
        self.coding.reload_segments(&self.store);
    }

    fn persist_settings(&mut self) {
        if let Err(e) = persistent::save_settings(&self.settings) {
            println!("Error saving settings: {e}");
        }
    }

    fn apply_name_submit(&mut self, submit: NameSubmit) {
        let outcome = match submit.purpose {
            NamePurpose::AddCode => {
                codebook::add_code(&mut self.store, &submit.name, &self.settings.coder_name)
            }
            NamePurpose::AddCategory => {
                codebook::add_category(&mut self.store, &submit.name, &self.settings.coder_name)
            }
            NamePurpose::RenameCode(id) => codebook::rename_code(&mut self.store, id, &submit.name),
            NamePurpose::RenameCategory(id) => {
                codebook::rename_category(&mut self.store, id, &submit.name)
            }
        };
        self.report_outcome(outcome);
    }

    fn apply_memo_submit(&mut self, submit: MemoSubmit) {
        match submit.target {
            MemoTarget::Code(id) => {
                let outcome = codebook::set_code_memo(&mut self.store, id, &submit.text);
                self.report_outcome(outcome);
            }
            MemoTarget::Category(id) => {
                let outcome = codebook::set_category_memo(&mut self.store, id, &submit.text);
                self.report_outcome(outcome);
            }
            MemoTarget::Segment(id) => {
                if self
                    .store
                    .update_segment_memo(id, &submit.text, &current_date_string())
                {
                    self.bus.broadcast();
                } else {
                    self.coding.status = "That segment no longer exists".to_string();
                }
            }
            MemoTarget::Annotation {
                file_id,
                start,
                end,
            } => {
                self.store.delete_annotation_at(file_id, start);
                if !submit.text.is_empty() {
                    self.store.insert_annotation(Annotation {
                        id: 0,
                        file_id,
                        start,
                        end,
                        memo: submit.text,
                        owner: self.settings.coder_name.clone(),
                        date: current_date_string(),
                    });
                }
                self.coding.reload_segments(&self.store);
            }
        }
    }

    fn apply_confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteCode(id) => {
                if self.coding.selected_item == Some(TreeItem::Code(id)) {
                    self.coding.selected_item = None;
                }
                let outcome = codebook::delete_code(&mut self.store, id);
                self.report_outcome(outcome);
            }
            ConfirmAction::DeleteCategory(id) => {
                if self.coding.selected_item == Some(TreeItem::Category(id)) {
                    self.coding.selected_item = None;
                }
                let outcome = codebook::delete_category(&mut self.store, id);
                self.report_outcome(outcome);
            }
            ConfirmAction::DeleteSegment(id) => {
                self.store.detach_text_links(id);
                self.store.delete_segment(id);
                self.coding.clicked_segment = None;
                self.bus.broadcast();
            }
            ConfirmAction::MergeCodes {
                code_id,
                onto_code_id,
            } => {
                if self.coding.selected_item == Some(TreeItem::Code(code_id)) {
                    self.coding.selected_item = None;
                }
                let outcome = codebook::merge_codes(&mut self.store, code_id, onto_code_id);
                self.report_outcome(outcome);
            }
        }
    }

    fn apply_time_submit(&mut self, submit: TimeSubmit) {
        let updated = match submit.target {
            TimeEditTarget::SegmentStart(id) => self.store.update_segment_start(id, submit.msecs),
            TimeEditTarget::SegmentEnd(id) => self.store.update_segment_end(id, submit.msecs),
        };
        if updated {
            self.bus.broadcast();
        } else {
            self.coding.status = "That segment no longer exists".to_string();
        }
    }
}

/// Paint coded spans with their code's color and underline annotated spans.
/// Spans hold char offsets, the job wants byte ranges, so the text is walked
/// char by char and equal-format runs are appended in one piece.
fn transcript_layout_job(
    text: &str,
    coded: &[CodedText],
    annotations: &[Annotation],
    code_colors: &[(i64, String)],
) -> LayoutJob {
    let base = TextFormat {
        font_id: FontId::default(),
        color: colors::GRAY_230,
        ..Default::default()
    };

    let mut job = LayoutJob::default();
    let mut run = String::new();
    let mut run_format = base.clone();
    for (idx, c) in text.chars().enumerate() {
        let mut format = base.clone();
        if let Some(row) = coded.iter().find(|r| r.start <= idx && idx < r.end) {
            let color = code_colors
                .iter()
                .find(|(id, _)| *id == row.code_id)
                .map(|(_, hex)| hex.as_str())
                .unwrap_or(colors::FALLBACK_HIGHLIGHT);
            format.background = colors::color_from_hex(color);
            format.color = colors::BLACK;
        }
        if annotations.iter().any(|a| a.start <= idx && idx < a.end) {
            format.underline = Stroke::new(1.0, colors::DARK_YELLOW);
        }
        if format != run_format && !run.is_empty() {
            job.append(&run, 0.0, run_format.clone());
            run.clear();
        }
        run_format = format;
        run.push(c);
    }
    if !run.is_empty() {
        job.append(&run, 0.0, run_format);
    }
    job
}

fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

fn line_of_char_offset(text: &str, offset: usize) -> usize {
    text.chars().take(offset).filter(|&c| c == '\n').count()
}

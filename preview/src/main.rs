//! Desktop preview for the hexstrip engine
//!
//! Pushes generated frames through the engine on the simulated bus and draws
//! the sixteen port lines the way a logic analyzer would.

use std::time::{Duration as StdDuration, Instant as StdInstant};

use eframe::egui::{self};
use hexstrip::sim::{PortEvent, SIM_MAX_WORDS, SimBus, Writer};
use hexstrip::{EdgeTiming, EngineConfig, Error, InterruptSlot, TransferState, init};

/// Lines on the port
const LINES: usize = 16;

/// Largest frame the simulated channels accept
const MAX_WORDS: usize = SIM_MAX_WORDS;

/// Height of one line's waveform in pixels
const LANE_HEIGHT: f32 = 18.0;

/// Gap between waveforms
const LANE_GAP: f32 = 8.0;

/// Room for the line labels
const LABEL_WIDTH: f32 = 44.0;

/// Line rates offered in the selector
const FREQUENCIES: [u32; 4] = [400_000, 800_000, 1_000_000, 2_000_000];

/// Time between animation steps
const STEP_INTERVAL: StdDuration = StdDuration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    /// Binary counter across the port
    Counter,
    /// One line high per tick, walking up
    Walking,
    /// Alternating 0xAAAA / 0x5555
    Checker,
    /// A different byte stream per strip, MSB first like a WS2801 expects
    Bytes,
}

impl Pattern {
    const ALL: [Self; 4] = [Self::Counter, Self::Walking, Self::Checker, Self::Bytes];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Walking => "walking",
            Self::Checker => "checker",
            Self::Bytes => "bytes",
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn word(self, tick: usize, step: usize) -> u16 {
        match self {
            Self::Counter => (tick + step) as u16,
            Self::Walking => 1 << ((tick + step) % LINES),
            Self::Checker => {
                if (tick + step) % 2 == 0 {
                    0xAAAA
                } else {
                    0x5555
                }
            }
            Self::Bytes => {
                let bit = 0x80 >> (tick % 8);
                (0..LINES).fold(0, |word, line| {
                    let byte = (step + line * 17 + tick / 8) as u8;
                    if byte & bit == 0 { word } else { word | 1 << line }
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settings {
    pattern: Pattern,
    words: usize,
    clock_line: u8,
    frequency_hz: u32,
    skip_clear: bool,
}

/// Port activity of one frame.
struct Capture {
    events: Vec<PortEvent>,
    timing: EdgeTiming,
    clock_mask: u16,
    dropped: usize,
}

impl Capture {
    fn idle_word(&self) -> u16 {
        !self.clock_mask
    }

    /// Start of the first edge generator cycle of the frame.
    fn origin_nanos(&self) -> u64 {
        self.events
            .iter()
            .find(|event| event.tick == Some(0))
            .map_or(0, |event| event.at_nanos.saturating_sub(self.timing.edge_a_nanos(0)))
    }

    fn dma_events(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event.writer, Writer::Dma(_)))
            .count()
    }
}

/// Run one frame through a fresh engine and keep what the port saw.
fn capture(settings: &Settings, step: usize) -> Result<Capture, Error> {
    let bus = SimBus::new();
    let state = TransferState::new();
    let slot = InterruptSlot::new();
    let config = EngineConfig::new(
        settings.words * 2,
        1 << settings.clock_line,
        settings.skip_clear,
        settings.frequency_hz,
    );
    let (mut gate, handler) = init(&config, &state, bus.hardware(&slot))?;
    slot.install(handler);
    bus.clear_trace();

    let mut frame: Vec<u16> = (0..settings.words)
        .map(|tick| settings.pattern.word(tick, step))
        .collect();
    gate.show(&mut frame)?;

    Ok(Capture {
        events: bus.with_trace(|events| events.to_vec()),
        timing: *gate.timing(),
        clock_mask: config.clock_mask.bits(),
        dropped: bus.dropped_events(),
    })
}

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 640.0])
            .with_title("Hexstrip Preview"),
        ..Default::default()
    };

    eframe::run_native(
        "hexstrip-preview",
        options,
        Box::new(|_cc| Ok(Box::new(PreviewApp::new()))),
    )
}

struct PreviewApp {
    settings: Settings,
    /// Animation step fed to the pattern
    step: usize,
    playing: bool,
    last_step: StdInstant,
    /// Ticks visible in the waveform
    visible_ticks: usize,
    capture: Result<Capture, Error>,
}

impl PreviewApp {
    fn new() -> Self {
        let settings = Settings {
            pattern: Pattern::Bytes,
            words: 48,
            clock_line: 0,
            frequency_hz: 1_000_000,
            skip_clear: false,
        };
        Self {
            settings,
            step: 0,
            playing: false,
            last_step: StdInstant::now(),
            visible_ticks: 24,
            capture: capture(&settings, 0),
        }
    }

    fn refresh(&mut self) {
        self.capture = capture(&self.settings, self.step);
    }

    fn advance(&mut self) {
        if !self.playing || self.last_step.elapsed() < STEP_INTERVAL {
            return;
        }
        self.last_step = StdInstant::now();
        self.step = self.step.wrapping_add(1);
        self.refresh();
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let before = self.settings;

        ui.horizontal(|ui| {
            if ui.button("⏮ Reset").clicked() {
                self.step = 0;
                self.refresh();
            }
            if ui
                .button(if self.playing { "⏸ Pause" } else { "▶ Play" })
                .clicked()
            {
                self.playing = !self.playing;
            }
            ui.label(format!("Step: {}", self.step));

            ui.add_space(16.0);

            ui.label("Pattern:");
            egui::ComboBox::from_id_salt("pattern_selector")
                .selected_text(self.settings.pattern.as_str())
                .show_ui(ui, |ui| {
                    for pattern in Pattern::ALL {
                        ui.selectable_value(&mut self.settings.pattern, pattern, pattern.as_str());
                    }
                });

            ui.label("Rate:");
            egui::ComboBox::from_id_salt("frequency_selector")
                .selected_text(format!("{} kHz", self.settings.frequency_hz / 1000))
                .show_ui(ui, |ui| {
                    for frequency_hz in FREQUENCIES {
                        ui.selectable_value(
                            &mut self.settings.frequency_hz,
                            frequency_hz,
                            format!("{} kHz", frequency_hz / 1000),
                        );
                    }
                });

            ui.checkbox(&mut self.settings.skip_clear, "Skip clear");
        });

        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.label("Words:");
            ui.add(egui::Slider::new(&mut self.settings.words, 1..=MAX_WORDS).logarithmic(true));
            ui.add_space(8.0);
            ui.label("Clock line:");
            ui.add(egui::Slider::new(&mut self.settings.clock_line, 0..=15));
            ui.add_space(8.0);
            ui.label("Ticks shown:");
            ui.add(egui::Slider::new(&mut self.visible_ticks, 1..=MAX_WORDS).logarithmic(true));
        });

        if self.settings != before {
            self.refresh();
        }
    }

    fn summary(ui: &mut egui::Ui, capture: &Capture) {
        let timing = &capture.timing;
        ui.horizontal(|ui| {
            ui.label(format!("Actual rate: {} Hz", timing.frequency_hz()));
            ui.add_space(12.0);
            ui.label(format!("Data settles {} ns before clock", timing.settle_nanos()));
            ui.add_space(12.0);
            ui.label(format!("Port writes: {}", capture.dma_events()));
            if capture.dropped > 0 {
                ui.add_space(12.0);
                let dropped = format!("{} events dropped", capture.dropped);
                ui.colored_label(egui::Color32::YELLOW, dropped);
            }
        });
    }

    #[allow(clippy::cast_precision_loss)]
    fn waveform(&self, ui: &mut egui::Ui, capture: &Capture) {
        let width = ui.available_width();
        let height = LINES as f32 * (LANE_HEIGHT + LANE_GAP);
        let (response, painter) =
            ui.allocate_painter(egui::vec2(width, height), egui::Sense::hover());
        let rect = response.rect;
        painter.rect_filled(rect, 4.0, egui::Color32::from_gray(20));

        let origin = capture.origin_nanos();
        let span = capture.timing.period_nanos() * self.visible_ticks.max(1) as u64;
        let plot_left = rect.min.x + LABEL_WIDTH;
        let plot_width = (rect.width() - LABEL_WIDTH).max(1.0);
        let x_at = |nanos: u64| {
            let offset = nanos.saturating_sub(origin).min(span);
            plot_left + offset as f32 / span as f32 * plot_width
        };

        // Level changes as (time, word), starting from the idle level.
        let mut steps = vec![(origin, capture.idle_word())];
        steps.extend(capture.events.iter().map(|event| (event.at_nanos, event.level)));
        let end = origin + span;

        for line in 0..LINES {
            let is_clock = capture.clock_mask & (1 << line) != 0;
            let top = rect.min.y + line as f32 * (LANE_HEIGHT + LANE_GAP) + LANE_GAP / 2.0;
            let bottom = top + LANE_HEIGHT;
            let color = if is_clock {
                egui::Color32::from_rgb(255, 160, 60)
            } else {
                egui::Color32::from_rgb(90, 200, 120)
            };

            painter.text(
                egui::pos2(rect.min.x + 6.0, (top + bottom) / 2.0),
                egui::Align2::LEFT_CENTER,
                if is_clock { "CLK".to_owned() } else { format!("D{line}") },
                egui::FontId::monospace(12.0),
                color,
            );
            painter.rect_filled(
                egui::Rect::from_min_max(
                    egui::pos2(plot_left, bottom - 1.0),
                    egui::pos2(rect.max.x, bottom),
                ),
                0.0,
                egui::Color32::from_gray(60),
            );

            for (index, &(start, word)) in steps.iter().enumerate() {
                if word & (1 << line) == 0 || start >= end {
                    continue;
                }
                let stop = steps.get(index + 1).map_or(end, |&(next, _)| next.min(end));
                let (x0, x1) = (x_at(start), x_at(stop));
                painter.rect_filled(
                    egui::Rect::from_min_max(
                        egui::pos2(x0, top),
                        egui::pos2(x1.max(x0 + 1.0), bottom),
                    ),
                    0.0,
                    color,
                );
            }
        }
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance();
        if self.playing {
            ctx.request_repaint();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.controls(ui);
            ui.add_space(8.0);

            match &self.capture {
                Ok(capture) => {
                    Self::summary(ui, capture);
                    ui.add_space(8.0);
                    self.waveform(ui, capture);
                }
                Err(err) => {
                    ui.colored_label(egui::Color32::RED, err.to_string());
                }
            }
        });
    }
}

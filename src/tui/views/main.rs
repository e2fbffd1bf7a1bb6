use gms::MonitorSnapshot;
use gms::state::{
    ProbeOutcome, StatsSnapshot, SubsystemStatus, TraceFailure, TraceStatus, TraceSummary,
};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget};

use crate::prefs::Language;
use crate::tui::strings::{tr, tr_fmt};
use crate::tui::theme::Theme;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const LOST_MARK: char = '×';

/// Values past this are shown as ">999" so table columns keep their width
const MAX_SHOWN_MS: f64 = 999.0;

fn fmt_ms(value: f64) -> String {
    if value > MAX_SHOWN_MS {
        ">999".to_string()
    } else {
        format!("{:.1}", value)
    }
}

/// Truncate a string to max_len characters, adding ellipsis if truncated
fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 1).collect();
        format!("{}…", truncated)
    }
}

/// One character per sample, scaled to the largest latency shown.
/// Lost probes are drawn as `×`.
pub fn latency_sparkline(history: &[Option<f64>], width: usize) -> String {
    let shown = &history[history.len().saturating_sub(width)..];
    let max = shown.iter().flatten().copied().fold(0.0_f64, f64::max);

    shown
        .iter()
        .map(|sample| match *sample {
            None => LOST_MARK,
            Some(_) if max <= 0.0 => SPARK_LEVELS[0],
            Some(ms) => {
                let level = ((ms / max) * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
                SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
            }
        })
        .collect()
}

/// Main monitor view: status, metrics, alerts and the traceroute panel
pub struct MainView<'a> {
    snapshot: &'a MonitorSnapshot,
    theme: &'a Theme,
    lang: Language,
    show_reason: bool,
    admin: bool,
    trace_full: bool,
    trace_scroll: u16,
}

impl<'a> MainView<'a> {
    pub fn new(snapshot: &'a MonitorSnapshot, theme: &'a Theme, lang: Language) -> Self {
        Self {
            snapshot,
            theme,
            lang,
            show_reason: false,
            admin: false,
            trace_full: false,
            trace_scroll: 0,
        }
    }

    pub fn with_reason(mut self, show: bool) -> Self {
        self.show_reason = show;
        self
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_trace(mut self, full: bool, scroll: u16) -> Self {
        self.trace_full = full;
        self.trace_scroll = scroll;
        self
    }

    fn info_row(&self, label_key: &str, value: Span<'a>) -> Line<'a> {
        Line::from(vec![
            Span::styled(
                format!("{:<12}", tr(self.lang, label_key)),
                Style::default().fg(self.theme.text_dim),
            ),
            Span::raw(" "),
            value,
        ])
    }

    fn top_lines(&self) -> Vec<Line<'a>> {
        let s = self.snapshot;
        let lang = self.lang;

        let mut status = format!(
            "{} ({})",
            tr(lang, if s.paused { "STATUS_PAUSED" } else { "STATUS_MONITORING" }),
            s.target_host
        );
        if s.probe_status == SubsystemStatus::Unavailable {
            status.push_str(&format!(" - {}", tr(lang, "STATUS_PROBE_UNAVAILABLE")));
        }
        let status_style = if s.paused || s.probe_status == SubsystemStatus::Unavailable {
            Style::default().fg(self.theme.warning)
        } else {
            Style::default().fg(self.theme.text)
        };

        let ping_now = match s.last_sample.map(|sample| sample.outcome) {
            None => tr(lang, "PING_NOW_VALUE_WAIT").to_string(),
            Some(ProbeOutcome::Success { latency_ms }) => {
                tr_fmt(lang, "PING_NOW_VALUE", &[("ms", fmt_ms(latency_ms))])
            }
            Some(ProbeOutcome::Timeout) => tr(lang, "PING_NOW_VALUE_TIMEOUT").to_string(),
            Some(ProbeOutcome::Error { error }) => tr_fmt(
                lang,
                "PING_NOW_VALUE_ERROR",
                &[("error", format!("{:?}", error).to_lowercase())],
            ),
        };

        let mut lines = vec![
            Line::from(Span::styled(
                tr(lang, "CONTROLS_HINT").to_string(),
                Style::default().fg(self.theme.text_dim),
            )),
            Line::from(""),
            self.info_row("STATUS_LABEL", Span::styled(status, status_style)),
            self.info_row("PING_NOW_LABEL", Span::raw(ping_now)),
            self.info_row(
                "QUALITY_LABEL",
                Span::styled(
                    tr(lang, s.quality.key()).to_string(),
                    Style::default()
                        .fg(self.theme.quality_color(s.quality))
                        .add_modifier(Modifier::BOLD),
                ),
            ),
            self.info_row(
                "WINDOW_LABEL",
                Span::raw(tr_fmt(
                    lang,
                    "WINDOW_VALUE",
                    &[("checks", s.window_size.to_string())],
                )),
            ),
        ];

        if self.show_reason {
            lines.push(Line::from(Span::styled(
                format!("  - {}", tr(lang, s.quality_reason.key())),
                Style::default().fg(self.theme.text_dim),
            )));
        }
        lines
    }

    fn loss_cell(&self, stats: &StatsSnapshot) -> Cell<'a> {
        if stats.is_empty() {
            return Cell::from(tr(self.lang, "VALUE_WAIT").to_string());
        }
        let text = tr_fmt(
            self.lang,
            "LOSS_VALUE",
            &[
                ("loss", format!("{:.1}", stats.loss_pct)),
                ("lost", stats.loss_count.to_string()),
                ("count", stats.count.to_string()),
            ],
        );
        Cell::from(text).style(Style::default().fg(self.theme.loss_color(stats.loss_pct)))
    }

    fn ping_cell(&self, stats: &StatsSnapshot) -> Cell<'a> {
        match (stats.min_ms, stats.avg_ms, stats.max_ms) {
            (Some(min), Some(avg), Some(max)) => Cell::from(tr_fmt(
                self.lang,
                "PING_VALUE",
                &[("min", fmt_ms(min)), ("avg", fmt_ms(avg)), ("max", fmt_ms(max))],
            )),
            _ => Cell::from(tr(self.lang, "VALUE_WAIT").to_string()),
        }
    }

    fn jitter_cell(&self, stats: &StatsSnapshot) -> Cell<'a> {
        match stats.jitter_ms {
            Some(jitter) => Cell::from(tr_fmt(self.lang, "JITTER_VALUE", &[("jitter", fmt_ms(jitter))])),
            None => Cell::from(tr(self.lang, "VALUE_WAIT").to_string()),
        }
    }

    fn metrics_table(&self) -> Table<'a> {
        let s = self.snapshot;
        let lang = self.lang;
        let bold = Style::default().bold();

        let header = Row::new(vec![
            Cell::from(tr(lang, "METRIC_LABEL").to_string()).style(bold),
            Cell::from(tr(lang, "METRIC_WINDOW").to_string()).style(bold),
            Cell::from(tr(lang, "METRIC_SESSION").to_string()).style(bold),
        ]);

        let label = |key: &str| Cell::from(tr(lang, key).to_string());
        let rows = vec![
            Row::new(vec![
                label("METRIC_LOSS_LABEL"),
                self.loss_cell(&s.recent),
                self.loss_cell(&s.session),
            ]),
            Row::new(vec![
                label("METRIC_PING_LABEL"),
                self.ping_cell(&s.recent),
                self.ping_cell(&s.session),
            ]),
            Row::new(vec![
                label("METRIC_JITTER_LABEL"),
                self.jitter_cell(&s.recent),
                self.jitter_cell(&s.session),
            ]),
        ];

        Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Percentage(46),
                Constraint::Percentage(46),
            ],
        )
        .header(header)
    }

    fn history_line(&self, width: u16) -> Line<'a> {
        let label = format!("{:<12} ", tr(self.lang, "HISTORY_LABEL"));
        let room = (width as usize).saturating_sub(label.chars().count());
        let spark = latency_sparkline(&self.snapshot.history, room);

        let mut spans = vec![Span::styled(label, Style::default().fg(self.theme.text_dim))];
        spans.extend(spark.chars().map(|c| {
            let color = if c == LOST_MARK { self.theme.error } else { self.theme.success };
            Span::styled(c.to_string(), Style::default().fg(color))
        }));
        Line::from(spans)
    }

    fn alert_lines(&self) -> Vec<Line<'a>> {
        let s = self.snapshot;
        let lang = self.lang;
        let mut lines = Vec::new();

        if self.admin {
            let short = &s.short_term;
            let short_text = if short.is_empty() {
                tr(lang, "SHORT_LOSS_WAIT").to_string()
            } else {
                tr_fmt(
                    lang,
                    "SHORT_LOSS_VALUE",
                    &[
                        ("count", short.count.to_string()),
                        ("loss", format!("{:.1}", short.loss_pct)),
                        ("lost", short.loss_count.to_string()),
                    ],
                )
            };
            lines.push(Line::from(Span::styled(
                short_text,
                Style::default().fg(self.theme.loss_color(short.loss_pct)),
            )));

            let session = &s.session;
            let long_text = if session.is_empty() {
                tr(lang, "LONG_LOSS_WAIT").to_string()
            } else {
                tr_fmt(
                    lang,
                    "LONG_LOSS_VALUE",
                    &[
                        ("count", session.count.to_string()),
                        ("loss", format!("{:.1}", session.loss_pct)),
                        ("lost", session.loss_count.to_string()),
                        ("total", s.total_probes.to_string()),
                    ],
                )
            };
            lines.push(Line::from(Span::styled(
                long_text,
                Style::default().fg(self.theme.text_dim),
            )));
        }

        if let Some(alert) = s.alert {
            lines.push(Line::from(Span::styled(
                format!("! {}", tr(lang, alert.key())),
                Style::default().fg(self.theme.error).add_modifier(Modifier::BOLD),
            )));
        }
        lines
    }

    fn failure_text(&self, failure: &TraceFailure) -> String {
        let lang = self.lang;
        match failure {
            TraceFailure::Spawn { message } => {
                tr_fmt(lang, "TRACE_UNAVAILABLE", &[("error", message.clone())])
            }
            TraceFailure::Exit { code, stderr } => {
                let code = code.map_or_else(|| "?".to_string(), |c| c.to_string());
                let mut text = tr_fmt(lang, "TRACE_EXIT", &[("code", code)]);
                if let Some(first) = stderr.lines().find(|l| !l.trim().is_empty()) {
                    text.push_str(": ");
                    text.push_str(first.trim());
                }
                text
            }
            TraceFailure::TimedOut => tr(lang, "TRACE_TIMED_OUT").to_string(),
            TraceFailure::Io { message } => message.clone(),
        }
    }

    fn trace_lines(&self) -> Vec<Line<'a>> {
        let trace = &self.snapshot.trace;
        let lang = self.lang;

        let status_key = match trace.status {
            TraceStatus::Idle => "TRACE_IDLE",
            TraceStatus::Running => "TRACE_RUNNING",
            TraceStatus::Done => "TRACE_DONE",
            TraceStatus::Failed => "TRACE_FAILED",
            TraceStatus::Cancelled => "TRACE_CANCELLED",
        };
        let status_color = match trace.status {
            TraceStatus::Failed => self.theme.error,
            TraceStatus::Running => self.theme.warning,
            _ => self.theme.text,
        };
        let mode_key = if self.trace_full { "TRACE_FULL" } else { "TRACE_SUMMARY_MODE" };

        let mut header = vec![
            Span::styled(
                format!("{}: ", tr(lang, "TRACE_LABEL")),
                Style::default().fg(self.theme.header).bold(),
            ),
            Span::styled(tr(lang, status_key).to_string(), Style::default().fg(status_color)),
            Span::styled(
                format!(" [{}]", tr(lang, mode_key)),
                Style::default().fg(self.theme.text_dim),
            ),
        ];
        if let Some(started) = trace.started_at {
            header.push(Span::styled(
                format!("  {}", started.format("%H:%M:%S")),
                Style::default().fg(self.theme.text_dim),
            ));
        }

        let mut lines = vec![Line::from(header)];
        if let Some(ref failure) = trace.failure {
            lines.push(Line::from(Span::styled(
                self.failure_text(failure),
                Style::default().fg(self.theme.error),
            )));
        }

        if trace.status == TraceStatus::Idle {
            return lines;
        }

        lines.push(Line::from(Span::styled(
            tr(lang, "TRACE_HINT").to_string(),
            Style::default().fg(self.theme.text_dim),
        )));

        if !self.trace_full {
            let summary = &trace.summary;
            lines.push(Line::from(tr_fmt(
                lang,
                "TRACE_SUMMARY",
                &[
                    ("hops", summary.hop_count.to_string()),
                    ("timeouts", summary.timeout_count.to_string()),
                    ("max", summary.max_rtt_ms.map_or_else(|| "-".to_string(), fmt_ms)),
                ],
            )));

            let timeout_hops = TraceSummary::timeout_hops(&trace.hops);
            let text = if timeout_hops.is_empty() {
                tr(lang, "TRACE_NO_TIMEOUTS").to_string()
            } else {
                let list: Vec<String> = timeout_hops.iter().map(u8::to_string).collect();
                tr_fmt(lang, "TRACE_TIMEOUT_HOPS", &[("hops", list.join(", "))])
            };
            lines.push(Line::from(text));
            return lines;
        }

        for hop in &trace.hops {
            let host = match (&hop.host, &hop.address) {
                (Some(host), Some(addr)) if host != addr => format!("{} ({})", host, addr),
                (Some(host), _) => host.clone(),
                (None, Some(addr)) => addr.clone(),
                (None, None) => "* * *".to_string(),
            };
            let rtts = if hop.rtts.is_empty() {
                "*".to_string()
            } else {
                hop.rtts.iter().map(|r| format!("{} ms", fmt_ms(*r))).collect::<Vec<_>>().join("  ")
            };
            let rtt_style = if hop.is_timeout() {
                Style::default().fg(self.theme.error)
            } else {
                Style::default().fg(self.theme.text)
            };

            lines.push(Line::from(vec![
                Span::styled(format!("{:>3}  ", hop.hop_index), Style::default().fg(self.theme.text_dim)),
                Span::raw(format!("{:<44} ", truncate_with_ellipsis(&host, 44))),
                Span::styled(rtts, rtt_style),
            ]));
        }
        lines
    }
}

impl Widget for MainView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.snapshot;
        let paused = if s.paused { " [PAUSED]" } else { "" };
        let title = format!(
            "gms \u{2500}\u{2500} {} \u{2500}\u{2500} {} probes{}",
            s.target_host, s.total_probes, paused
        );

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));

        let inner = block.inner(area);
        block.render(area, buf);

        let top = self.top_lines();
        let alerts = self.alert_lines();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(top.len() as u16),
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Length(alerts.len() as u16),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(inner);

        Paragraph::new(top).render(chunks[0], buf);
        self.metrics_table().render(chunks[2], buf);
        Paragraph::new(self.history_line(chunks[3].width)).render(chunks[3], buf);
        Paragraph::new(alerts).render(chunks[4], buf);

        let scroll = if self.trace_full { self.trace_scroll } else { 0 };
        Paragraph::new(self.trace_lines())
            .scroll((scroll, 0))
            .render(chunks[6], buf);
    }
}

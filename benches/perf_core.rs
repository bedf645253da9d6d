use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ratatui::backend::TestBackend;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Terminal;
use std::path::Path;
use tartex_runner::classify::{self, RuleTable, RuleTableSpec};
use tartex_runner::search::{search_filter, FilterState, SeverityFilter};
use tartex_runner::ui::helpers::highlight_spans;

/// A noisy latexmk failure: mostly chatter, some warnings, a few errors.
fn synthetic_output(lines: usize) -> String {
    let mut out = String::with_capacity(lines * 64);
    out.push_str("INFO     Running latexmk on main.tex\n");
    for i in 0..lines {
        match i % 40 {
            0 => out.push_str(&format!("! Undefined control sequence \\fig{i}.\n")),
            1 => out.push_str(&format!("l.{} \\includegraphics{{figure_{i}}}\n", i + 10)),
            7 | 19 => out.push_str(&format!(
                "LaTeX Warning: Reference `sec:{i}' on page 3 undefined on input line {}.\n",
                i + 3
            )),
            23 => out.push_str(&format!("Overfull \\hbox (1.{i}pt too wide) in paragraph\n")),
            _ => out.push_str(&format!("(./chapters/part_{:03}.tex [{}])\n", i % 120, i)),
        }
    }
    out.push_str("ERROR    Latexmk failed, see main.log\n");
    out
}

fn bench_classify(c: &mut Criterion) {
    let rules = RuleTable::compile(&RuleTableSpec::default()).expect("default rules compile");
    let output = synthetic_output(20_000);
    let log = Path::new("main.log");

    c.bench_function("classify_20k_lines", |b| {
        b.iter(|| {
            let classified = classify::classify(black_box(&output), Some(log), &rules);
            black_box(classified.records.len());
        });
    });
}

fn bench_search_filter(c: &mut Criterion) {
    let rules = RuleTable::compile(&RuleTableSpec::default()).expect("default rules compile");
    let records = classify::classify(&synthetic_output(20_000), None, &rules).records;

    let by_term = FilterState::new(SeverityFilter::All, "Figure_1");
    c.bench_function("search_filter_term", |b| {
        b.iter(|| black_box(search_filter(&records, black_box(&by_term)).match_count()));
    });

    let errors = FilterState::new(SeverityFilter::ErrorsOnly, "");
    c.bench_function("search_filter_errors_only", |b| {
        b.iter(|| black_box(search_filter(&records, black_box(&errors)).len()));
    });
}

fn bench_render_failure_list(c: &mut Criterion) {
    let rules = RuleTable::compile(&RuleTableSpec::default()).expect("default rules compile");
    let records = classify::classify(&synthetic_output(4_000), None, &rules).records;
    let filter = FilterState::new(SeverityFilter::All, "sec");

    let backend = TestBackend::new(140, 42);
    let mut terminal = Terminal::new(backend).expect("terminal should initialize");

    c.bench_function("render_highlighted_rows", |b| {
        b.iter(|| {
            let view = search_filter(&records, &filter);
            terminal
                .draw(|frame| {
                    let lines: Vec<Line> = view
                        .visible
                        .iter()
                        .take(frame.area().height as usize)
                        .map(|v| {
                            let record = &records[v.index];
                            Line::from(highlight_spans(
                                record.display_text(),
                                &v.spans,
                                Style::default(),
                            ))
                        })
                        .collect();
                    frame.render_widget(Paragraph::new(lines), frame.area());
                })
                .expect("draw should succeed");
        });
    });
}

criterion_group!(
    perf_core,
    bench_classify,
    bench_search_filter,
    bench_render_failure_list
);
criterion_main!(perf_core);

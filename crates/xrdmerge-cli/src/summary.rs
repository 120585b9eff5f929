use std::path::Path;

use console::Style;
use xrdmerge_core::io::naming::FileSelection;
use xrdmerge_core::pipeline::config::MergeConfig;
use xrdmerge_core::pipeline::MergeReport;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_merge_summary(config: &MergeConfig) {
    let s = Styles::new();
    let input = &config.input;

    println!();
    println!("  {}", s.title.apply_to("xrdmerge"));
    println!("  {}", s.title.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input.directory.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Files"),
        s.value.apply_to(format!(
            "{}{}*.{}",
            input.basename,
            input.separator.map(String::from).unwrap_or_else(|| "?".into()),
            input.extension
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.directory.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Selection"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Numbers"),
        s.value.apply_to(describe_selection(&config.selection))
    );
    if !config.selection.exclude.is_empty() {
        println!(
            "    {:<12}{:?}",
            s.label.apply_to("Exclude"),
            config.selection.exclude
        );
    }
    if !config.selection.include.is_empty() {
        println!(
            "    {:<12}{:?}",
            s.label.apply_to("Include"),
            config.selection.include
        );
    }
    if let Some(ref dataset) = config.dataset.path {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Dataset"),
            s.value.apply_to(dataset)
        );
    }
    if config.dataset.start.is_some() || config.dataset.end.is_some() {
        let end = |v: Option<usize>, fallback: &str| {
            v.map(|n| n.to_string()).unwrap_or_else(|| fallback.to_string())
        };
        println!(
            "    {:<12}{}",
            s.label.apply_to("Frames"),
            s.value.apply_to(format!(
                "{} -> {}",
                end(config.dataset.start, "first"),
                end(config.dataset.end, "last")
            ))
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Merge"));
    match config.window {
        Some(w) => println!(
            "    {:<12}{}",
            s.label.apply_to("Window"),
            s.method.apply_to(format!("{w} frames"))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Window"),
            s.disabled.apply_to("whole range")
        ),
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Format"),
        s.method.apply_to(config.output.resolved_format())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Compress"),
        if config.output.compress {
            s.value.apply_to(format!("deflate {}", config.output.deflate_level))
        } else {
            s.disabled.apply_to("off".to_string())
        }
    );
    println!();
}

fn describe_selection(selection: &FileSelection) -> String {
    if !selection.list.is_empty() {
        return format!("{:?}", selection.list);
    }
    match (selection.start, selection.finish, selection.count) {
        (Some(s), Some(f), _) => format!("{s}..={f}"),
        (Some(s), None, Some(n)) => format!("{n} from {s}"),
        (None, Some(f), Some(n)) => format!("{n} up to {f}"),
        _ => "unspecified".to_string(),
    }
}

pub fn print_merge_report(report: &MergeReport) {
    let s = Styles::new();
    let (rows, columns) = report.frame_shape;

    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Merged"),
        s.value.apply_to(format!(
            "{} frames of {columns}x{rows}",
            report.frames_merged
        ))
    );
    if let Some(windows) = report.windows {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Windows"),
            s.value.apply_to(windows)
        );
    }
    print_saved(&report.output);
}

pub fn print_render_line(input: &Path, output: &Path, limits: (f64, f64)) {
    let s = Styles::new();
    println!(
        "  {} {} {}",
        s.path.apply_to(input.display()),
        s.label.apply_to(format!("[{:.1}, {:.1}] ->", limits.0, limits.1)),
        s.path.apply_to(output.display())
    );
}

pub fn print_saved(path: &Path) {
    let s = Styles::new();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Saved to"),
        s.path.apply_to(path.display())
    );
}

use crate::ui::Renderer;
use crate::ui::icons::{CHECK, RESULT, ROLE, SPARKLE, TOOL, WARN};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal UI for the topicsmith pipeline, rendered via `indicatif`.
///
/// Two bars are stacked vertically:
/// - Stage bar — tracks how many pipeline stages have completed
/// - Status bar — spinner with the live activity of the current Exchange
///
/// Everything else (role banners, content blocks, tool activity) is printed
/// as discrete lines through `MultiProgress` so it interleaves cleanly with
/// the bars.
pub struct ConsoleRenderer {
    multi: MultiProgress,
    stage_bar: ProgressBar,
    status_bar: ProgressBar,
    verbose: bool,
}

/// Per-role accent colour for banners, matching the role set.
fn role_style(role: &str) -> console::Style {
    match role {
        "Clarifier" => console::Style::new().yellow().bold(),
        "Analyst" => console::Style::new().green().bold(),
        "Critic" => console::Style::new().magenta().bold(),
        "Writer" => console::Style::new().blue().bold(),
        _ => console::Style::new().white().bold(),
    }
}

impl ConsoleRenderer {
    /// Create the UI and add both progress bars to the multiplex renderer.
    ///
    /// `total_stages` sizes the stage bar; call this once before the
    /// pipeline starts.
    pub fn new(total_stages: u64, verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let stage_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let stage_bar = multi.add(ProgressBar::new(total_stages));
        stage_bar.set_style(stage_style);
        stage_bar.set_prefix("Stages");

        let status_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(status_style);
        status_bar.set_prefix(" Stage");
        status_bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            stage_bar,
            status_bar,
            verbose,
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the
    /// rich UI fails. Prevents silent loss of warnings when stdout is
    /// unavailable.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Stop both bars; call once after the pipeline finishes.
    pub fn finish(&self) {
        self.status_bar.finish_and_clear();
        self.stage_bar.finish_and_clear();
    }
}

impl Renderer for ConsoleRenderer {
    fn role_banner(&self, role: &str) {
        let accent = role_style(role);
        self.print_line("");
        self.print_line(format!(
            "{} {}",
            ROLE,
            accent.apply_to(format!("── {} ──", role))
        ));
    }

    fn content(&self, text: &str) {
        for line in text.lines() {
            self.print_line(format!("  {}", line));
        }
    }

    fn tool_call(&self, name: &str, arguments: &str) {
        self.status_bar
            .set_message(crate::stream::describe_tool_call(name, arguments));
        self.print_line(format!(
            "    {}{} {}",
            TOOL,
            style(name).cyan().bold(),
            style(arguments).dim()
        ));
    }

    fn tool_result(&self, content: &str) {
        // First line inline, the rest only in verbose mode
        let mut lines = content.lines();
        if let Some(first) = lines.next() {
            self.print_line(format!("    {}{}", RESULT, style(first).green()));
        }
        if self.verbose {
            for line in lines {
                self.print_line(format!("       {}", style(line).dim()));
            }
        }
    }

    fn phase_header(&self, index: usize, total: usize, title: &str) {
        self.print_line("");
        self.print_line(format!("{}", style("═".repeat(70)).cyan()));
        self.print_line(format!(
            "{} Stage {}/{}: {}",
            style("▶").green().bold(),
            style(index).yellow().bold(),
            total,
            title
        ));
        self.print_line(format!("{}", style("═".repeat(70)).cyan()));
        self.stage_bar.set_message(title.to_string());
    }

    fn status(&self, msg: &str) {
        self.status_bar.set_message(msg.to_string());
        if self.verbose {
            self.print_line(format!("    {} {}", style("→").dim(), style(msg).dim()));
        }
    }

    fn note(&self, msg: &str) {
        self.print_line(msg.to_string());
    }

    fn warning(&self, msg: &str) {
        self.print_line(format!("  {}{}", WARN, style(msg).red()));
    }

    fn success(&self, msg: &str) {
        self.stage_bar.inc(1);
        self.print_line(format!("  {}{}", CHECK, style(msg).green().bold()));
    }
}

/// Print the end-of-run banner outside the progress bars.
pub fn print_run_complete(path_display: &str) {
    println!();
    println!("{}", style("═".repeat(70)).cyan());
    println!(
        "{} Strategy document complete: {}",
        SPARKLE,
        style(path_display).green().bold()
    );
    println!("{}", style("═".repeat(70)).cyan());
}

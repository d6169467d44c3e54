use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static HOUSE: Emoji<'_, '_> = Emoji("🏠 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_step(step: &str) {
    println!("\n{} {}", SPARKLE, style(step).bold());
}

pub fn print_banner() {
    let lines: &[&str] = &[
        "                     _       ",
        "   __ _  _ __   | |_  ___ ",
        "  / _` || '_ \\  | __|/ __|",
        " | (_| || |_) | | |_ \\__ \\",
        "  \\__,_|| .__/   \\__||___/",
        "        |_|               ",
    ];

    // Gradient: #f97316 -> #facc15 -> #22c55e (top-left to bottom-right)
    let stops: [(u8, u8, u8); 3] = [(249, 115, 22), (250, 204, 21), (34, 197, 94)];
    let max_w = 27u32;
    let max_d = max_w + 5 * 10;

    println!();
    for (y, line) in lines.iter().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            if ch == ' ' {
                print!(" ");
                continue;
            }
            let d = ((x as u32 + y as u32 * 10) * 1000 / max_d).min(1000);
            let (r, g, b) = if d <= 500 {
                lerp_color(stops[0], stops[1], d * 2)
            } else {
                lerp_color(stops[1], stops[2], (d - 500) * 2)
            };
            print!("\x1b[38;2;{};{};{}m{}", r, g, b, ch);
        }
        println!();
    }
    print!("\x1b[0m");

    println!("\x1b[38;2;34;197;94mKnow the moment a unit opens up.\x1b[0m\n");
}

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: u32) -> (u8, u8, u8) {
    let r = (a.0 as u32 * (1000 - t) + b.0 as u32 * t) / 1000;
    let g = (a.1 as u32 * (1000 - t) + b.1 as u32 * t) / 1000;
    let b_val = (a.2 as u32 * (1000 - t) + b.2 as u32 * t) / 1000;
    (r as u8, g as u8, b_val as u8)
}

pub fn print_goodbye() {
    println!(
        "\n{} {}",
        HOUSE,
        style("Happy hunting. See you next time!").bold().cyan()
    );
}

/// A titled block of aligned rows, printed in one go.
///
/// Used for the help screen and for the summaries the wizard and server
/// print once they are done.
#[derive(Debug, Default)]
pub struct GuideSection {
    title: String,
    rows: Vec<String>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.rows.push(format!(
            "  {:<18} {}",
            style(name).green().bold(),
            style(description).dim()
        ));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.rows
            .push(format!("  {} {}: {}", GEAR, style(label).bold().cyan(), value));
        self
    }

    pub fn text(mut self, line: &str) -> Self {
        self.rows.push(format!("  {}", line));
        self
    }

    pub fn info(mut self, line: &str) -> Self {
        self.rows.push(format!("  {} {}", INFO_ICON, style(line).blue()));
        self
    }

    pub fn warn(mut self, line: &str) -> Self {
        self.rows.push(format!("  {} {}", WARN_ICON, style(line).yellow()));
        self
    }

    pub fn print(&self) {
        println!("\n {}", style(&self.title).bold().underlined());
        for row in &self.rows {
            println!("{}", row);
        }
    }
}

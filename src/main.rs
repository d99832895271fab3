//! conio-demo - Tour of the conio primitives
//!
//! Two demonstrations, selected on the command line:
//!
//! - **ascii**: title bar, colored text, colored characters, a box, the
//!   console dimensions and a bouncing ball
//! - **unicode**: symbols, box drawing, several scripts and a progress bar
//!
//! # Usage
//!
//! ```text
//! conio-demo                    # ASCII demo
//! conio-demo unicode            # Unicode demo
//! conio-demo -c conio.toml      # Load settings from a file
//! ```
//!
//! Logs go to the file named in the configuration (`conio.log` by default),
//! never to the terminal under control.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use conio::{cprintf, select_backend, Backend, Color, Config, Console, Placement};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq)]
enum Demo {
    Ascii,
    Unicode,
}

struct Args {
    demo: Demo,
    config_path: Option<PathBuf>,
}

fn print_help() {
    eprintln!("conio-demo {} - Console I/O demonstration", VERSION);
    eprintln!();
    eprintln!("Usage: conio-demo [DEMO] [OPTIONS]");
    eprintln!();
    eprintln!("Demos:");
    eprintln!("  ascii                 Colors, boxes and a bouncing ball (default)");
    eprintln!("  unicode               Symbols, box drawing and scripts");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <FILE>   Load settings from a TOML file");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CONIO_LOG             Log filter, overrides [log] level");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        demo: Demo::Ascii,
        config_path: None,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                println!("conio-demo {}", VERSION);
                std::process::exit(0);
            }
            "ascii" => parsed.demo = Demo::Ascii,
            "unicode" => parsed.demo = Demo::Unicode,
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config file argument".to_string());
                }
                parsed.config_path = Some(PathBuf::from(&args[i]));
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn init_logging(config: &Config) {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log.file)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("CONIO_LOG")
            .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

type DemoConsole = Console<Box<dyn Backend>>;

/// Title bar, spanning the given width.
fn title(con: &mut DemoConsole, text: &str, width: u16) -> conio::Result<()> {
    let line = format!("{:^width$}", text, width = width.max(text.len() as u16) as usize);
    con.print_utf8_at_colors(0, 0, Color::BrightYellow, Color::Blue, &line)?;
    con.resetattr()
}

/// Wait for a key on the second to last row, then clear.
fn finish(con: &mut DemoConsole) -> conio::Result<()> {
    let height = con.getheight()?;
    con.showcursor(true)?;
    con.printf_at_fg(
        2,
        height.saturating_sub(2),
        Color::BrightWhite,
        format_args!("Press any key to exit..."),
    )?;
    con.resetattr()?;
    con.getch()?;
    con.clrscr()?;
    con.gotoxy(0, 0)
}

fn ascii_demo(con: &mut DemoConsole) -> conio::Result<()> {
    con.clrscr()?;
    con.showcursor(false)?;
    let width = con.getwidth()?;
    let height = con.getheight()?;

    title(con, "CONIO Library Demo", width.min(58))?;

    con.gotoxy(2, 2)?;
    cprintf!(con, "1. Basic text output at position (2, 2)")?;

    let lines = [
        (Color::Green, "2. Green colored text"),
        (Color::Red, "3. Red colored text"),
        (Color::BrightCyan, "4. Bright cyan colored text"),
    ];
    for (row, (color, text)) in (4..).zip(lines) {
        con.gotoxy(2, row)?;
        con.set_foreground(color)?;
        con.print_utf8(text)?;
    }
    con.resetattr()?;

    con.printf_at_fg(
        2,
        8,
        Color::BrightMagenta,
        format_args!("5. Printf with x, y, and color parameters"),
    )?;
    cprintf!(
        con,
        at: Placement::at(2, 9).colors(Color::Yellow, Color::Red),
        "6. Text with yellow fg and red bg"
    )?;
    con.resetattr()?;

    con.gotoxy(2, 11)?;
    cprintf!(con, "7. Character output: ")?;
    for b in b'A'..=b'Z' {
        con.putch(b)?;
    }

    con.gotoxy(2, 13)?;
    cprintf!(con, "8. Colored characters:")?;
    let stars = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];
    let mut x = 2;
    for color in stars {
        con.putch_at_fg(x, 14, color, b'*')?;
        x += 2;
    }
    let hashes = [
        Color::BrightRed,
        Color::BrightGreen,
        Color::BrightBlue,
        Color::BrightYellow,
    ];
    for color in hashes {
        con.putch_at_colors(x, 14, color, Color::Black, b'#')?;
        x += 2;
    }
    con.resetattr()?;

    con.gotoxy(2, 16)?;
    cprintf!(con, "9. Drawing a simple box:")?;
    draw_ascii_box(con, 2, 17, 40, 5)?;
    con.printf_at_fg(10, 19, Color::BrightGreen, format_args!("Console I/O is awesome!"))?;
    con.resetattr()?;

    cprintf!(
        con,
        at: Placement::at(2, 23),
        "10. Console dimensions: {}x{}",
        width,
        height
    )?;

    con.printf_at_fg(
        2,
        25,
        Color::BrightYellow,
        format_args!("11. Animated bouncing ball (5 seconds)..."),
    )?;
    con.resetattr()?;
    bounce(con, width, height)?;

    finish(con)
}

fn draw_ascii_box(con: &mut DemoConsole, x: u16, y: u16, w: u16, h: u16) -> conio::Result<()> {
    con.set_foreground(Color::BrightWhite)?;
    for col in x..x + w {
        con.putch_at(col, y, b'-')?;
        con.putch_at(col, y + h - 1, b'-')?;
    }
    for row in y..y + h {
        con.putch_at(x, row, b'|')?;
        con.putch_at(x + w - 1, row, b'|')?;
    }
    for (cx, cy) in [(x, y), (x + w - 1, y), (x, y + h - 1), (x + w - 1, y + h - 1)] {
        con.putch_at(cx, cy, b'+')?;
    }
    Ok(())
}

/// Bounce a ball below row 26 for five seconds, or until a key is pressed.
fn bounce(con: &mut DemoConsole, width: u16, height: u16) -> conio::Result<()> {
    const TOP: i32 = 26;
    let max_x = width as i32 - 2;
    let max_y = height as i32 - 3;
    if max_x <= 1 || max_y <= TOP + 1 {
        info!("Terminal too small for the ball ({}x{})", width, height);
        return Ok(());
    }

    let (mut bx, mut by) = (5_i32.min(max_x - 1), (TOP + 1).min(max_y - 1));
    let (mut dx, mut dy) = (1, 1);
    let start = Instant::now();

    while start.elapsed() < Duration::from_secs(5) {
        if con.kbhit()? {
            // Consume it so the exit prompt still waits.
            con.getch()?;
            break;
        }
        con.putch_at(bx as u16, by as u16, b' ')?;
        bx += dx;
        by += dy;
        if bx <= 0 || bx >= max_x {
            dx = -dx;
        }
        if by <= TOP || by >= max_y {
            dy = -dy;
        }
        con.putch_at_fg(bx as u16, by as u16, Color::BrightRed, b'O')?;
        thread::sleep(Duration::from_millis(50));
    }

    con.putch_at(bx as u16, by as u16, b' ')?;
    con.resetattr()
}

fn unicode_demo(con: &mut DemoConsole) -> conio::Result<()> {
    con.clrscr()?;
    con.showcursor(false)?;
    let width = con.getwidth()?;
    title(con, "Unicode Console Demo ✨", width.min(52))?;

    con.print_utf8_at(2, 2, "1. UTF-8 Symbols:")?;
    con.print_utf8_at(4, 3, " 🌟 Stars  🎨 Art  🚀 Rocket  💻 Computer  ✅ Check")?;
    con.gotoxy(4, 4)?;
    con.print_utf8_fg(Color::BrightRed, "  ❤ Heart  ")?;
    con.print_utf8_fg(Color::BrightGreen, "💚 Green  ")?;
    con.print_utf8_fg(Color::BrightBlue, "🦀💙 Blue")?;
    con.resetattr()?;

    con.print_utf8_at(2, 6, "2. Unicode Box Drawing:")?;
    draw_unicode_box(con, 4, 7, 30, 5)?;
    con.print_utf8_at_fg(9, 9, Color::BrightWhite, "Unicode ♥ Console!")?;
    con.resetattr()?;

    con.print_utf8_at(2, 13, "3. Mathematical Symbols:")?;
    con.print_utf8_at(4, 14, "   π ≈ 3.14159  ∑ ∫ ∞ √ ∂ ∇ ≠ ≤ ≥ ± × ÷")?;

    con.print_utf8_at(2, 16, "4. Greek Letters:")?;
    con.print_utf8_at(4, 17, "   α β γ δ ε ζ η θ ι κ λ μ ν ξ ο π ρ σ τ υ φ χ ψ ω")?;
    con.print_utf8_at(4, 18, "   Α Β Γ Δ Ε Ζ Η Θ Ι Κ Λ Μ Ν Ξ Ο Π Ρ Σ Τ Υ Φ Χ Ψ Ω")?;

    con.print_utf8_at(2, 20, "5. Multiple Languages:")?;
    let greetings = [
        (Color::BrightGreen, "English: Hello World!"),
        (Color::BrightYellow, "Spanish: ¡Hola Mundo!"),
        (Color::BrightCyan, "French: Bonjour le monde!"),
        (Color::BrightMagenta, "German: Hallo Welt!"),
        (Color::BrightRed, "Russian: Привет мир!"),
        (Color::BrightBlue, "Japanese: こんにちは世界！"),
        (Color::BrightWhite, "Chinese: 你好世界！"),
        (Color::BrightGreen, "Korean: 안녕하세요 세계!"),
    ];
    for (row, (color, text)) in (21..).zip(greetings) {
        con.print_utf8_at_fg(7, row, color, text)?;
    }
    con.resetattr()?;

    con.print_utf8_at(2, 30, "6. Unicode Progress Bar:")?;
    con.set_foreground(Color::BrightCyan)?;
    for i in 0..=20 {
        con.putwch_at(4 + i, 31, '▓')?;
        thread::sleep(Duration::from_millis(100));
    }
    con.print_utf8_at(26, 31, " ✓ Complete!")?;
    con.resetattr()?;

    finish(con)
}

fn draw_unicode_box(con: &mut DemoConsole, x: u16, y: u16, w: u16, h: u16) -> conio::Result<()> {
    con.set_foreground(Color::BrightCyan)?;
    let inner = "═".repeat((w - 2) as usize);
    con.print_utf8_at(x, y, &format!("╔{}╗", inner))?;
    for row in y + 1..y + h - 1 {
        con.putwch_at(x, row, '║')?;
        con.putwch_at(x + w - 1, row, '║')?;
    }
    con.print_utf8_at(x, y + h - 1, &format!("╚{}╝", inner))
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let config = match &args.config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    init_logging(&config);
    info!("conio-demo {} starting ({:?} demo)", VERSION, args.demo);

    let backend = select_backend(&config).context("selecting console backend")?;
    let mut con = Console::with_config(backend, config);
    con.init().context("initializing console")?;

    let result = match args.demo {
        Demo::Ascii => ascii_demo(&mut con),
        Demo::Unicode => unicode_demo(&mut con),
    };

    // Restore the terminal before reporting anything.
    let restored = con.cleanup();
    result.context("running demo")?;
    restored.context("restoring console")?;

    info!("conio-demo finished");
    Ok(())
}

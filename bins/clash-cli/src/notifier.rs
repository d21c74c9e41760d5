// Terminal rendering of execution notices
use async_trait::async_trait;
use clash_engine::{Notice, NoticeLevel, Notifier};
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

const CONFETTI: &[char] = &['*', '+', 'o', '.', '~', '^'];
const COLORS: &[u8] = &[31, 32, 33, 34, 35, 36];
const FRAME: Duration = Duration::from_millis(120);
const WIDTH: usize = 48;

pub struct TerminalNotifier {
    color: bool,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self {
            color: io::stdout().is_terminal(),
        }
    }
}

fn icon(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "✅",
        NoticeLevel::Info => "ℹ️ ",
        NoticeLevel::Warning => "⚠️ ",
        NoticeLevel::Error => "❌",
    }
}

fn format_notice(notice: &Notice) -> String {
    let mut text = format!("{} {}", icon(notice.level), notice.title);
    for line in notice.body.lines() {
        text.push_str("\n   ");
        text.push_str(line);
    }
    text
}

/// One row of confetti; the pattern drifts one step per frame
fn confetti_row(frame: usize, color: bool) -> String {
    let mut row = String::new();
    for column in 0..WIDTH {
        let seed = column * 7 + frame * 3;
        if seed % 5 == 0 || seed % 11 == 0 {
            let piece = CONFETTI[seed % CONFETTI.len()];
            if color {
                row.push_str(&format!("\x1b[{}m{}\x1b[0m", COLORS[(seed / 2) % COLORS.len()], piece));
            } else {
                row.push(piece);
            }
        } else {
            row.push(' ');
        }
    }
    row
}

#[async_trait]
impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        println!("{}", format_notice(&notice));
    }

    async fn celebrate(&self, duration: Duration) {
        let frames = (duration.as_millis() / FRAME.as_millis()).max(1) as usize;
        let mut stdout = io::stdout();

        if !self.color {
            println!("{}", confetti_row(0, false));
            return;
        }

        for frame in 0..frames {
            print!("\r{}", confetti_row(frame, true));
            let _ = stdout.flush();
            tokio::time::sleep(FRAME).await;
        }
        print!("\r{}\r", " ".repeat(WIDTH));
        let _ = stdout.flush();
    }
}

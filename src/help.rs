use crate::terminal::Terminal;
use crossterm::style::Color;

/// Key bindings shown by `?`
pub const TRACKER_HELP: &str = "\
q/Esc   Quit
space   Pause the clock
f       Follow Santa
s       Toggle idle spin
m       Mute the chime
c       Cycle colors
←↑↓→    Pan (stops following)
+/-     Zoom in/out
0       Reset zoom
?       Close this help";

/// Top-left corner and size of a box holding `lines`, centred in the screen
fn layout(width: u16, height: u16, lines: &[&str], title: &str) -> (usize, usize, usize, usize) {
    let inner = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count() + 2))
        .max()
        .unwrap_or(0);
    let box_width = inner + 4;
    let box_height = lines.len() + 2;
    let x = (width as usize).saturating_sub(box_width) / 2;
    let y = (height as usize).saturating_sub(box_height) / 2;
    (x, y, box_width, box_height)
}

/// Draw a centred, titled help box into the back buffer
pub fn render_help_overlay(term: &mut Terminal, title: &str, help_text: &str) {
    if help_text.is_empty() {
        return;
    }

    let (width, height) = term.size();
    let lines: Vec<&str> = help_text.lines().collect();
    let (x0, y0, box_width, box_height) = layout(width, height, &lines, title);
    let border = Some(Color::White);
    let text = Some(Color::Grey);
    let right = (x0 + box_width - 1) as i32;
    let bottom = (y0 + box_height - 1) as i32;

    for x in x0 + 1..x0 + box_width - 1 {
        term.set(x as i32, y0 as i32, '─', border, false);
        term.set(x as i32, bottom, '─', border, false);
    }
    term.set(x0 as i32, y0 as i32, '┌', border, false);
    term.set(right, y0 as i32, '┐', border, false);
    term.set(x0 as i32, bottom, '└', border, false);
    term.set(right, bottom, '┘', border, false);
    term.set_str(x0 as i32 + 2, y0 as i32, &format!(" {} ", title), border, true);

    for (i, line) in lines.iter().enumerate() {
        let y = (y0 + 1 + i) as i32;
        term.set(x0 as i32, y, '│', border, false);
        for x in x0 + 1..x0 + box_width - 1 {
            term.set(x as i32, y, ' ', None, false);
        }
        term.set_str(x0 as i32 + 2, y, line, text, false);
        term.set(right, y, '│', border, false);
    }
}

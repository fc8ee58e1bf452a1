use crossterm::event::KeyCode;
use crossterm::style::Color;

/// Named color schemes, cycled with `c`
pub const SCHEMES: [&str; 4] = ["frost", "evergreen", "candy", "mono"];
const MONO: u8 = 3;

/// Shared color scheme state
#[derive(Clone, Copy, Debug)]
pub struct ColorState {
    pub scheme: u8,
}

impl ColorState {
    pub fn new(default_scheme: u8) -> Self {
        Self {
            scheme: default_scheme % SCHEMES.len() as u8,
        }
    }

    /// Handle color scheme key input. Returns true if key was handled.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('c') => {
                self.scheme = (self.scheme + 1) % SCHEMES.len() as u8;
                true
            }
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        SCHEMES[self.scheme as usize % SCHEMES.len()]
    }
}

/// Get color from scheme based on intensity (0-3)
pub fn scheme_color(scheme: u8, intensity: u8, bold: bool) -> (Color, bool) {
    match scheme {
        1 => match intensity {  // Greens (evergreen)
            0 => (Color::DarkGreen, false),
            1 => (Color::Green, false),
            2 => (Color::Green, bold),
            _ => (Color::AnsiValue(10), true),
        },
        2 => match intensity {  // Red/White (candy)
            0 => (Color::DarkRed, false),
            1 => (Color::Red, false),
            2 => (Color::White, bold),
            _ => (Color::White, true),
        },
        3 => match intensity {  // White/Grey (mono)
            0 => (Color::DarkGrey, false),
            1 => (Color::Grey, false),
            2 => (Color::White, bold),
            _ => (Color::White, true),
        },
        _ => match intensity {  // Default: Blue/Cyan (frost)
            0 => (Color::DarkBlue, false),
            1 => (Color::Blue, false),
            2 => (Color::Cyan, bold),
            _ => (Color::AnsiValue(14), true),
        },
    }
}

/// Semantic colors for the text around the globe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusColor {
    Good,
    Info,
    Muted,
}

/// Map semantic status color to scheme color; mono keeps the semantic palette
pub fn status_to_scheme(scheme: u8, status: StatusColor) -> Color {
    if scheme == MONO {
        match status {
            StatusColor::Good => Color::Green,
            StatusColor::Info => Color::Cyan,
            StatusColor::Muted => Color::DarkGrey,
        }
    } else {
        let intensity = match status {
            StatusColor::Muted => 0,
            StatusColor::Info => 1,
            StatusColor::Good => 2,
        };
        scheme_color(scheme, intensity, false).0
    }
}

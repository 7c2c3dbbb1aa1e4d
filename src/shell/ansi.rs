//! ANSI escape codes used by the terminal presenter

// ============================================================================
// TEXT ATTRIBUTES
// ============================================================================

pub const RESET: &str = "\x1b[0m"; // Reset all attributes
pub const BOLD: &str = "\x1b[1m";

// ============================================================================
// FOREGROUND COLORS
// ============================================================================

pub const FG_RED: &str = "\x1b[31m";
pub const FG_GREEN: &str = "\x1b[32m";
pub const FG_YELLOW: &str = "\x1b[33m";
pub const FG_BLUE: &str = "\x1b[34m";
pub const FG_MAGENTA: &str = "\x1b[35m";
pub const FG_CYAN: &str = "\x1b[36m";
pub const FG_BRIGHT_MAGENTA: &str = "\x1b[95m";
pub const FG_BRIGHT_WHITE: &str = "\x1b[97m";
pub const FG_256_ORANGE: &str = "\x1b[38;5;208m";
pub const FG_256_GRAY_DARK: &str = "\x1b[38;5;240m";

// ============================================================================
// STATUS BADGES (foreground;background)
// ============================================================================

pub const BADGE_OK: &str = "\x1b[0;30;42m"; // black on green
pub const BADGE_FAIL: &str = "\x1b[0;30;41m"; // black on red
pub const NOTE_OK: &str = "\x1b[4;32;40m"; // underlined green on black
pub const NOTE_FAIL: &str = "\x1b[4;31;40m"; // underlined red on black

/// Colors for one JSON rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub key: &'static str,
    pub string: &'static str,
    pub number: &'static str,
    pub literal: &'static str,
    pub punctuation: &'static str,
}

/// For dark terminal backgrounds
pub const DARK_PALETTE: Palette = Palette {
    key: FG_CYAN,
    string: FG_GREEN,
    number: FG_YELLOW,
    literal: FG_BRIGHT_MAGENTA,
    punctuation: FG_BRIGHT_WHITE,
};

/// For light terminal backgrounds (`-i`)
pub const LIGHT_PALETTE: Palette = Palette {
    key: FG_BLUE,
    string: FG_RED,
    number: FG_256_ORANGE,
    literal: FG_MAGENTA,
    punctuation: FG_256_GRAY_DARK,
};

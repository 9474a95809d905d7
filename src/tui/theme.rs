// Catppuccin Mocha, trimmed to the colors the host draws with

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub red: Color,
    pub peach: Color,
    pub yellow: Color,
    pub green: Color,
    pub blue: Color,
    pub lavender: Color,
    pub text: Color,
    pub subtext: Color,
    pub overlay: Color,
    pub surface: Color,
    pub base: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}

impl Theme {
    pub fn mocha() -> Self {
        Self {
            red: Color::Rgb(0xf3, 0x8b, 0xa8),
            peach: Color::Rgb(0xfa, 0xb3, 0x87),
            yellow: Color::Rgb(0xf9, 0xe2, 0xaf),
            green: Color::Rgb(0xa6, 0xe3, 0xa1),
            blue: Color::Rgb(0x89, 0xb4, 0xfa),
            lavender: Color::Rgb(0xb4, 0xbe, 0xfe),
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            subtext: Color::Rgb(0xa6, 0xad, 0xc8),
            overlay: Color::Rgb(0x6c, 0x70, 0x86),
            surface: Color::Rgb(0x31, 0x32, 0x44),
            base: Color::Rgb(0x1e, 0x1e, 0x2e),
        }
    }

    pub fn frame(&self) -> Style {
        Style::default().fg(self.lavender).bg(self.base)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.blue).add_modifier(Modifier::BOLD)
    }

    pub fn region(&self, selected: bool) -> Style {
        if selected {
            Style::default().fg(self.yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.green)
        }
    }

    pub fn target(&self, kind: &str) -> Style {
        match kind {
            "bear" | "bear_attack" => Style::default().fg(self.red).add_modifier(Modifier::BOLD),
            _ => Style::default().fg(self.peach),
        }
    }

    pub fn draft(&self) -> Style {
        Style::default().fg(self.red)
    }

    pub fn status(&self) -> Style {
        Style::default().fg(self.subtext).bg(self.surface)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.overlay)
    }

    pub fn panel(&self) -> Style {
        Style::default().fg(self.text).bg(self.surface)
    }
}

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub border: Color,
    pub border_focused: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Color::Rgb(220, 220, 220),
            dim: Color::Rgb(140, 140, 140),
            accent: Color::Rgb(80, 160, 160),
            border: Color::Rgb(60, 68, 76),
            border_focused: Color::Rgb(80, 160, 160),
            positive: Color::Rgb(110, 190, 110),
            negative: Color::Rgb(210, 110, 90),
            warning: Color::Rgb(220, 180, 80),
            error: Color::Rgb(200, 80, 80),
        }
    }
}

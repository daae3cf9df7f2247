// Copyright (c) 2025 rezk_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Azure,
    Glacier,
    Teal,
    Ember,
    Violet,
    Moss,
    Silver,
}

impl ColorScheme {
    /// Schemes in the order the runtime scheme-cycle key walks them.
    pub const ALL: [ColorScheme; 7] = [
        ColorScheme::Azure,
        ColorScheme::Glacier,
        ColorScheme::Teal,
        ColorScheme::Ember,
        ColorScheme::Violet,
        ColorScheme::Moss,
        ColorScheme::Silver,
    ];

    pub fn next(self) -> ColorScheme {
        let i = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

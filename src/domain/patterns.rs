use super::rle::{self, Pattern, PatternError};

/// A named pattern shipped with the crate, kept as RLE text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub rle: &'static str,
}

impl Preset {
    const fn new(name: &'static str, description: &'static str, rle: &'static str) -> Self {
        Self { name, description, rle }
    }

    /// Decode the preset.
    pub fn pattern(&self) -> Result<Pattern, PatternError> {
        let mut pattern = rle::decode_str(self.rle)?;
        if pattern.name.is_empty() {
            pattern.name = self.name.to_string();
        }
        if pattern.comment.is_empty() {
            pattern.comment = self.description.to_string();
        }
        Ok(pattern)
    }
}

/// Classic Game of Life patterns library
pub mod presets {
    use super::Preset;

    /// Glider - simplest spaceship, moves diagonally
    pub fn glider() -> Preset {
        Preset::new("Glider", "Moves diagonally (period 4)", "x = 3, y = 3\nbo$2bo$3o!")
    }

    /// Blinker - period 2 oscillator
    pub fn blinker() -> Preset {
        Preset::new("Blinker", "Oscillator (period 2)", "x = 3, y = 3\nbo$bo$bo!")
    }

    /// Toad - period 2 oscillator
    pub fn toad() -> Preset {
        Preset::new("Toad", "Oscillator (period 2)", "x = 4, y = 2\nb3o$3o!")
    }

    /// Beacon - period 2 oscillator
    pub fn beacon() -> Preset {
        Preset::new("Beacon", "Oscillator (period 2)", "x = 4, y = 4\n2o$o$3bo$2b2o!")
    }

    /// Pulsar - period 3 oscillator
    pub fn pulsar() -> Preset {
        Preset::new(
            "Pulsar",
            "Oscillator (period 3)",
            "x = 13, y = 13\n\
             2b3o3b3o2$o4bobo4bo$o4bobo4bo$o4bobo4bo$2b3o3b3o2$\n\
             2b3o3b3o$o4bobo4bo$o4bobo4bo$o4bobo4bo2$2b3o3b3o!",
        )
    }

    /// Lightweight Spaceship (LWSS)
    pub fn lwss() -> Preset {
        Preset::new("LWSS", "Lightweight Spaceship (period 4)", "x = 5, y = 4\nbo2bo$o$o3bo$4o!")
    }

    /// Gosper Glider Gun - produces gliders indefinitely
    pub fn glider_gun() -> Preset {
        Preset::new(
            "Gosper Glider Gun",
            "Produces gliders (period 30)",
            "#N Gosper glider gun\n\
             #O Bill Gosper\n\
             x = 36, y = 9, rule = B3/S23\n\
             24bo$22bobo$12b2o6b2o12b2o$11bo3bo4b2o12b2o$2o8bo5bo3b2o$\n\
             2o8bo3bob2o4bobo$10bo5bo7bo$11bo3bo$12b2o!",
        )
    }

    /// R-pentomino - classic methuselah (stabilizes after 1103 generations)
    pub fn r_pentomino() -> Preset {
        Preset::new(
            "R-pentomino",
            "Methuselah - stabilizes at gen 1103",
            "x = 3, y = 3\nb2o$2o$bo!",
        )
    }

    /// Acorn - small methuselah that stabilizes after 5206 generations
    pub fn acorn() -> Preset {
        Preset::new("Acorn", "Methuselah - stabilizes at gen 5206", "x = 7, y = 3\nbo$3bo$2o2b3o!")
    }

    /// Block - simple still life
    pub fn block() -> Preset {
        Preset::new("Block", "Still life", "x = 2, y = 2\n2o$2o!")
    }

    /// Get all available patterns
    pub fn all_patterns() -> Vec<Preset> {
        vec![
            glider(),
            blinker(),
            toad(),
            beacon(),
            pulsar(),
            lwss(),
            glider_gun(),
            r_pentomino(),
            acorn(),
            block(),
        ]
    }

    /// Look a preset up by name, ignoring case.
    pub fn find(name: &str) -> Option<Preset> {
        all_patterns()
            .into_iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name))
    }
}

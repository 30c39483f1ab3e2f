//! Named gradient palettes. The engine only reads the current palette.

use glam::Vec3;

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub name: &'static str,
    /// Three gradient layers of four stops each, `0xRRGGBB`.
    pub layers: [[u32; 4]; 3],
}

impl Palette {
    /// Card tint before any charge: the palest stop of the top layer.
    pub fn rest_tint(&self) -> Vec3 {
        rgb(self.layers[2][0])
    }

    /// Card tint at full charge: the deepest stop of the base layer.
    pub fn charged_tint(&self) -> Vec3 {
        rgb(self.layers[0][3])
    }

    pub fn card_tint(&self, color_mix: f32) -> Vec3 {
        self.rest_tint()
            .lerp(self.charged_tint(), color_mix.clamp(0.0, 1.0))
    }
}

#[inline]
pub fn rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

pub const SUNRISE_SERENITY: Palette = Palette {
    name: "Sunrise Serenity",
    layers: [
        [0xFFDAC1, 0xFFAB76, 0xFF8E5E, 0xFF7043],
        [0xB3E0FF, 0x81D4FA, 0x4FC3F7, 0x29B6F6],
        [0xE0F7FA, 0xB2EBF2, 0x80DEEA, 0x4DD0E1],
    ],
};

pub const OCEAN_BREEZE_HARMONY: Palette = Palette {
    name: "Ocean Breeze Harmony",
    layers: [
        [0xBBDEFB, 0x90CAF9, 0x64B5F6, 0x42A5F5],
        [0xC8E6C9, 0xA5D6A7, 0x81C784, 0x66BB6A],
        [0xE1BEE7, 0xCE93D8, 0xBA68C8, 0xAB47BC],
    ],
};

/// Read-only view of the active palette.
pub trait ThemeProvider {
    fn palette(&self) -> &Palette;
}

impl ThemeProvider for Palette {
    fn palette(&self) -> &Palette {
        self
    }
}

#[derive(Clone, Debug)]
pub struct PaletteRegistry {
    palettes: Vec<Palette>,
    current: usize,
}

impl Default for PaletteRegistry {
    fn default() -> Self {
        Self {
            palettes: vec![SUNRISE_SERENITY, OCEAN_BREEZE_HARMONY],
            current: 0,
        }
    }
}

impl PaletteRegistry {
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.palettes.iter().map(|p| p.name)
    }

    pub fn get(&self, name: &str) -> Option<&Palette> {
        self.palettes.iter().find(|p| p.name == name)
    }

    /// Switch the active palette. Unknown names leave it unchanged.
    pub fn select(&mut self, name: &str) -> bool {
        match self.palettes.iter().position(|p| p.name == name) {
            Some(i) => {
                self.current = i;
                true
            }
            None => {
                log::warn!("[theme] unknown palette {:?}", name);
                false
            }
        }
    }
}

impl ThemeProvider for PaletteRegistry {
    fn palette(&self) -> &Palette {
        &self.palettes[self.current]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_selects_by_name() {
        let mut reg = PaletteRegistry::default();
        assert_eq!(reg.palette().name, "Sunrise Serenity");
        assert!(reg.select("Ocean Breeze Harmony"));
        assert_eq!(reg.palette().name, "Ocean Breeze Harmony");
        assert!(!reg.select("Midnight"));
        assert_eq!(reg.palette().name, "Ocean Breeze Harmony");
        assert_eq!(reg.names().count(), 2);
    }

    #[test]
    fn tint_mixes_between_rest_and_charged() {
        let p = SUNRISE_SERENITY;
        assert_eq!(p.card_tint(0.0), p.rest_tint());
        assert!((p.card_tint(1.0) - p.charged_tint()).length() < 1e-6);
        assert_eq!(rgb(0xFF0000), Vec3::new(1.0, 0.0, 0.0));
    }
}

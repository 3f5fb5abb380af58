//! Catalog vocabulary shared by the admin back-office and the storefront.

/// Product categories offered in the back-office.
pub const CATEGORIES: [&str; 5] = ["Calçados", "Boinas", "Lenços", "Camisas", "Casacos"];

/// Garment sizes, smallest first. Footwear uses numeric sizes instead.
pub const SIZES: [&str; 7] = ["PP", "P", "M", "G", "GG", "XG", "Único"];

/// A named swatch from the shop palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Name stored on products and cart lines.
    pub name: &'static str,
    /// CSS hex value for the swatch.
    pub hex: &'static str,
}

/// Colors a product may be offered in.
pub const COLOR_PALETTE: [Color; 7] = [
    Color { name: "Azul Marinho", hex: "#1a237e" },
    Color { name: "Verde Musgo", hex: "#556b2f" },
    Color { name: "Preto", hex: "#222" },
    Color { name: "Bege", hex: "#e4d8b4" },
    Color { name: "Marrom", hex: "#795548" },
    Color { name: "Vermelho", hex: "#b71c1c" },
    Color { name: "Branco", hex: "#fff" },
];

/// Whether `name` is one of the palette colors.
#[must_use]
pub fn is_palette_color(name: &str) -> bool {
    COLOR_PALETTE.iter().any(|color| color.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_lookup() {
        assert!(is_palette_color("Verde Musgo"));
        assert!(!is_palette_color("verde musgo"));
        assert!(!is_palette_color("Palha"));
    }
}
